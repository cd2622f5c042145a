use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use crate::archive::Archive;
use crate::config::ArchiveConfig;
use crate::content::MetadataParser;
use crate::error::{ArchiveError, IndexKind, Result};
use crate::flat_index::FlatIndex;
use crate::snapshot::{read_flat_snapshot, read_ymd_snapshot, write_snapshot};
use crate::ymd_index::YmdIndex;

/// An [`Archive`] that can also save its indexes to JSON snapshot files and
/// load them back, so a start-up doesn't have to re-read every post.
///
/// Loading from a snapshot and building from the content directory are two
/// separate operations; a loaded snapshot is not checked against the
/// directory.
pub struct PersistentArchive {
    archive: Archive,
    flat_snapshot: PathBuf,
    ymd_snapshot: PathBuf,
}

impl PersistentArchive {
    pub fn new(config: ArchiveConfig) -> Result<PersistentArchive> {
        let (flat_snapshot, ymd_snapshot) = snapshot_paths(&config)?;
        Ok(PersistentArchive {
            archive: Archive::new(config)?,
            flat_snapshot,
            ymd_snapshot,
        })
    }

    pub fn with_parser(config: ArchiveConfig, parser: Box<dyn MetadataParser>) -> Result<PersistentArchive> {
        let (flat_snapshot, ymd_snapshot) = snapshot_paths(&config)?;
        Ok(PersistentArchive {
            archive: Archive::with_parser(config, parser)?,
            flat_snapshot,
            ymd_snapshot,
        })
    }

    pub fn flat_snapshot(&self) -> &Path {
        &self.flat_snapshot
    }

    pub fn ymd_snapshot(&self) -> &Path {
        &self.ymd_snapshot
    }

    pub fn load_flat_archive(&mut self) -> Result<&FlatIndex> {
        let index = read_flat_snapshot(&self.flat_snapshot)?;
        Ok(self.archive.set_flat_index(index))
    }

    /// Rebuilds the flat index from the content directory and overwrites the
    /// flat snapshot with it.
    pub fn generate_flat_archive(&mut self) -> Result<&FlatIndex> {
        self.archive.build_flat_index()?;
        let index = self.archive.flat_index()?;
        write_snapshot(&self.flat_snapshot, index)?;
        Ok(index)
    }

    pub fn load_ymd_archive(&mut self) -> Result<&YmdIndex> {
        let index = read_ymd_snapshot(&self.ymd_snapshot, self.archive.config().utc_offset)?;
        Ok(self.archive.set_ymd_index(index))
    }

    /// Derives the year/month/day tree and overwrites the YMD snapshot with
    /// it. The flat index is built from the content directory first when it
    /// isn't loaded yet.
    pub fn generate_ymd_archive(&mut self) -> Result<&YmdIndex> {
        if self.archive.flat_index().is_err() {
            self.archive.build_flat_index()?;
        }
        self.archive.build_ymd_index()?;
        let index = self.archive.ymd_index()?;
        write_snapshot(&self.ymd_snapshot, index)?;
        Ok(index)
    }

    pub fn into_inner(self) -> Archive {
        self.archive
    }
}

impl Deref for PersistentArchive {
    type Target = Archive;

    fn deref(&self) -> &Archive {
        &self.archive
    }
}

impl DerefMut for PersistentArchive {
    fn deref_mut(&mut self) -> &mut Archive {
        &mut self.archive
    }
}

fn snapshot_paths(config: &ArchiveConfig) -> Result<(PathBuf, PathBuf)> {
    let flat = config.flat_snapshot.clone().ok_or(ArchiveError::MissingSnapshotPath(IndexKind::Flat))?;
    let ymd = config.ymd_snapshot.clone().ok_or(ArchiveError::MissingSnapshotPath(IndexKind::Ymd))?;
    Ok((flat, ymd))
}
