use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::content::MetadataError;

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Coarse classification of every failure the archive can report.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Parse,
    Conflict,
    State,
    Io,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IndexKind {
    Flat,
    Ymd,
}

impl Display for IndexKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Flat => write!(f, "flat"),
            IndexKind::Ymd => write!(f, "year/month/day"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("{} does not exist", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("No posts published in {}", date_label(.year, .month, .day))]
    PostNotFound {
        year: i32,
        month: Option<u32>,
        day: Option<u32>,
    },

    #[error("Failed to parse publish time from file name {}", .path.display())]
    InvalidFilename { path: PathBuf },

    #[error("Failed to parse metadata of {}: {source}", .path.display())]
    MetadataParse {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error("Failed to decode snapshot {}: {reason}", .path.display())]
    SnapshotDecode { path: PathBuf, reason: String },

    #[error("Failed to encode snapshot {}: {source}", .path.display())]
    SnapshotEncode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to derive a calendar date from publish time {publish_time}")]
    DateDerivation { publish_time: i64 },

    #[error("Error parsing configuration file {}: {reason}", .path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("Published post already exists at {}", .path.display())]
    Conflict { path: PathBuf },

    #[error("Publish time {publish_time} of {} is already taken by {}", .incoming.display(), .existing.display())]
    DuplicatePublishTime {
        publish_time: i64,
        existing: PathBuf,
        incoming: PathBuf,
    },

    #[error("The {0} index is not loaded")]
    IndexNotLoaded(IndexKind),

    #[error("Invalid range: lower bound {from} is greater than upper bound {to}")]
    InvalidRange { from: i64, to: i64 },

    #[error("Set of tags must not be empty")]
    EmptyTagSet,

    #[error("No snapshot path configured for the {0} index")]
    MissingSnapshotPath(IndexKind),

    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ArchiveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArchiveError::FileNotFound { .. } | ArchiveError::PostNotFound { .. } => ErrorKind::NotFound,
            ArchiveError::InvalidFilename { .. }
            | ArchiveError::MetadataParse { .. }
            | ArchiveError::SnapshotDecode { .. }
            | ArchiveError::DateDerivation { .. }
            | ArchiveError::InvalidConfig { .. } => ErrorKind::Parse,
            ArchiveError::Conflict { .. } | ArchiveError::DuplicatePublishTime { .. } => ErrorKind::Conflict,
            ArchiveError::IndexNotLoaded(_)
            | ArchiveError::InvalidRange { .. }
            | ArchiveError::EmptyTagSet
            | ArchiveError::MissingSnapshotPath(_) => ErrorKind::State,
            ArchiveError::Copy { .. } | ArchiveError::Io { .. } | ArchiveError::SnapshotEncode { .. } => ErrorKind::Io,
        }
    }

    /// Maps an I/O failure on `path`, turning a missing file into `FileNotFound`.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            ArchiveError::FileNotFound { path }
        } else {
            ArchiveError::Io { path, source }
        }
    }
}

fn date_label(year: &i32, month: &Option<u32>, day: &Option<u32>) -> String {
    match (month, day) {
        (Some(month), Some(day)) => format!("{}/{}/{}", year, month, day),
        (Some(month), None) => format!("{}/{}", year, month),
        _ => year.to_string(),
    }
}
