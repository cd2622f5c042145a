use std::{fs, io};
use std::path::{Path, PathBuf};

use crate::error::{ArchiveError, Result};

/// Content files sitting directly in a directory, filtered by extension.
pub struct PostList<'a> {
    pub root_dir: &'a Path,
    pub extensions: &'a [String],
}

impl<'a> PostList<'a> {
    pub fn retrieve_files(&self) -> Result<Vec<PathBuf>> {
        let to_err = |e: io::Error| ArchiveError::from_io(self.root_dir, e);

        let mut posts = vec![];
        for entry in fs::read_dir(self.root_dir).map_err(to_err)? {
            let path = entry.map_err(to_err)?.path();
            // Follows symlinks, so a linked post counts as a file
            let metadata = fs::metadata(&path).map_err(|e| ArchiveError::from_io(&path, e))?;
            if metadata.is_file() && self.accepts(&path) {
                posts.push(path);
            }
        }

        posts.sort();
        Ok(posts)
    }

    pub fn accepts(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self.extensions.iter().any(|allowed| allowed == ext),
            None => false,
        }
    }
}
