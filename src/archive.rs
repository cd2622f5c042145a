use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use spdlog::{info, warn};

use crate::config::ArchiveConfig;
use crate::content::MetadataParser;
use crate::error::{ArchiveError, IndexKind, Result};
use crate::flat_index::FlatIndex;
use crate::post::{parse_publish_time, Post};
use crate::post_factory::{modified_time, PostFactory};
use crate::post_list::PostList;
use crate::ymd_index::{PostsFrom, YmdIndex};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IndexState {
    Unloaded,
    Loaded,
}

/// In-memory view over a directory of published posts.
///
/// Both indexes start unloaded. Queries against an unloaded index fail with
/// [`ArchiveError::IndexNotLoaded`] instead of returning nothing.
pub struct Archive {
    config: ArchiveConfig,
    factory: PostFactory,
    flat: Option<FlatIndex>,
    ymd: Option<YmdIndex>,
}

impl Archive {
    pub fn new(config: ArchiveConfig) -> Result<Archive> {
        Self::with_factory(config, PostFactory::default())
    }

    pub fn with_parser(config: ArchiveConfig, parser: Box<dyn MetadataParser>) -> Result<Archive> {
        Self::with_factory(config, PostFactory::new(parser))
    }

    fn with_factory(config: ArchiveConfig, factory: PostFactory) -> Result<Archive> {
        let metadata = fs::metadata(&config.content_dir).map_err(|e| ArchiveError::from_io(&config.content_dir, e))?;
        if !metadata.is_dir() {
            return Err(ArchiveError::FileNotFound { path: config.content_dir.clone() });
        }

        Ok(Archive {
            config,
            factory,
            flat: None,
            ymd: None,
        })
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn content_dir(&self) -> &Path {
        &self.config.content_dir
    }

    pub fn state(&self, kind: IndexKind) -> IndexState {
        let loaded = match kind {
            IndexKind::Flat => self.flat.is_some(),
            IndexKind::Ymd => self.ymd.is_some(),
        };
        if loaded { IndexState::Loaded } else { IndexState::Unloaded }
    }

    /// Re-reads the content directory. On failure the previous index, if
    /// any, stays in place.
    pub fn build_flat_index(&mut self) -> Result<&FlatIndex> {
        let index = FlatIndex::build(&self.config.content_dir, &self.config.extensions, &self.factory)?;
        Ok(&*self.flat.insert(index))
    }

    /// Derives the year/month/day tree from the loaded flat index.
    pub fn build_ymd_index(&mut self) -> Result<&YmdIndex> {
        let index = YmdIndex::build(self.flat_index()?, self.config.utc_offset)?;
        Ok(&*self.ymd.insert(index))
    }

    pub(crate) fn set_flat_index(&mut self, index: FlatIndex) -> &FlatIndex {
        self.flat.insert(index)
    }

    pub(crate) fn set_ymd_index(&mut self, index: YmdIndex) -> &YmdIndex {
        self.ymd.insert(index)
    }

    pub fn flat_index(&self) -> Result<&FlatIndex> {
        self.flat.as_ref().ok_or(ArchiveError::IndexNotLoaded(IndexKind::Flat))
    }

    pub fn ymd_index(&self) -> Result<&YmdIndex> {
        self.ymd.as_ref().ok_or(ArchiveError::IndexNotLoaded(IndexKind::Ymd))
    }

    /// Posts published between `from` and `to` (both included), newest first.
    pub fn posts_by_range(&self, from: i64, to: i64) -> Result<Vec<&Post>> {
        self.flat_index()?.range(from, to)
    }

    /// Posts sharing at least one tag with `tags`, newest first.
    pub fn posts_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> Result<Vec<&Post>> {
        self.flat_index()?.by_tags(tags)
    }

    pub fn get_posts_from(&self, year: i32, month: Option<u32>, day: Option<u32>) -> Result<PostsFrom<'_>> {
        self.ymd_index()?.get(year, month, day)
    }

    /// Copies `draft` into the content directory as `<time>_<file name>` and
    /// returns the new post. `time` defaults to now.
    ///
    /// The in-memory indexes are left untouched; rebuild or regenerate them
    /// to see the new post. The existence checks and the copy are not atomic,
    /// so publishing must be serialized by the caller.
    pub fn publish(&self, draft: &Path, time: Option<i64>) -> Result<Post> {
        let time = time.unwrap_or_else(|| Utc::now().timestamp());

        let post_list = self.post_list();
        let file_name = match draft.file_name().and_then(|name| name.to_str()) {
            Some(file_name) if post_list.accepts(draft) && time >= 0 => file_name,
            _ => return Err(ArchiveError::InvalidFilename { path: draft.to_path_buf() }),
        };

        let destination = self.config.content_dir.join(format!("{}_{}", time, file_name));
        let exists = destination.try_exists().map_err(|source| ArchiveError::Io {
            path: destination.clone(),
            source,
        })?;
        if exists {
            return Err(ArchiveError::Conflict { path: destination });
        }

        if let Some(existing) = self.find_published_at(time)? {
            return Err(ArchiveError::DuplicatePublishTime {
                publish_time: time,
                existing,
                incoming: destination,
            });
        }

        fs::copy(draft, &destination).map_err(|source| ArchiveError::Copy {
            from: draft.to_path_buf(),
            to: destination.clone(),
            source,
        })?;

        match self.factory.from_file(&destination) {
            Ok(post) => {
                info!("Published {} as {}", draft.display(), destination.display());
                Ok(post)
            }
            Err(err) => {
                if let Err(e) = fs::remove_file(&destination) {
                    warn!("Could not remove {} after a failed publish: {}", destination.display(), e);
                }
                Err(err)
            }
        }
    }

    /// Publishes several drafts one second apart, starting at `time`, so a
    /// batch never collides with itself.
    ///
    /// Stops at the first failure. Drafts published before it stay in the
    /// content directory; nothing is rolled back. A batch whose last second
    /// would not fit an `i64` is refused before anything is copied.
    pub fn publish_all<P: AsRef<Path>>(&self, drafts: &[P], time: Option<i64>) -> Result<Vec<Post>> {
        let start = time.unwrap_or_else(|| Utc::now().timestamp());
        let mut batch = Vec::with_capacity(drafts.len());
        for (offset, draft) in drafts.iter().enumerate() {
            let draft = draft.as_ref();
            let time = i64::try_from(offset).ok()
                .and_then(|offset| start.checked_add(offset))
                .ok_or_else(|| ArchiveError::InvalidFilename { path: draft.to_path_buf() })?;
            batch.push((draft, time));
        }

        batch.into_iter()
            .map(|(draft, time)| self.publish(draft, Some(time)))
            .collect()
    }

    /// Publishes each draft at its own modification time. Same failure rules
    /// as [`Archive::publish_all`]; two drafts modified in the same second
    /// fail with `DuplicatePublishTime`.
    pub fn publish_using_mtime<P: AsRef<Path>>(&self, drafts: &[P]) -> Result<Vec<Post>> {
        drafts.iter()
            .map(|draft| {
                let draft = draft.as_ref();
                self.publish(draft, Some(modified_time(draft)?))
            })
            .collect()
    }

    fn post_list(&self) -> PostList<'_> {
        PostList {
            root_dir: &self.config.content_dir,
            extensions: &self.config.extensions,
        }
    }

    fn find_published_at(&self, time: i64) -> Result<Option<PathBuf>> {
        let files = self.post_list().retrieve_files()?;
        Ok(files.into_iter().find(|file| parse_publish_time(file) == Some(time)))
    }
}
