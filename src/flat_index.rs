use std::collections::BTreeMap;
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use spdlog::{debug, info};

use crate::error::{ArchiveError, Result};
use crate::post::{normalize_tags, Post};
use crate::post_factory::PostFactory;
use crate::post_list::PostList;

/// Posts keyed by publish time, iterated newest first.
///
/// Publish times are unique: inserting a second post with a time already in
/// the index fails instead of replacing the first one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatIndex {
    posts: BTreeMap<i64, Post>,
}

impl FlatIndex {
    /// Indexes every content file directly under `content_dir`. The first
    /// file that can't become a post aborts the whole build.
    pub fn build(content_dir: &Path, extensions: &[String], factory: &PostFactory) -> Result<FlatIndex> {
        let post_list = PostList {
            root_dir: content_dir,
            extensions,
        };

        let mut index = FlatIndex::default();
        for file in post_list.retrieve_files()? {
            let post = factory.from_file(&file)?;
            debug!("Indexed {}", post);
            index.insert(post)?;
        }

        info!("Built flat index with {} posts from {}", index.len(), content_dir.display());
        Ok(index)
    }

    pub fn from_posts<I: IntoIterator<Item = Post>>(posts: I) -> Result<FlatIndex> {
        let mut index = FlatIndex::default();
        for post in posts {
            index.insert(post)?;
        }
        Ok(index)
    }

    pub fn insert(&mut self, post: Post) -> Result<()> {
        if let Some(existing) = self.posts.get(&post.publish_time()) {
            return Err(ArchiveError::DuplicatePublishTime {
                publish_time: post.publish_time(),
                existing: existing.location().to_path_buf(),
                incoming: post.location().to_path_buf(),
            });
        }
        self.posts.insert(post.publish_time(), post);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, publish_time: i64) -> Option<&Post> {
        self.posts.get(&publish_time)
    }

    /// Newest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Post> + '_ {
        self.posts.values().rev()
    }

    /// Posts published in `[from, to]`, newest first.
    pub fn range(&self, from: i64, to: i64) -> Result<Vec<&Post>> {
        if from > to {
            return Err(ArchiveError::InvalidRange { from, to });
        }
        Ok(self.posts.range(from..=to).rev().map(|(_, post)| post).collect())
    }

    /// Posts carrying at least one of `tags`, newest first. Tags may be given
    /// with or without the leading `#`.
    pub fn by_tags<S: AsRef<str>>(&self, tags: &[S]) -> Result<Vec<&Post>> {
        if tags.is_empty() {
            return Err(ArchiveError::EmptyTagSet);
        }
        let tags = normalize_tags(tags);
        Ok(self.iter().filter(|post| post.has_any_tag(&tags)).collect())
    }
}

impl Serialize for FlatIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.posts.len()))?;
        for (publish_time, post) in self.posts.iter().rev() {
            map.serialize_entry(&publish_time.to_string(), post)?;
        }
        map.end()
    }
}
