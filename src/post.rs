use std::fmt;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::content::{MetadataError, PostMetadata};

/// Metadata of one published content file.
///
/// Posts are built by [`crate::post_factory::PostFactory`] and never change
/// afterwards: the fields are private and only exposed through getters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    location: PathBuf,
    title: String,
    tags: Vec<String>,
    publish_time: i64,
    last_modified: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
}

/// The field set a post is serialized to in a snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFields {
    pub location: PathBuf,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub publish_time: i64,
    #[serde(default)]
    pub last_modified: Option<i64>,
    #[serde(default)]
    pub author: Option<String>,
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "publish_time={}, title={}, tags=[{}], author={}, location={}",
               self.publish_time,
               self.title,
               self.tags.join(" "),
               self.author.as_deref().unwrap_or("-"),
               self.location.display(),
        )
    }
}

impl Post {
    pub(crate) fn new(location: PathBuf, metadata: PostMetadata, publish_time: i64, last_modified: i64) -> Result<Post, MetadataError> {
        let title = metadata.title.trim().to_string();
        if title.is_empty() {
            return Err(MetadataError::MissingTitle);
        }

        Ok(Post {
            location,
            title,
            tags: normalize_tags(&metadata.tags),
            publish_time,
            last_modified,
            author: metadata.author,
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn publish_time(&self) -> i64 {
        self.publish_time
    }

    pub fn last_modified(&self) -> i64 {
        self.last_modified
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Tags are compared after normalization, so `post` matches `#post`.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }

    pub fn to_fields(&self) -> PostFields {
        PostFields {
            location: self.location.clone(),
            title: self.title.clone(),
            tags: self.tags.clone(),
            publish_time: self.publish_time,
            last_modified: Some(self.last_modified),
            author: self.author.clone(),
        }
    }
}

/// Reads the publish time out of a file name shaped like `<digits>_<name>`.
/// Returns `None` when there is no leading digit run followed by an
/// underscore, or when the digits don't fit a timestamp.
pub fn parse_publish_time(path: &Path) -> Option<i64> {
    lazy_static! {
        static ref PUBLISH_TIME_REGEX: Regex = Regex::new(r"^(?P<time>[0-9]+)_").unwrap();
    }

    let file_name = path.file_name()?.to_str()?;
    let caps = PUBLISH_TIME_REGEX.captures(file_name)?;
    caps.name("time")?.as_str().parse::<i64>().ok()
}

/// Prefixes `#` when missing. Empty tags (or a bare `#`) normalize to nothing.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim();
    let name = tag.strip_prefix('#').unwrap_or(tag);
    if name.is_empty() {
        None
    } else {
        Some(format!("#{}", name))
    }
}

pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().filter_map(|tag| normalize_tag(tag.as_ref())) {
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}
