use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::content::{HeaderParser, MetadataParser, PostMetadata};
use crate::error::{ArchiveError, Result};
use crate::post::{parse_publish_time, Post, PostFields};

/// Builds posts either from content files or from snapshot fields.
pub struct PostFactory {
    parser: Box<dyn MetadataParser>,
}

impl Default for PostFactory {
    fn default() -> Self {
        PostFactory::new(Box::new(HeaderParser))
    }
}

impl PostFactory {
    pub fn new(parser: Box<dyn MetadataParser>) -> Self {
        PostFactory { parser }
    }

    /// Reads `path` and builds a post from its header. The publish time comes
    /// from the file name only, never from the content or the file metadata.
    pub fn from_file(&self, path: &Path) -> Result<Post> {
        let publish_time = parse_publish_time(path).ok_or_else(|| ArchiveError::InvalidFilename {
            path: path.to_path_buf(),
        })?;

        let raw = fs::read(path).map_err(|e| ArchiveError::from_io(path, e))?;
        let metadata = self.parser.parse_metadata(&raw).map_err(|source| ArchiveError::MetadataParse {
            path: path.to_path_buf(),
            source,
        })?;

        let last_modified = modified_time(path)?;

        Post::new(path.to_path_buf(), metadata, publish_time, last_modified).map_err(|source| {
            ArchiveError::MetadataParse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Rebuilds a post from a previously serialized field set. Nothing is read
    /// from disk; the snapshot is trusted, including its publish time.
    pub fn from_snapshot(fields: PostFields) -> Result<Post> {
        let metadata = PostMetadata {
            title: fields.title,
            tags: fields.tags,
            author: fields.author,
        };
        let last_modified = fields.last_modified.unwrap_or(fields.publish_time);

        let location = fields.location;
        Post::new(location.clone(), metadata, fields.publish_time, last_modified).map_err(|source| {
            ArchiveError::MetadataParse {
                path: location,
                source,
            }
        })
    }
}

pub(crate) fn modified_time(path: &Path) -> Result<i64> {
    let modified = fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|e| ArchiveError::from_io(path, e))?;
    Ok(DateTime::<Utc>::from(modified).timestamp())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::tempdir;

    use crate::content::MetadataError;
    use crate::error::ErrorKind;
    use crate::test_data::{POST_TAG_LINE, POST_YAML_HEADER, POST_YAML_WITH_TITLE};

    use super::*;

    struct FailingParser;

    impl MetadataParser for FailingParser {
        fn parse_metadata(&self, _raw: &[u8]) -> std::result::Result<PostMetadata, MetadataError> {
            Err(MetadataError::InvalidTags("always fails".to_string()))
        }
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1550908491_sample_post.md");
        fs::write(&path, POST_YAML_HEADER).unwrap();

        let post = PostFactory::default().from_file(&path)?;
        assert_eq!(post.location(), path.as_path());
        assert_eq!(post.title(), "Title of My Blog Post");
        assert_eq!(post.tags(), ["#BigChungus", "#memes"]);
        assert_eq!(post.publish_time(), 1550908491);
        assert!(post.last_modified() > 0);
        Ok(())
    }

    #[test]
    fn test_from_file_with_title_in_header() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1550908492_sample_post_with_title.md");
        fs::write(&path, POST_YAML_WITH_TITLE).unwrap();

        let post = PostFactory::default().from_file(&path)?;
        assert_eq!(post.title(), "Title of My Blog Post");
        assert_eq!(post.tags(), ["#BigChungus", "#memes"]);
        assert_eq!(post.author(), Some("devin"));
        assert_eq!(post.publish_time(), 1550908492);
        Ok(())
    }

    #[test]
    fn test_invalid_file_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample_post.md");
        fs::write(&path, POST_TAG_LINE).unwrap();

        let err = PostFactory::default().from_file(&path).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidFilename { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = PostFactory::default().from_file(&dir.path().join("1_missing.md")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_metadata_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1_a.md");
        fs::write(&path, POST_TAG_LINE).unwrap();

        let err = PostFactory::new(Box::new(FailingParser)).from_file(&path).unwrap_err();
        assert!(matches!(err, ArchiveError::MetadataParse { .. }));
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_from_snapshot() -> Result<()> {
        let fields = PostFields {
            location: PathBuf::from("published/1514618960_wow3.md"),
            title: "title".to_string(),
            tags: vec!["post".to_string()],
            publish_time: 1514618960,
            last_modified: None,
            author: Some("devin".to_string()),
        };

        // The file does not exist and doesn't need to
        let post = PostFactory::from_snapshot(fields)?;
        assert_eq!(post.publish_time(), 1514618960);
        assert_eq!(post.last_modified(), 1514618960);
        assert_eq!(post.tags(), ["#post"]);
        assert_eq!(post.author(), Some("devin"));

        let round_trip = PostFactory::from_snapshot(post.to_fields())?;
        assert_eq!(round_trip, post);
        Ok(())
    }

    #[test]
    fn test_from_snapshot_requires_title() {
        let fields = PostFields {
            location: PathBuf::from("1_a.md"),
            title: "".to_string(),
            tags: vec![],
            publish_time: 1,
            last_modified: Some(1),
            author: None,
        };
        assert!(PostFactory::from_snapshot(fields).is_err());
    }
}
