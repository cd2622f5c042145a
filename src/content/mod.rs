use thiserror::Error;

pub mod parsing_utils;

pub use parsing_utils::HeaderParser;

/// What the archive needs to know about a post besides its file name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostMetadata {
    pub title: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("content is not valid UTF-8")]
    InvalidEncoding,
    #[error("end of comment in the header is missing")]
    UnterminatedHeader,
    #[error("invalid front matter: {0}")]
    InvalidFrontMatter(String),
    #[error("unable to parse tags: {0}")]
    InvalidTags(String),
    #[error("unable to parse title: reached end of file")]
    MissingTitle,
}

/// Extracts title, tags and author from the raw bytes of a post.
pub trait MetadataParser {
    fn parse_metadata(&self, raw: &[u8]) -> Result<PostMetadata, MetadataError>;
}
