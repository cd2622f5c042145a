pub mod archive;
pub mod config;
pub mod content;
pub mod error;
pub mod flat_index;
pub mod logger;
pub mod persistent_archive;
pub mod post;
pub mod post_factory;
pub mod post_list;
pub mod snapshot;
pub mod ymd_index;
mod test_data;

pub use archive::{Archive, IndexState};
pub use config::ArchiveConfig;
pub use error::{ArchiveError, ErrorKind, IndexKind, Result};
pub use persistent_archive::PersistentArchive;
pub use post::Post;
