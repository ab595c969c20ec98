//! Domain Layer

pub mod archive;
pub mod builder;
pub mod config;

pub use archive::{ArchiveSummary, MessageArchive};
pub use builder::{classify, create_broadcast, to_message, to_report};
pub use config::MessagingConfig;
