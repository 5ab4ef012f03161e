//! Compressed archive building and extraction.
//!
//! Archives are multi-entry deflate containers carrying one embedded
//! metadata member. A password wraps the finished container in a single
//! encryption envelope (archive-then-encrypt), so an encrypted archive
//! exposes no member structure at all.

mod builder;
mod container;
mod extractor;

pub use builder::{
    build_archive, ArchiveMetadata, ArchiveSummary, METADATA_MEMBER, METADATA_VERSION,
};
pub use container::{ContainerReader, ContainerWriter, MemberEntry};
pub use extractor::{extract_archive, Extraction};
