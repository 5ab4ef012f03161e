//! File chunking: split oversized files into bounded parts plus a
//! manifest sidecar, and reassemble them with size and hash verification.

mod joiner;
mod manifest;
mod splitter;

pub use joiner::join_chunks;
pub use manifest::{ChunkManifest, MANIFEST_SUFFIX};
pub use splitter::{split_file, SplitResult};
