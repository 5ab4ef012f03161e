//! Reconstruction manifest for split files.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension of manifest sidecar files.
pub const MANIFEST_SUFFIX: &str = "shroud_manifest.json";

/// Sidecar record describing how to reassemble a split file.
///
/// `chunks` is the authoritative reassembly order. Joining never falls
/// back to directory enumeration, whose ordering is platform-dependent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkManifest {
    /// Base name of the original file.
    pub original_file: String,

    /// Original file size in bytes.
    pub original_size: u64,

    /// Chunk size the file was split with, in bytes.
    pub chunk_size: u64,

    /// Number of chunks written.
    pub chunk_count: usize,

    /// Chunk file names in creation order.
    pub chunks: Vec<String>,

    /// Creation time, RFC 3339.
    pub created_at: String,

    /// Whole-file SHA-256 of the original, when recorded.
    pub file_hash: Option<String>,
}

impl ChunkManifest {
    /// Sidecar path for a given original file path
    /// (`data.bin` -> `data.shroud_manifest.json`).
    pub fn path_for(original: &Path) -> PathBuf {
        original.with_extension(MANIFEST_SUFFIX)
    }

    /// Load and validate a manifest from its sidecar file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest: ChunkManifest = serde_json::from_str(&content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Save the manifest as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_count != self.chunks.len() {
            return Err(Error::Serialization(format!(
                "manifest chunk_count is {} but {} chunks are listed",
                self.chunk_count,
                self.chunks.len()
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::Serialization(
                "manifest chunk_size is zero".to_string(),
            ));
        }
        // Names are joined to the manifest directory; path components
        // would escape it.
        for name in self.chunks.iter().chain([&self.original_file]) {
            if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
                return Err(Error::Serialization(format!(
                    "unsafe file name in manifest: '{name}'"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> ChunkManifest {
        ChunkManifest {
            original_file: "data.bin".to_string(),
            original_size: 2500,
            chunk_size: 1000,
            chunk_count: 3,
            chunks: vec![
                "data.part001.bin".to_string(),
                "data.part002.bin".to_string(),
                "data.part003.bin".to_string(),
            ],
            created_at: "2024-06-01T12:00:00+00:00".to_string(),
            file_hash: Some("ab".repeat(32)),
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.shroud_manifest.json");

        let manifest = sample();
        manifest.save(&path).unwrap();
        let loaded = ChunkManifest::load(&path).unwrap();

        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_path_for_replaces_extension() {
        assert_eq!(
            ChunkManifest::path_for(Path::new("/tmp/data.bin")),
            PathBuf::from("/tmp/data.shroud_manifest.json")
        );
        assert_eq!(
            ChunkManifest::path_for(Path::new("/tmp/noext")),
            PathBuf::from("/tmp/noext.shroud_manifest.json")
        );
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let manifest = ChunkManifest {
            chunk_count: 2,
            ..sample()
        };
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let manifest = ChunkManifest {
            chunk_size: 0,
            ..sample()
        };
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_path_components_rejected() {
        let manifest = ChunkManifest {
            chunks: vec!["../escape".to_string()],
            chunk_count: 1,
            ..sample()
        };
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(
            ChunkManifest::load(&path),
            Err(Error::Serialization(_))
        ));
    }
}
