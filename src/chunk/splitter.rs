//! File splitting into bounded-size chunks.
//!
//! Chunks are named `<stem>.partNNN<ext>` with a zero-padded 1-based
//! index, written next to the original, and recorded in a manifest
//! sidecar. Files that already fit in one chunk are left untouched.

use crate::audit::{AuditLog, OperationStatus};
use crate::chunk::manifest::ChunkManifest;
use crate::config::MAX_CHUNK_COUNT;
use crate::error::{Error, Result};
use crate::hashing::{self, HashAlgorithm};
use chrono::Utc;
use serde_json::json;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Result of a split operation.
#[derive(Debug, Clone)]
pub struct SplitResult {
    /// Chunk paths in creation order, or just the original path when no
    /// split was needed.
    pub pieces: Vec<PathBuf>,

    /// Manifest sidecar path; `None` when no split was needed.
    pub manifest: Option<PathBuf>,
}

impl SplitResult {
    /// Whether the file was actually split.
    pub fn was_split(&self) -> bool {
        self.manifest.is_some()
    }
}

/// Split `path` into chunks of at most `chunk_size` bytes.
pub fn split_file(audit: &dyn AuditLog, path: &Path, chunk_size: u64) -> Result<SplitResult> {
    match split_inner(audit, path, chunk_size) {
        Ok(result) => {
            if result.was_split() {
                audit.record_operation(
                    "FILE_SPLIT_COMPLETED",
                    &json!({
                        "path": path.display().to_string(),
                        "chunk_count": result.pieces.len(),
                        "chunk_size": chunk_size,
                    }),
                    OperationStatus::Success,
                );
            }
            Ok(result)
        }
        Err(e) => {
            audit.record_operation(
                "FILE_SPLIT_FAILED",
                &json!({
                    "path": path.display().to_string(),
                    "error": e.to_string(),
                }),
                OperationStatus::Error,
            );
            Err(e)
        }
    }
}

fn split_inner(audit: &dyn AuditLog, path: &Path, chunk_size: u64) -> Result<SplitResult> {
    if chunk_size == 0 {
        return Err(Error::Configuration(
            "chunk size must be greater than zero".to_string(),
        ));
    }

    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(Error::InvalidInput(format!(
            "not a regular file: {}",
            path.display()
        )));
    }
    let file_size = metadata.len();

    if file_size <= chunk_size {
        audit.record_operation(
            "FILE_SPLIT_NOT_NEEDED",
            &json!({
                "path": path.display().to_string(),
                "size": file_size,
                "chunk_size": chunk_size,
            }),
            OperationStatus::Success,
        );
        return Ok(SplitResult {
            pieces: vec![path.to_path_buf()],
            manifest: None,
        });
    }

    let chunk_count = file_size.div_ceil(chunk_size) as usize;
    if chunk_count > MAX_CHUNK_COUNT {
        return Err(Error::Configuration(format!(
            "splitting would produce {chunk_count} chunks; the naming scheme supports at most {MAX_CHUNK_COUNT}"
        )));
    }

    // Hash the intact original before any chunk is written.
    let file_hash = hashing::hash_file(path, HashAlgorithm::Sha256)?;

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut input = File::open(path)?;
    let mut pieces = Vec::with_capacity(chunk_count);
    for index in 1..=chunk_count {
        let chunk_path = parent.join(format!("{stem}.part{index:03}{extension}"));
        let mut chunk_file = File::create(&chunk_path)?;
        std::io::copy(&mut input.by_ref().take(chunk_size), &mut chunk_file)?;
        pieces.push(chunk_path);
    }

    let manifest = ChunkManifest {
        original_file: file_name(path),
        original_size: file_size,
        chunk_size,
        chunk_count,
        chunks: pieces.iter().map(|p| file_name(p)).collect(),
        created_at: Utc::now().to_rfc3339(),
        file_hash: Some(file_hash),
    };
    let manifest_path = ChunkManifest::path_for(path);
    manifest.save(&manifest_path)?;

    Ok(SplitResult {
        pieces,
        manifest: Some(manifest_path),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
