//! Chunk reassembly with integrity verification.

use crate::audit::{AuditLog, OperationStatus};
use crate::chunk::manifest::ChunkManifest;
use crate::error::{Error, Result};
use crate::hashing::{self, HashAlgorithm};
use serde_json::json;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Reassemble a split file from its manifest. Returns the path of the
/// reconstructed file.
///
/// Every chunk must exist before the output is created, so a missing
/// chunk never leaves a partial reconstruction behind. After writing, the
/// size and then the whole-file hash are checked against the manifest; a
/// mismatch is an error but the output file is left in place for
/// diagnosis.
pub fn join_chunks(audit: &dyn AuditLog, manifest_path: &Path) -> Result<PathBuf> {
    match join_inner(manifest_path) {
        Ok(output) => {
            audit.record_operation(
                "FILE_JOIN_COMPLETED",
                &json!({
                    "manifest": manifest_path.display().to_string(),
                    "output": output.display().to_string(),
                }),
                OperationStatus::Success,
            );
            Ok(output)
        }
        Err(e) => {
            audit.record_operation(
                "FILE_JOIN_FAILED",
                &json!({
                    "manifest": manifest_path.display().to_string(),
                    "error": e.to_string(),
                }),
                OperationStatus::Error,
            );
            Err(e)
        }
    }
}

fn join_inner(manifest_path: &Path) -> Result<PathBuf> {
    let manifest = ChunkManifest::load(manifest_path)?;
    let manifest_dir = manifest_path.parent().unwrap_or_else(|| Path::new(""));

    let mut chunk_paths = Vec::with_capacity(manifest.chunks.len());
    for name in &manifest.chunks {
        let chunk_path = manifest_dir.join(name);
        if !chunk_path.is_file() {
            return Err(Error::MissingChunk(name.clone()));
        }
        chunk_paths.push(chunk_path);
    }

    let output_path = manifest_dir.join(&manifest.original_file);
    let mut output = File::create(&output_path)?;
    for chunk_path in &chunk_paths {
        let mut chunk = File::open(chunk_path)?;
        std::io::copy(&mut chunk, &mut output)?;
    }
    drop(output);

    let actual_size = std::fs::metadata(&output_path)?.len();
    if actual_size != manifest.original_size {
        return Err(Error::SizeMismatch {
            expected: manifest.original_size,
            actual: actual_size,
        });
    }

    if let Some(expected) = &manifest.file_hash {
        let actual = hashing::hash_file(&output_path, HashAlgorithm::Sha256)?;
        if &actual != expected {
            return Err(Error::HashMismatch {
                expected: expected.clone(),
                actual,
            });
        }
    }

    Ok(output_path)
}
