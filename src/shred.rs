//! Multi-pass secure file deletion.
//!
//! Overwrites the full file with a fixed pattern sequence before
//! unlinking: zeros, then ones, then CSPRNG random, then alternating
//! 0xAA / 0x55 for the remaining passes. Each pass is synced to durable
//! storage before the next starts, so the passes cannot collapse into one
//! buffered write.
//!
//! This defeats naive recovery from the file's own blocks. It does not
//! reach copies the storage layer made elsewhere (SSD wear leveling,
//! copy-on-write snapshots, journals).

use crate::audit::{AuditLog, ThreatLevel};
use crate::config::WIPE_BLOCK_SIZE;
use crate::error::{Error, Result};
use rand::RngCore;
use serde_json::json;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// Overwrite pattern for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePattern {
    /// All 0x00 bytes.
    Zeros,
    /// All 0xFF bytes.
    Ones,
    /// Cryptographically random bytes.
    Random,
    /// A single repeated byte.
    Repeated(u8),
}

/// Pattern for pass `pass` (0-based) of the overwrite sequence.
pub fn pass_pattern(pass: u32) -> OverwritePattern {
    match pass {
        0 => OverwritePattern::Zeros,
        1 => OverwritePattern::Ones,
        2 => OverwritePattern::Random,
        n if n % 2 == 0 => OverwritePattern::Repeated(0xAA),
        _ => OverwritePattern::Repeated(0x55),
    }
}

/// Securely delete a file: `passes` overwrite passes, then unlink.
///
/// A missing file is a no-op success. A failure mid-sequence aborts
/// without unlinking; the partially overwritten file stays on disk and
/// the error names it.
pub fn secure_delete(path: &Path, passes: u32, audit: &dyn AuditLog) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let file_size = std::fs::metadata(path)
        .map_err(|e| delete_error(path, &e))?
        .len();

    audit.record_security_event(
        "SECURE_DELETE_STARTED",
        ThreatLevel::Warning,
        &json!({
            "path": path.display().to_string(),
            "size": file_size,
            "passes": passes,
        }),
    );

    if let Err(e) = overwrite_passes(path, file_size, passes) {
        audit.record_security_event(
            "SECURE_DELETE_FAILED",
            ThreatLevel::Error,
            &json!({
                "path": path.display().to_string(),
                "error": e.to_string(),
            }),
        );
        return Err(delete_error(path, &e));
    }

    if let Err(e) = std::fs::remove_file(path) {
        audit.record_security_event(
            "SECURE_DELETE_FAILED",
            ThreatLevel::Error,
            &json!({
                "path": path.display().to_string(),
                "error": e.to_string(),
            }),
        );
        return Err(delete_error(path, &e));
    }

    audit.record_security_event(
        "SECURE_DELETE_COMPLETED",
        ThreatLevel::Warning,
        &json!({
            "path": path.display().to_string(),
            "passes_completed": passes,
        }),
    );

    Ok(())
}

fn delete_error(path: &Path, e: &std::io::Error) -> Error {
    Error::SecureDelete {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn overwrite_passes(path: &Path, file_size: u64, passes: u32) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    let mut rng = rand::thread_rng();
    let mut block = vec![0u8; WIPE_BLOCK_SIZE];

    for pass in 0..passes {
        file.seek(SeekFrom::Start(0))?;

        let pattern = pass_pattern(pass);
        match pattern {
            OverwritePattern::Zeros => block.fill(0x00),
            OverwritePattern::Ones => block.fill(0xFF),
            OverwritePattern::Repeated(byte) => block.fill(byte),
            OverwritePattern::Random => {}
        }

        let mut remaining = file_size;
        while remaining > 0 {
            let n = remaining.min(WIPE_BLOCK_SIZE as u64) as usize;
            if pattern == OverwritePattern::Random {
                rng.fill_bytes(&mut block[..n]);
            }
            file.write_all(&block[..n])?;
            remaining -= n as u64;
        }

        file.sync_all()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{MemoryAudit, NullAudit};
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_pass_sequence() {
        let sequence: Vec<OverwritePattern> = (0..7).map(pass_pattern).collect();
        assert_eq!(
            sequence,
            vec![
                OverwritePattern::Zeros,
                OverwritePattern::Ones,
                OverwritePattern::Random,
                OverwritePattern::Repeated(0x55),
                OverwritePattern::Repeated(0xAA),
                OverwritePattern::Repeated(0x55),
                OverwritePattern::Repeated(0xAA),
            ]
        );
    }

    #[test]
    fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, b"sensitive content").unwrap();

        secure_delete(&path, 3, &NullAudit).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never-existed");

        secure_delete(&path, 3, &NullAudit).unwrap();
    }

    #[test]
    fn test_empty_file_deleted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        File::create(&path).unwrap();

        secure_delete(&path, 7, &NullAudit).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_multi_block_file_deleted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        std::fs::write(&path, vec![0x5Au8; WIPE_BLOCK_SIZE * 2 + 123]).unwrap();

        secure_delete(&path, 2, &NullAudit).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_security_events_recorded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audited.txt");
        std::fs::write(&path, b"data").unwrap();

        let audit = MemoryAudit::new();
        secure_delete(&path, 1, &audit).unwrap();

        let events: Vec<String> = audit
            .security_events()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            events,
            vec!["SECURE_DELETE_STARTED", "SECURE_DELETE_COMPLETED"]
        );
    }
}
