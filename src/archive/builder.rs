//! Archive construction.
//!
//! Inputs are validated up front: anything missing or not a regular file
//! is skipped with a warning, and an empty valid set is an error. Members
//! are stored under their base names together with one metadata member.
//! With a password, the finished container is re-encrypted in place
//! (archive-then-encrypt), so the output is a single opaque envelope.

use crate::archive::container::ContainerWriter;
use crate::audit::{AuditLog, OperationStatus, ThreatLevel};
use crate::config::VaultConfig;
use crate::crypto;
use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Name of the metadata member embedded in every archive.
pub const METADATA_MEMBER: &str = "shroud_metadata.json";

/// Current archive metadata record version.
pub const METADATA_VERSION: u32 = 1;

/// Metadata record stored as an extra member inside the container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveMetadata {
    /// Metadata record version.
    pub format_version: u32,

    /// Creation time, RFC 3339.
    pub creation_time: String,

    /// Number of file members (the metadata member excluded).
    pub file_count: usize,

    /// Cumulative uncompressed input size in bytes.
    pub total_size_bytes: u64,

    /// Deflate level the members were stored with.
    pub compression_level: u32,

    /// Whether the finished container was envelope-encrypted.
    pub encrypted: bool,
}

/// Summary returned by a successful archive build.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    /// Path of the finished archive.
    pub archive_path: PathBuf,

    /// Number of files stored.
    pub file_count: usize,

    /// Cumulative uncompressed input size in bytes.
    pub total_size: u64,

    /// Size of the finished archive on disk.
    pub compressed_size: u64,

    /// Space saved, as a percentage of the input size.
    pub compression_ratio: f64,

    /// Whether the archive was encrypted.
    pub encrypted: bool,

    /// Inputs skipped during validation.
    pub skipped: Vec<PathBuf>,

    /// True when the soft input-size limit was exceeded.
    pub size_warning: bool,
}

/// Build a compressed archive from `inputs`, optionally password-protected.
pub fn build_archive(
    config: &VaultConfig,
    audit: &dyn AuditLog,
    inputs: &[PathBuf],
    output: &Path,
    password: Option<&str>,
) -> Result<ArchiveSummary> {
    match build_inner(config, audit, inputs, output, password) {
        Ok(summary) => {
            audit.record_operation(
                "ARCHIVE_CREATED",
                &json!({
                    "archive": summary.archive_path.display().to_string(),
                    "file_count": summary.file_count,
                    "total_size": summary.total_size,
                    "compressed_size": summary.compressed_size,
                    "encrypted": summary.encrypted,
                }),
                OperationStatus::Success,
            );
            Ok(summary)
        }
        Err(e) => {
            audit.record_operation(
                "ARCHIVE_BUILD_FAILED",
                &json!({
                    "output": output.display().to_string(),
                    "error": e.to_string(),
                }),
                OperationStatus::Error,
            );
            Err(e)
        }
    }
}

fn build_inner(
    config: &VaultConfig,
    audit: &dyn AuditLog,
    inputs: &[PathBuf],
    output: &Path,
    password: Option<&str>,
) -> Result<ArchiveSummary> {
    let mut valid: Vec<(PathBuf, u64)> = Vec::new();
    let mut skipped: Vec<PathBuf> = Vec::new();
    let mut total_size: u64 = 0;

    for path in inputs {
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => {
                total_size += metadata.len();
                valid.push((path.clone(), metadata.len()));
            }
            _ => {
                audit.record_operation(
                    "INVALID_FILE_SKIPPED",
                    &json!({ "path": path.display().to_string() }),
                    OperationStatus::Warning,
                );
                skipped.push(path.clone());
            }
        }
    }

    if valid.is_empty() {
        return Err(Error::InvalidInput(
            "no valid files to archive".to_string(),
        ));
    }

    let size_warning = total_size > config.size_warn_limit;
    if size_warning {
        audit.record_operation(
            "ARCHIVE_SIZE_WARNING",
            &json!({
                "total_size": total_size,
                "limit": config.size_warn_limit,
            }),
            OperationStatus::Warning,
        );
    }

    let mut writer = ContainerWriter::create(output, config.compression_level)?;
    for (path, size) in &valid {
        let name = base_name(path)?;
        let mut file = File::open(path)?;
        writer.add_member(&name, &mut file)?;
        audit.record_operation(
            "FILE_ADDED_TO_ARCHIVE",
            &json!({
                "path": path.display().to_string(),
                "member": name,
                "size": size,
            }),
            OperationStatus::Success,
        );
    }

    let metadata = ArchiveMetadata {
        format_version: METADATA_VERSION,
        creation_time: Utc::now().to_rfc3339(),
        file_count: valid.len(),
        total_size_bytes: total_size,
        compression_level: config.compression_level,
        encrypted: password.is_some(),
    };
    writer.add_member_bytes(METADATA_MEMBER, &serde_json::to_vec_pretty(&metadata)?)?;
    writer.finish()?;

    if let Some(password) = password {
        encrypt_in_place(config, audit, output, password)?;
    }

    let compressed_size = std::fs::metadata(output)?.len();
    let compression_ratio = if total_size > 0 {
        (1.0 - compressed_size as f64 / total_size as f64) * 100.0
    } else {
        0.0
    };

    Ok(ArchiveSummary {
        archive_path: output.to_path_buf(),
        file_count: valid.len(),
        total_size,
        compressed_size,
        compression_ratio,
        encrypted: password.is_some(),
        skipped,
        size_warning,
    })
}

/// Replace the plaintext container at `path` with its encryption envelope.
fn encrypt_in_place(
    config: &VaultConfig,
    audit: &dyn AuditLog,
    path: &Path,
    password: &str,
) -> Result<()> {
    let plaintext = std::fs::read(path)?;
    let token = crypto::seal_with_password(
        &plaintext,
        password,
        &config.archive_salt,
        config.kdf_iterations,
        config.salt_mode,
    )?;
    std::fs::write(path, &token)?;

    audit.record_security_event(
        "ARCHIVE_ENCRYPTED",
        ThreatLevel::Info,
        &json!({
            "path": path.display().to_string(),
            "container_size": plaintext.len(),
            "envelope_size": token.len(),
        }),
    );

    Ok(())
}

fn base_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidInput(format!("path has no file name: {}", path.display())))
}
