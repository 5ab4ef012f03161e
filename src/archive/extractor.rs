//! Archive extraction.
//!
//! Encrypted archives are decrypted to a transient plaintext copy next to
//! the archive; a scope guard guarantees that copy is securely erased on
//! every exit path, including errors.

use crate::archive::builder::{ArchiveMetadata, METADATA_MEMBER};
use crate::archive::container::ContainerReader;
use crate::audit::{AuditLog, OperationStatus, ThreatLevel};
use crate::config::VaultConfig;
use crate::crypto;
use crate::error::{Error, Result};
use crate::shred;
use serde_json::json;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Suffix of the transient plaintext copy of an encrypted archive.
const TEMP_SUFFIX: &str = "decrypted.tmp";

/// Result of an archive extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Extracted file paths, in member order.
    pub files: Vec<PathBuf>,

    /// Embedded metadata, when the archive carries it.
    pub metadata: Option<ArchiveMetadata>,
}

/// Scope guard that securely erases the temp plaintext archive. `erase`
/// is the normal path and surfaces failures; `Drop` is the backstop for
/// early returns.
struct TempPlaintext<'a> {
    path: PathBuf,
    audit: &'a dyn AuditLog,
    passes: u32,
    armed: bool,
}

impl<'a> TempPlaintext<'a> {
    fn new(path: PathBuf, audit: &'a dyn AuditLog, passes: u32) -> Self {
        Self {
            path,
            audit,
            passes,
            armed: true,
        }
    }

    fn erase(mut self) -> Result<()> {
        self.armed = false;
        shred::secure_delete(&self.path, self.passes, self.audit)
    }
}

impl Drop for TempPlaintext<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = shred::secure_delete(&self.path, self.passes, self.audit) {
                self.audit.record_security_event(
                    "TEMP_CLEANUP_FAILED",
                    ThreatLevel::Error,
                    &json!({
                        "path": self.path.display().to_string(),
                        "error": e.to_string(),
                    }),
                );
            }
        }
    }
}

/// Extract an archive into `output_dir`, decrypting it first when a
/// password is given.
pub fn extract_archive(
    config: &VaultConfig,
    audit: &dyn AuditLog,
    archive_path: &Path,
    output_dir: &Path,
    password: Option<&str>,
) -> Result<Extraction> {
    match extract_inner(config, audit, archive_path, output_dir, password) {
        Ok(extraction) => {
            audit.record_operation(
                "ARCHIVE_EXTRACTED",
                &json!({
                    "archive": archive_path.display().to_string(),
                    "output_dir": output_dir.display().to_string(),
                    "file_count": extraction.files.len(),
                }),
                OperationStatus::Success,
            );
            Ok(extraction)
        }
        Err(e) => {
            audit.record_operation(
                "ARCHIVE_EXTRACT_FAILED",
                &json!({
                    "archive": archive_path.display().to_string(),
                    "error": e.to_string(),
                }),
                OperationStatus::Error,
            );
            Err(e)
        }
    }
}

fn extract_inner(
    config: &VaultConfig,
    audit: &dyn AuditLog,
    archive_path: &Path,
    output_dir: &Path,
    password: Option<&str>,
) -> Result<Extraction> {
    std::fs::create_dir_all(output_dir)?;

    let Some(password) = password else {
        return extract_container(audit, archive_path, output_dir);
    };

    let token = std::fs::read(archive_path)?;
    let plaintext = crypto::open_with_password(
        &token,
        password,
        &config.archive_salt,
        config.kdf_iterations,
    )
    .map_err(|e| {
        audit.record_security_event(
            "ARCHIVE_DECRYPT_FAILED",
            ThreatLevel::Error,
            &json!({
                "archive": archive_path.display().to_string(),
                "error": e.to_string(),
            }),
        );
        Error::Decryption(e.to_string())
    })?;

    let temp_path = temp_path_for(archive_path);
    let guard = TempPlaintext::new(temp_path.clone(), audit, config.secure_delete_passes);
    std::fs::write(&temp_path, &plaintext)?;

    let result = extract_container(audit, &temp_path, output_dir);
    let erase_result = guard.erase();
    match (result, erase_result) {
        (Ok(extraction), Ok(())) => Ok(extraction),
        (Ok(_), Err(erase_err)) => Err(erase_err),
        // The extraction error wins; a failed erase is already on the
        // audit trail.
        (Err(e), _) => Err(e),
    }
}

fn temp_path_for(archive_path: &Path) -> PathBuf {
    let mut name = archive_path.as_os_str().to_os_string();
    name.push(".");
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

fn extract_container(
    audit: &dyn AuditLog,
    container_path: &Path,
    output_dir: &Path,
) -> Result<Extraction> {
    let mut reader = ContainerReader::open(container_path)?;
    let entries = reader.entries().to_vec();

    let mut metadata = None;
    if let Some(entry) = entries.iter().rev().find(|e| e.name == METADATA_MEMBER) {
        let bytes = reader.read_member(entry)?;
        let parsed: ArchiveMetadata = serde_json::from_slice(&bytes)?;
        let details = serde_json::to_value(&parsed)?;
        audit.record_operation("ARCHIVE_METADATA_READ", &details, OperationStatus::Success);
        metadata = Some(parsed);
    }

    let mut files = Vec::new();
    for entry in &entries {
        if entry.name == METADATA_MEMBER {
            continue;
        }
        // Member names are base names; anything else cannot be trusted to
        // stay inside the output directory.
        if entry.name.is_empty()
            || entry.name.contains('/')
            || entry.name.contains('\\')
            || entry.name == ".."
        {
            return Err(Error::InvalidInput(format!(
                "unsafe member name: '{}'",
                entry.name
            )));
        }

        let dest = output_dir.join(&entry.name);
        let mut out = File::create(&dest)?;
        reader.extract_member(entry, &mut out)?;
        audit.record_operation(
            "FILE_EXTRACTED",
            &json!({
                "member": entry.name,
                "path": dest.display().to_string(),
                "size": entry.raw_size,
            }),
            OperationStatus::Success,
        );
        files.push(dest);
    }

    Ok(Extraction { files, metadata })
}
