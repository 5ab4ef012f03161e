//! The vault: configuration plus audit sink, and every top-level
//! operation as a method.
//!
//! Callers construct a [`Vault`] explicitly and pass it where needed;
//! there is no process-wide instance. Two vaults with different
//! configurations coexist without interfering.

use crate::archive::{self, ArchiveSummary, Extraction};
use crate::audit::{AuditLog, OperationStatus, ThreatLevel, TracingAudit};
use crate::chunk::{self, SplitResult};
use crate::config::VaultConfig;
use crate::crypto;
use crate::error::{Error, Result};
use crate::hashing::{self, FileDescriptor, HashAlgorithm};
use crate::shred;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Extension appended to standalone encrypted files.
pub const ENCRYPTED_SUFFIX: &str = "shrouded";

/// Extension appended when decrypting a file that lacks the
/// [`ENCRYPTED_SUFFIX`] marker.
pub const DECRYPTED_SUFFIX: &str = "decrypted";

/// Context object for secure file operations.
pub struct Vault {
    config: VaultConfig,
    audit: Box<dyn AuditLog>,
}

impl Vault {
    /// Create a vault from a validated configuration and an audit sink.
    pub fn new(config: VaultConfig, audit: Box<dyn AuditLog>) -> Result<Self> {
        config.validate().map_err(Error::Configuration)?;
        Ok(Self { config, audit })
    }

    /// Vault with the default configuration and the tracing audit sink.
    pub fn with_defaults() -> Self {
        Self {
            config: VaultConfig::default(),
            audit: Box::new(TracingAudit),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Build a compressed archive from `inputs`, optionally
    /// password-protected. See [`archive::build_archive`].
    pub fn build_archive(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        password: Option<&str>,
    ) -> Result<ArchiveSummary> {
        archive::build_archive(&self.config, self.audit.as_ref(), inputs, output, password)
    }

    /// Extract an archive into `output_dir`, decrypting it first when a
    /// password is given. See [`archive::extract_archive`].
    pub fn extract_archive(
        &self,
        archive_path: &Path,
        output_dir: &Path,
        password: Option<&str>,
    ) -> Result<Extraction> {
        archive::extract_archive(
            &self.config,
            self.audit.as_ref(),
            archive_path,
            output_dir,
            password,
        )
    }

    /// Encrypt a single file into `<path>.shrouded` next to it. The
    /// original is left in place.
    ///
    /// The whole file is read into memory; split very large files first.
    pub fn encrypt_file(&self, path: &Path, password: &str) -> Result<PathBuf> {
        match self.encrypt_file_inner(path, password) {
            Ok(output) => Ok(output),
            Err(e) => {
                self.audit.record_operation(
                    "FILE_ENCRYPT_FAILED",
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

    fn encrypt_file_inner(&self, path: &Path, password: &str) -> Result<PathBuf> {
        let plaintext = std::fs::read(path)?;
        let token = crypto::seal_with_password(
            &plaintext,
            password,
            &self.config.file_salt,
            self.config.kdf_iterations,
            self.config.salt_mode,
        )?;

        let output = encrypted_path_for(path);
        std::fs::write(&output, &token)?;

        self.audit.record_security_event(
            "FILE_ENCRYPTED",
            ThreatLevel::Info,
            &json!({
                "path": path.display().to_string(),
                "output": output.display().to_string(),
                "plaintext_size": plaintext.len(),
                "envelope_size": token.len(),
            }),
        );

        Ok(output)
    }

    /// Decrypt a `.shrouded` file back to its original name, or to
    /// `<path>.decrypted` when the marker extension is absent.
    pub fn decrypt_file(&self, path: &Path, password: &str) -> Result<PathBuf> {
        match self.decrypt_file_inner(path, password) {
            Ok(output) => Ok(output),
            Err(e) => {
                self.audit.record_operation(
                    "FILE_DECRYPT_FAILED",
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

    fn decrypt_file_inner(&self, path: &Path, password: &str) -> Result<PathBuf> {
        let token = std::fs::read(path)?;
        let plaintext = crypto::open_with_password(
            &token,
            password,
            &self.config.file_salt,
            self.config.kdf_iterations,
        )
        .map_err(|e| {
            self.audit.record_security_event(
                "FILE_DECRYPT_REJECTED",
                ThreatLevel::Error,
                &json!({
                    "path": path.display().to_string(),
                    "error": e.to_string(),
                }),
            );
            e
        })?;

        let output = decrypted_path_for(path);
        std::fs::write(&output, &plaintext)?;

        self.audit.record_security_event(
            "FILE_DECRYPTED",
            ThreatLevel::Info,
            &json!({
                "path": path.display().to_string(),
                "output": output.display().to_string(),
            }),
        );

        Ok(output)
    }

    /// Split a file into chunks of `chunk_size_mb` MiB.
    pub fn split_file(&self, path: &Path, chunk_size_mb: u64) -> Result<SplitResult> {
        chunk::split_file(self.audit.as_ref(), path, chunk_size_mb * 1024 * 1024)
    }

    /// Split a file with a byte-level chunk size.
    pub fn split_file_with_chunk_size(&self, path: &Path, chunk_size: u64) -> Result<SplitResult> {
        chunk::split_file(self.audit.as_ref(), path, chunk_size)
    }

    /// Reassemble a split file from its manifest. See
    /// [`chunk::join_chunks`].
    pub fn join_chunks(&self, manifest_path: &Path) -> Result<PathBuf> {
        chunk::join_chunks(self.audit.as_ref(), manifest_path)
    }

    /// Securely erase a file with the configured number of passes.
    pub fn secure_delete(&self, path: &Path) -> Result<()> {
        shred::secure_delete(path, self.config.secure_delete_passes, self.audit.as_ref())
    }

    /// Securely erase a file with an explicit pass count.
    pub fn secure_delete_with_passes(&self, path: &Path, passes: u32) -> Result<()> {
        if passes == 0 {
            return Err(Error::Configuration(
                "at least one overwrite pass is required".to_string(),
            ));
        }
        shred::secure_delete(path, passes, self.audit.as_ref())
    }

    /// Compute a file's content hash.
    pub fn hash_file(&self, path: &Path, algorithm: HashAlgorithm) -> Result<String> {
        match hashing::hash_file(path, algorithm) {
            Ok(digest) => {
                self.audit.record_operation(
                    "FILE_HASH_CALCULATED",
                    &json!({
                        "path": path.display().to_string(),
                        "algorithm": algorithm.name(),
                        "hash": digest,
                    }),
                    OperationStatus::Success,
                );
                Ok(digest)
            }
            Err(e) => {
                self.audit.record_operation(
                    "FILE_HASH_FAILED",
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

    /// Describe a regular file (path, size, SHA-256).
    pub fn describe_file(&self, path: &Path) -> Result<FileDescriptor> {
        hashing::describe_file(path)
    }
}

fn encrypted_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ENCRYPTED_SUFFIX);
    PathBuf::from(name)
}

fn decrypted_path_for(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == ENCRYPTED_SUFFIX => path.with_extension(""),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".");
            name.push(DECRYPTED_SUFFIX);
            PathBuf::from(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypted_path_appends_suffix() {
        assert_eq!(
            encrypted_path_for(Path::new("/tmp/report.pdf")),
            PathBuf::from("/tmp/report.pdf.shrouded")
        );
    }

    #[test]
    fn test_decrypted_path_strips_suffix() {
        assert_eq!(
            decrypted_path_for(Path::new("/tmp/report.pdf.shrouded")),
            PathBuf::from("/tmp/report.pdf")
        );
    }

    #[test]
    fn test_decrypted_path_without_marker() {
        assert_eq!(
            decrypted_path_for(Path::new("/tmp/blob.bin")),
            PathBuf::from("/tmp/blob.bin.decrypted")
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = VaultConfig {
            compression_level: 42,
            ..VaultConfig::default()
        };
        assert!(matches!(
            Vault::new(config, Box::new(crate::audit::NullAudit)),
            Err(Error::Configuration(_))
        ));
    }
}
