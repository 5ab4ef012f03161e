//! Configuration constants and types for shroud.

use serde::{Deserialize, Serialize};

/// Archive container magic: "SHRA" in bytes.
pub const ARCHIVE_MAGIC: [u8; 4] = [0x53, 0x48, 0x52, 0x41];

/// Current archive container version.
pub const ARCHIVE_VERSION: u16 = 1;

/// Default deflate compression level (0-9).
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

/// Maximum deflate compression level.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Default soft limit on cumulative archive input size (100 MiB).
/// Exceeding it raises a warning, never an error.
pub const DEFAULT_SIZE_WARN_LIMIT: u64 = 100 * 1024 * 1024;

/// Default number of secure-delete overwrite passes.
pub const DEFAULT_SECURE_DELETE_PASSES: u32 = 7;

/// Default chunk size for file splitting, in MiB.
pub const DEFAULT_CHUNK_SIZE_MB: u64 = 10;

/// Highest chunk index the `.partNNN` naming scheme can represent.
pub const MAX_CHUNK_COUNT: usize = 999;

/// Block size for streaming file reads (hashing).
pub const IO_BLOCK_SIZE: usize = 4096;

/// Block size for overwrite passes during secure deletion.
pub const WIPE_BLOCK_SIZE: usize = 64 * 1024;

/// PBKDF2-HMAC-SHA256 parameters for key derivation.
pub mod kdf_params {
    /// Iteration count (fixed work factor).
    pub const ITERATIONS: u32 = 100_000;

    /// Output length in bytes (256 bits).
    pub const OUTPUT_LENGTH: usize = 32;

    /// Length of randomly generated per-envelope salts.
    pub const RANDOM_SALT_LENGTH: usize = 16;

    /// Default salt for archive-context key derivation.
    ///
    /// Shared by every install so archives decrypt anywhere, at the cost
    /// that an attacker can precompute keys for common passwords once and
    /// reuse them against every user. See
    /// [`SaltMode`](super::SaltMode) for the per-envelope alternative.
    pub const ARCHIVE_SALT: &[u8] = b"SHROUD_ARCHIVE_SALT_V1";

    /// Default salt for generic file-context key derivation.
    /// Same caveat as [`ARCHIVE_SALT`].
    pub const FILE_SALT: &[u8] = b"SHROUD_FILE_SALT_V1";
}

/// How envelope encryption obtains its KDF salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SaltMode {
    /// Fixed per-context salt from the configuration. Compatible across
    /// installs but vulnerable to key precomputation for common passwords.
    #[default]
    FixedContext,

    /// Fresh random salt per envelope, embedded in the envelope header.
    /// Tokens stay self-contained and precomputation buys nothing.
    PerEnvelopeRandom,
}

/// Configuration for a [`Vault`](crate::vault::Vault).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Deflate compression level for archive members (0-9).
    pub compression_level: u32,

    /// Soft limit on cumulative archive input size before a warning.
    pub size_warn_limit: u64,

    /// Number of overwrite passes for secure deletion.
    pub secure_delete_passes: u32,

    /// PBKDF2 iteration count.
    pub kdf_iterations: u32,

    /// Salt for archive-context key derivation.
    pub archive_salt: Vec<u8>,

    /// Salt for file-context key derivation.
    pub file_salt: Vec<u8>,

    /// Salt strategy for envelope encryption.
    pub salt_mode: SaltMode,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            size_warn_limit: DEFAULT_SIZE_WARN_LIMIT,
            secure_delete_passes: DEFAULT_SECURE_DELETE_PASSES,
            kdf_iterations: kdf_params::ITERATIONS,
            archive_salt: kdf_params::ARCHIVE_SALT.to_vec(),
            file_salt: kdf_params::FILE_SALT.to_vec(),
            salt_mode: SaltMode::default(),
        }
    }
}

impl VaultConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(format!(
                "Compression level must be between 0 and {}",
                MAX_COMPRESSION_LEVEL
            ));
        }
        if self.secure_delete_passes == 0 {
            return Err("At least one secure delete pass is required".to_string());
        }
        if self.kdf_iterations == 0 {
            return Err("KDF iteration count must be greater than 0".to_string());
        }
        if self.archive_salt.is_empty() || self.file_salt.is_empty() {
            return Err("KDF salts must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(VaultConfig::default().validate().is_ok());
    }

    #[test]
    fn test_compression_level_out_of_range() {
        let config = VaultConfig {
            compression_level: 10,
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_passes_rejected() {
        let config = VaultConfig {
            secure_delete_passes: 0,
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_salt_rejected() {
        let config = VaultConfig {
            archive_salt: Vec::new(),
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
