//! Error types for shroud.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shroud operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shroud operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable input (missing file, empty batch, not a regular file).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Envelope failed authentication (wrong key, tampered or foreign data).
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// Archive decryption error (wrong password or corrupted archive).
    #[error("Archive decryption failed: {0}")]
    Decryption(String),

    /// A chunk listed in the manifest is absent.
    #[error("Missing chunk: {0}")]
    MissingChunk(String),

    /// Reassembled file size does not match the manifest.
    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// Reassembled file hash does not match the manifest.
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// Secure deletion aborted; the file was not removed.
    #[error("Secure delete failed for {path}: {reason}")]
    SecureDelete { path: PathBuf, reason: String },

    /// Invalid configuration value (bad compression level, zero chunk size,
    /// chunk count overflow).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Hash algorithm name not recognized.
    #[error("Unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Not an archive produced by this tool.
    #[error("Invalid archive format: expected magic 'SHRA'")]
    InvalidMagic,

    /// Archive container version not supported.
    #[error("Archive version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u16, found: u16 },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
