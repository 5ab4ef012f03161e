//! Streaming content hashing and file inspection.

use crate::config::IO_BLOCK_SIZE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported content hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha512" | "sha-512" => Ok(HashAlgorithm::Sha512),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Compute the hex digest of a file, streaming in fixed-size blocks so
/// memory use stays flat regardless of file size.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    let file = File::open(path)?;
    match algorithm {
        HashAlgorithm::Sha256 => hash_reader::<Sha256>(file),
        HashAlgorithm::Sha512 => hash_reader::<Sha512>(file),
    }
}

fn hash_reader<D: Digest>(mut reader: impl Read) -> Result<String> {
    let mut hasher = D::new();
    let mut block = [0u8; IO_BLOCK_SIZE];
    loop {
        let n = reader.read(&mut block)?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Content-addressed description of a regular file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileDescriptor {
    /// Path the descriptor was taken from.
    pub path: PathBuf,

    /// File size in bytes.
    pub size_bytes: u64,

    /// Whole-file SHA-256 as a hex string.
    pub content_hash: String,
}

/// Produce a [`FileDescriptor`] for a regular file.
pub fn describe_file(path: &Path) -> Result<FileDescriptor> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(Error::InvalidInput(format!(
            "not a regular file: {}",
            path.display()
        )));
    }
    Ok(FileDescriptor {
        path: path.to_path_buf(),
        size_bytes: metadata.len(),
        content_hash: hash_file(path, HashAlgorithm::Sha256)?,
    })
}

/// Render a byte count in human-readable form ("1.50 MB").
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
