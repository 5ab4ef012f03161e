//! Shroud: secure file lifecycle toolkit.
//!
//! Packages sensitive files into password-protectable archives, splits
//! oversized files into transmittable chunks with a verified
//! reconstruction manifest, and destroys file contents with multi-pass
//! overwrites before deletion.
//!
//! # Features
//!
//! - **Encrypted archives**: multi-entry deflate containers, optionally
//!   wrapped whole in an AES-256-GCM envelope (archive-then-encrypt)
//! - **Chunk split/join**: bounded-size parts plus a JSON manifest whose
//!   order is authoritative; reassembly verifies size and SHA-256
//! - **Secure erase**: fixed multi-pass overwrite sequence, synced per
//!   pass, before unlink
//! - **Audit trail**: every operation reports through a pluggable
//!   [`AuditLog`](audit::AuditLog) sink
//!
//! # Architecture
//!
//! ```text
//! Files → Compress (deflate container) → Encrypt (AES-256-GCM envelope)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use shroud::Vault;
//! use std::path::{Path, PathBuf};
//!
//! let vault = Vault::with_defaults();
//!
//! // Pack two files into an encrypted archive
//! let summary = vault.build_archive(
//!     &[PathBuf::from("notes.txt"), PathBuf::from("keys.bin")],
//!     Path::new("backup.shra"),
//!     Some("correct horse battery staple"),
//! ).unwrap();
//! assert!(summary.encrypted);
//!
//! // ...and back out again
//! let extraction = vault.extract_archive(
//!     Path::new("backup.shra"),
//!     Path::new("restored"),
//!     Some("correct horse battery staple"),
//! ).unwrap();
//! assert_eq!(extraction.files.len(), 2);
//! ```

pub mod archive;
pub mod audit;
pub mod chunk;
pub mod config;
pub mod crypto;
pub mod error;
pub mod hashing;
pub mod shred;
pub mod vault;

pub use config::{SaltMode, VaultConfig};
pub use error::{Error, Result};
pub use vault::Vault;
