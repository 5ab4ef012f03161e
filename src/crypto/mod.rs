//! Cryptographic operations for shroud.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption envelopes
//! - PBKDF2-HMAC-SHA256 password-based key derivation

mod envelope;
mod kdf;

pub use envelope::{
    open_with_password, seal_with_password, Cipher, Envelope, ENVELOPE_MAGIC, ENVELOPE_VERSION,
    MIN_ENVELOPE_SIZE, NONCE_SIZE, TAG_SIZE,
};
pub use kdf::KeyDerivation;
