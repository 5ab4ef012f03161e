//! AES-256-GCM authenticated encryption envelopes.
//!
//! An envelope is a self-contained token: everything needed to verify and
//! decrypt it travels with the ciphertext, so only the key (or password)
//! is required at open time.
//!
//! Layout: `"SHRD" || version (1) || flags (1) || [salt (16)] || nonce (12)
//! || ciphertext+tag`. The salt field is present only when bit 0 of
//! `flags` is set (per-envelope random KDF salt).
//!
//! Tampering with any byte, including the header, makes `open` fail with
//! [`Error::Integrity`]; partial plaintext is never returned.

use crate::config::{kdf_params, SaltMode};
use crate::crypto::kdf::KeyDerivation;
use crate::error::{Error, Result};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;

/// Nonce size for AES-GCM (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (128 bits).
pub const TAG_SIZE: usize = 16;

/// Envelope magic: "SHRD" in bytes.
pub const ENVELOPE_MAGIC: [u8; 4] = [0x53, 0x48, 0x52, 0x44];

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Flag bit: a random KDF salt follows the header.
const FLAG_EMBEDDED_SALT: u8 = 0x01;

/// Fixed header bytes: magic, version, flags.
const HEADER_SIZE: usize = 4 + 1 + 1;

/// Smallest well-formed envelope: header plus nonce plus the tag of an
/// empty plaintext.
pub const MIN_ENVELOPE_SIZE: usize = HEADER_SIZE + NONCE_SIZE + TAG_SIZE;

/// AES-256-GCM cipher bound to a derived key.
pub struct Cipher {
    cipher: Aes256Gcm,
}

impl Cipher {
    /// Create a cipher from a derived 256-bit key.
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(&key.into()),
        }
    }

    /// Encrypt plaintext into an envelope with no embedded salt.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.seal_inner(plaintext, None)
    }

    /// Encrypt plaintext into an envelope carrying a KDF salt, so the
    /// token decrypts without out-of-band salt knowledge.
    pub fn seal_with_salt(&self, plaintext: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
        if salt.len() != kdf_params::RANDOM_SALT_LENGTH {
            return Err(Error::Encryption(format!(
                "embedded salt must be {} bytes, got {}",
                kdf_params::RANDOM_SALT_LENGTH,
                salt.len()
            )));
        }
        self.seal_inner(plaintext, Some(salt))
    }

    fn seal_inner(&self, plaintext: &[u8], salt: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let salt_len = salt.map_or(0, <[u8]>::len);
        let mut token = Vec::with_capacity(HEADER_SIZE + salt_len + NONCE_SIZE + ciphertext.len());
        token.extend_from_slice(&ENVELOPE_MAGIC);
        token.push(ENVELOPE_VERSION);
        token.push(if salt.is_some() { FLAG_EMBEDDED_SALT } else { 0 });
        if let Some(salt) = salt {
            token.extend_from_slice(salt);
        }
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&ciphertext);

        Ok(token)
    }

    /// Decrypt an envelope produced by [`seal`](Self::seal) or
    /// [`seal_with_salt`](Self::seal_with_salt).
    pub fn open(&self, token: &[u8]) -> Result<Vec<u8>> {
        let envelope = Envelope::parse(token)?;
        self.open_parsed(&envelope)
    }

    fn open_parsed(&self, envelope: &Envelope<'_>) -> Result<Vec<u8>> {
        let nonce = Nonce::from_slice(envelope.nonce);
        self.cipher.decrypt(nonce, envelope.ciphertext).map_err(|_| {
            Error::Integrity("authentication failed: wrong key or corrupted envelope".to_string())
        })
    }
}

/// Borrowed view of a parsed envelope.
#[derive(Debug)]
pub struct Envelope<'a> {
    /// Embedded per-envelope KDF salt, if any.
    pub salt: Option<&'a [u8]>,
    /// AES-GCM nonce.
    pub nonce: &'a [u8],
    /// Ciphertext including the trailing authentication tag.
    pub ciphertext: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Parse and frame-check a token without decrypting it.
    pub fn parse(token: &'a [u8]) -> Result<Self> {
        if token.len() < MIN_ENVELOPE_SIZE {
            return Err(Error::Integrity(format!(
                "envelope too short: {} bytes, minimum is {}",
                token.len(),
                MIN_ENVELOPE_SIZE
            )));
        }
        if token[..4] != ENVELOPE_MAGIC {
            return Err(Error::Integrity("not an envelope: bad magic".to_string()));
        }
        let version = token[4];
        if version != ENVELOPE_VERSION {
            return Err(Error::Integrity(format!(
                "unsupported envelope version {version}"
            )));
        }
        let flags = token[5];
        if flags & !FLAG_EMBEDDED_SALT != 0 {
            return Err(Error::Integrity(format!(
                "unknown envelope flags {flags:#04x}"
            )));
        }

        let mut rest = &token[HEADER_SIZE..];
        let salt = if flags & FLAG_EMBEDDED_SALT != 0 {
            if rest.len() < kdf_params::RANDOM_SALT_LENGTH {
                return Err(Error::Integrity(
                    "envelope truncated inside salt field".to_string(),
                ));
            }
            let (salt, tail) = rest.split_at(kdf_params::RANDOM_SALT_LENGTH);
            rest = tail;
            Some(salt)
        } else {
            None
        };

        if rest.len() < NONCE_SIZE + TAG_SIZE {
            return Err(Error::Integrity("envelope truncated".to_string()));
        }
        let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }

    /// Whether a token starts with the envelope magic.
    pub fn looks_like_envelope(token: &[u8]) -> bool {
        token.len() >= 4 && token[..4] == ENVELOPE_MAGIC
    }
}

/// Encrypt plaintext with a password.
///
/// `SaltMode::FixedContext` derives the key from `context_salt`;
/// `SaltMode::PerEnvelopeRandom` draws a fresh salt and embeds it in the
/// token. The whole plaintext is held in memory.
pub fn seal_with_password(
    plaintext: &[u8],
    password: &str,
    context_salt: &[u8],
    iterations: u32,
    mode: SaltMode,
) -> Result<Vec<u8>> {
    match mode {
        SaltMode::FixedContext => {
            let kdf = KeyDerivation::from_salt(context_salt).with_iterations(iterations);
            Cipher::new(kdf.derive_key(password)).seal(plaintext)
        }
        SaltMode::PerEnvelopeRandom => {
            let kdf = KeyDerivation::random().with_iterations(iterations);
            let key = kdf.derive_key(password);
            Cipher::new(key).seal_with_salt(plaintext, kdf.salt())
        }
    }
}

/// Decrypt an envelope with a password.
///
/// An embedded salt takes precedence over `context_salt`, so tokens from
/// both salt modes decrypt through this one call.
pub fn open_with_password(
    token: &[u8],
    password: &str,
    context_salt: &[u8],
    iterations: u32,
) -> Result<Vec<u8>> {
    let envelope = Envelope::parse(token)?;
    let kdf = match envelope.salt {
        Some(salt) => KeyDerivation::from_salt(salt),
        None => KeyDerivation::from_salt(context_salt),
    }
    .with_iterations(iterations);

    Cipher::new(kdf.derive_key(password)).open_parsed(&envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ITERATIONS: u32 = 1000;
    const TEST_SALT: &[u8] = b"TEST_CONTEXT_SALT";

    fn test_cipher() -> Cipher {
        Cipher::new([7u8; 32])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let cipher = test_cipher();
        let plaintext = b"Hello, World! This is a secret message.";

        let token = cipher.seal(plaintext).unwrap();
        let decrypted = cipher.open(&token).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let token = test_cipher().seal(b"Secret data").unwrap();

        let other = Cipher::new([8u8; 32]);
        assert!(matches!(other.open(&token), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_different_seals_different_tokens() {
        let cipher = test_cipher();

        let token1 = cipher.seal(b"Same message").unwrap();
        let token2 = cipher.seal(b"Same message").unwrap();

        // Fresh nonce per envelope.
        assert_ne!(token1, token2);
    }

    #[test]
    fn test_empty_plaintext_is_minimum_size() {
        let cipher = test_cipher();

        let token = cipher.seal(b"").unwrap();
        assert_eq!(token.len(), MIN_ENVELOPE_SIZE);
        assert_eq!(cipher.open(&token).unwrap(), b"");
    }

    #[test]
    fn test_large_plaintext() {
        let cipher = test_cipher();
        let plaintext: Vec<u8> = (0..100_000).map(|i| (i % 256) as u8).collect();

        let token = cipher.seal(&plaintext).unwrap();
        assert_eq!(token.len(), plaintext.len() + MIN_ENVELOPE_SIZE);
        assert_eq!(cipher.open(&token).unwrap(), plaintext);
    }

    #[test]
    fn test_too_short_rejected() {
        let cipher = test_cipher();
        assert!(matches!(
            cipher.open(&[0u8; MIN_ENVELOPE_SIZE - 1]),
            Err(Error::Integrity(_))
        ));
    }

    #[test]
    fn test_foreign_bytes_rejected() {
        let cipher = test_cipher();
        let junk = vec![0x42u8; 100];
        assert!(matches!(cipher.open(&junk), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_version_bump_rejected() {
        let cipher = test_cipher();
        let mut token = cipher.seal(b"data").unwrap();
        token[4] = ENVELOPE_VERSION + 1;
        assert!(matches!(cipher.open(&token), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let cipher = test_cipher();
        let mut token = cipher.seal(b"data").unwrap();
        token[5] |= 0x80;
        assert!(matches!(cipher.open(&token), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_password_roundtrip_fixed_salt() {
        let token = seal_with_password(
            b"classified",
            "password123",
            TEST_SALT,
            TEST_ITERATIONS,
            SaltMode::FixedContext,
        )
        .unwrap();

        let plaintext =
            open_with_password(&token, "password123", TEST_SALT, TEST_ITERATIONS).unwrap();
        assert_eq!(plaintext, b"classified");
    }

    #[test]
    fn test_password_roundtrip_embedded_salt() {
        let token = seal_with_password(
            b"classified",
            "password123",
            TEST_SALT,
            TEST_ITERATIONS,
            SaltMode::PerEnvelopeRandom,
        )
        .unwrap();
        assert_eq!(token.len(), b"classified".len() + MIN_ENVELOPE_SIZE + 16);

        // The embedded salt wins, so the context salt is not needed.
        let plaintext =
            open_with_password(&token, "password123", b"unrelated", TEST_ITERATIONS).unwrap();
        assert_eq!(plaintext, b"classified");
    }

    #[test]
    fn test_wrong_password_fails() {
        let token = seal_with_password(
            b"classified",
            "correct_password",
            TEST_SALT,
            TEST_ITERATIONS,
            SaltMode::FixedContext,
        )
        .unwrap();

        assert!(matches!(
            open_with_password(&token, "wrong_password", TEST_SALT, TEST_ITERATIONS),
            Err(Error::Integrity(_))
        ));
    }

    #[test]
    fn test_tampered_tag_fails() {
        let cipher = test_cipher();
        let mut token = cipher.seal(b"Secret data").unwrap();
        if let Some(byte) = token.last_mut() {
            *byte ^= 0xFF;
        }
        assert!(matches!(cipher.open(&token), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_looks_like_envelope() {
        let token = test_cipher().seal(b"x").unwrap();
        assert!(Envelope::looks_like_envelope(&token));
        assert!(!Envelope::looks_like_envelope(b"SHRA\x01\x00"));
        assert!(!Envelope::looks_like_envelope(b""));
    }
}
