//! PBKDF2-HMAC-SHA256 key derivation for password-based encryption.
//!
//! Derivation is deterministic: the same password, salt, and iteration
//! count always produce the same key, which is what keeps previously
//! written envelopes decryptable. Salts come from the caller: a
//! [`VaultConfig`](crate::config::VaultConfig) carries one fixed salt per
//! context (archive vs. generic file), and [`KeyDerivation::random`]
//! draws a fresh per-envelope salt.
//!
//! A fixed salt shared by every install means an attacker can precompute
//! keys for common passwords once and reuse them everywhere. Prefer
//! [`SaltMode::PerEnvelopeRandom`](crate::config::SaltMode) where
//! cross-install compatibility is not required.

use crate::config::kdf_params;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

/// Key derivation using PBKDF2-HMAC-SHA256.
#[derive(Debug, Clone)]
pub struct KeyDerivation {
    salt: Vec<u8>,
    iterations: u32,
}

impl KeyDerivation {
    /// Create a KDF bound to an existing salt (fixed context salt, or a
    /// salt recovered from an envelope header).
    pub fn from_salt(salt: &[u8]) -> Self {
        Self {
            salt: salt.to_vec(),
            iterations: kdf_params::ITERATIONS,
        }
    }

    /// Create a KDF with a fresh random 16-byte salt.
    pub fn random() -> Self {
        let mut salt = vec![0u8; kdf_params::RANDOM_SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        Self {
            salt,
            iterations: kdf_params::ITERATIONS,
        }
    }

    /// Override the iteration count (defaults to
    /// [`kdf_params::ITERATIONS`]).
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Get the salt for storage.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Derive a 256-bit key from a password.
    pub fn derive_key(&self, password: &str) -> [u8; kdf_params::OUTPUT_LENGTH] {
        let mut key = [0u8; kdf_params::OUTPUT_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &self.salt, self.iterations, &mut key);
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low iteration count so the suite stays fast; production uses 100k.
    const TEST_ITERATIONS: u32 = 1000;

    #[test]
    fn test_key_derivation_deterministic() {
        let kdf = KeyDerivation::from_salt(b"salt-one").with_iterations(TEST_ITERATIONS);

        let key1 = kdf.derive_key("password123");
        let key2 = kdf.derive_key("password123");

        assert_eq!(key1, key2);
    }

    #[test]
    fn test_different_passwords_different_keys() {
        let kdf = KeyDerivation::from_salt(b"salt-two").with_iterations(TEST_ITERATIONS);

        let key1 = kdf.derive_key("password1");
        let key2 = kdf.derive_key("password2");

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_different_salts_different_keys() {
        let kdf1 = KeyDerivation::from_salt(b"salt-one").with_iterations(TEST_ITERATIONS);
        let kdf2 = KeyDerivation::from_salt(b"salt-two").with_iterations(TEST_ITERATIONS);

        let key1 = kdf1.derive_key("password");
        let key2 = kdf2.derive_key("password");

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_different_iterations_different_keys() {
        let kdf1 = KeyDerivation::from_salt(b"salt").with_iterations(1000);
        let kdf2 = KeyDerivation::from_salt(b"salt").with_iterations(1001);

        assert_ne!(kdf1.derive_key("password"), kdf2.derive_key("password"));
    }

    #[test]
    fn test_random_generates_distinct_salts() {
        let kdf1 = KeyDerivation::random();
        let kdf2 = KeyDerivation::random();

        assert_eq!(kdf1.salt().len(), kdf_params::RANDOM_SALT_LENGTH);
        assert_ne!(kdf1.salt(), kdf2.salt());
    }

    #[test]
    fn test_fixed_context_salt_yields_identical_keys_everywhere() {
        // Two independent derivations from the shared archive salt agree.
        // That is the compatibility property, and also exactly why a fixed
        // salt lets an attacker precompute keys for common passwords.
        let kdf1 =
            KeyDerivation::from_salt(kdf_params::ARCHIVE_SALT).with_iterations(TEST_ITERATIONS);
        let kdf2 =
            KeyDerivation::from_salt(kdf_params::ARCHIVE_SALT).with_iterations(TEST_ITERATIONS);

        assert_eq!(kdf1.derive_key("hunter2"), kdf2.derive_key("hunter2"));
    }

    #[test]
    fn test_context_salts_are_distinct() {
        let archive = KeyDerivation::from_salt(kdf_params::ARCHIVE_SALT)
            .with_iterations(TEST_ITERATIONS)
            .derive_key("password");
        let file = KeyDerivation::from_salt(kdf_params::FILE_SALT)
            .with_iterations(TEST_ITERATIONS)
            .derive_key("password");

        assert_ne!(archive, file);
    }
}
