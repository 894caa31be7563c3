//! One-way password verifiers.
//!
//! Verifier format: `sha256$<rounds>$<salt hex>$<digest hex>`. The salt is
//! 16 random bytes per password; the digest is SHA-256 iterated `rounds`
//! times over `previous || salt || password`. Rounds are stored in the
//! verifier, so changing the configured cost only affects new passwords.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("malformed password verifier")]
    Malformed,
}

/// Stored verifier string. Never contains the plaintext.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a verifier loaded from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    rounds: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROUNDS)
    }
}

impl PasswordHasher {
    pub const DEFAULT_ROUNDS: u32 = 100_000;

    pub fn new(rounds: u32) -> Self {
        Self { rounds: rounds.max(1) }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn hash(&self, password: &str) -> PasswordHash {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = derive(password.as_bytes(), &salt, self.rounds);
        PasswordHash(format!(
            "{SCHEME}${}${}${}",
            self.rounds,
            hex::encode(salt),
            hex::encode(digest)
        ))
    }

    /// Check `password` against a stored verifier.
    pub fn verify(&self, password: &str, stored: &PasswordHash) -> Result<bool, PasswordError> {
        let mut parts = stored.0.split('$');
        let (Some(scheme), Some(rounds), Some(salt), Some(digest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(PasswordError::Malformed);
        };
        if scheme != SCHEME {
            return Err(PasswordError::Malformed);
        }
        let rounds: u32 = rounds.parse().map_err(|_| PasswordError::Malformed)?;
        let salt = hex::decode(salt).map_err(|_| PasswordError::Malformed)?;
        let expected = hex::decode(digest).map_err(|_| PasswordError::Malformed)?;
        if rounds == 0 || expected.len() != 32 {
            return Err(PasswordError::Malformed);
        }

        let actual = derive(password.as_bytes(), &salt, rounds);
        Ok(constant_time_eq(&actual, &expected))
    }
}

fn derive(password: &[u8], salt: &[u8], rounds: u32) -> [u8; 32] {
    let mut out = [0u8; 32];
    for _ in 0..rounds {
        let mut hasher = Sha256::new();
        hasher.update(out);
        hasher.update(salt);
        hasher.update(password);
        out.copy_from_slice(&hasher.finalize());
    }
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
