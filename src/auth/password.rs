//! Argon2id password hashing.
//!
//! Hashes are stored in PHC string format:
//! `$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>` with unpadded base64.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use rand::RngCore;
use thiserror::Error;

use track_core::error::TrackError;

const MEMORY_KIB: u32 = 15360;
const ITERATIONS: u32 = 3;
const PARALLELISM: u32 = 2;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("stored password hash is malformed")]
    Malformed,

    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl From<PasswordError> for TrackError {
    fn from(err: PasswordError) -> Self {
        Self::internal(err.to_string())
    }
}

/// Hash a password with a fresh random salt.
///
/// # Errors
///
/// Returns `PasswordError::Hash` if the underlying KDF rejects the
/// parameters.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let mut out = [0u8; HASH_LEN];
    derive(password, &salt, MEMORY_KIB, ITERATIONS, PARALLELISM, &mut out)?;

    Ok(format!(
        "$argon2id$v=19$m={MEMORY_KIB},t={ITERATIONS},p={PARALLELISM}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(out)
    ))
}

/// Verify a password against a stored PHC-format hash.
///
/// The digest bytes are compared, not the serialized string, so any
/// PHC-legal parameter ordering in the stored hash verifies.
///
/// # Errors
///
/// Returns `PasswordError::Malformed` if the stored hash cannot be
/// parsed, or `PasswordError::Hash` on KDF failure.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = ParsedHash::parse(stored)?;
    let mut candidate = vec![0u8; parsed.hash.len()];
    derive(
        password,
        &parsed.salt,
        parsed.memory_kib,
        parsed.iterations,
        parsed.parallelism,
        &mut candidate,
    )?;
    Ok(fixed_time_eq(&candidate, &parsed.hash))
}

fn derive(
    password: &str,
    salt: &[u8],
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    out: &mut [u8],
) -> Result<(), PasswordError> {
    let params = Params::new(memory_kib, iterations, parallelism, Some(out.len()))
        .map_err(|err| PasswordError::Hash(err.to_string()))?;
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt, out)
        .map_err(|err| PasswordError::Hash(err.to_string()))
}

struct ParsedHash {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl ParsedHash {
    fn parse(stored: &str) -> Result<Self, PasswordError> {
        let mut parts = stored.split('$');
        // Leading '$' yields an empty first segment.
        if parts.next() != Some("") || parts.next() != Some("argon2id") {
            return Err(PasswordError::Malformed);
        }
        if parts.next() != Some("v=19") {
            return Err(PasswordError::Malformed);
        }

        let params = parts.next().ok_or(PasswordError::Malformed)?;
        let mut memory_kib = None;
        let mut iterations = None;
        let mut parallelism = None;
        for pair in params.split(',') {
            let (key, value) = pair.split_once('=').ok_or(PasswordError::Malformed)?;
            let value: u32 = value.parse().map_err(|_| PasswordError::Malformed)?;
            match key {
                "m" => memory_kib = Some(value),
                "t" => iterations = Some(value),
                "p" => parallelism = Some(value),
                _ => return Err(PasswordError::Malformed),
            }
        }

        let salt = parts.next().ok_or(PasswordError::Malformed)?;
        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| PasswordError::Malformed)?;
        let hash = parts.next().ok_or(PasswordError::Malformed)?;
        let hash = STANDARD_NO_PAD
            .decode(hash)
            .map_err(|_| PasswordError::Malformed)?;
        if parts.next().is_some() {
            return Err(PasswordError::Malformed);
        }

        Ok(Self {
            memory_kib: memory_kib.ok_or(PasswordError::Malformed)?,
            iterations: iterations.ok_or(PasswordError::Malformed)?,
            parallelism: parallelism.ok_or(PasswordError::Malformed)?,
            salt,
            hash,
        })
    }
}

fn fixed_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
