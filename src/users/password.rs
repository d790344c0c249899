use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{Error, Result};

/// Hash a plaintext password with a per-call random salt. The plaintext is
/// never stored; an empty plaintext is rejected before hashing.
pub fn hash(plain: &str) -> Result<String> {
    if plain.is_empty() {
        return Err(Error::MissingPassword);
    }
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hashed = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash error");
            Error::PasswordHash(e.to_string())
        })?
        .to_string();
    Ok(hashed)
}

/// True iff the plaintext matches the stored hash. A mismatch is `Ok(false)`;
/// only a malformed stored hash is an error.
pub fn verify(plain: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        Error::PasswordHash(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
