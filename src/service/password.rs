use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString},
};
use rand::rngs::OsRng;

use crate::error::OpenpackError;

/// Hash a plaintext password into an Argon2id PHC string.
pub fn hash_password(plaintext: &str) -> Result<String, OpenpackError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| OpenpackError::PasswordHash(e.to_string()))
}
