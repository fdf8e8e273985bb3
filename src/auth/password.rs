use bcrypt::{DEFAULT_COST, hash, verify};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

/// A malformed hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password.as_bytes(), hash).unwrap_or(false)
}

/// Only rejects empty and short passwords.
pub fn acceptable_password(password: &str) -> bool {
    !password.is_empty() && password.chars().count() >= MIN_PASSWORD_LEN
}
