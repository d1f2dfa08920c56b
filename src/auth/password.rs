//! bcrypt hashing, run on the blocking pool so request workers stay free.

use thiserror::Error;

/// bcrypt only reads this many bytes of input; anything past it is ignored
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password is longer than {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }

    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// `Ok(false)` for a wrong password; `Err` only when the hash is unusable.
///
/// Overlong input still runs a full verify, then never matches.
pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    let too_long = password.len() > MAX_PASSWORD_BYTES;
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matches && !too_long)
}
