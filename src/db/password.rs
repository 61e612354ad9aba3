//! Password hashing.
//!
//! Hashing is an explicit step the store calls while creating a user, so
//! the plaintext never reaches the persistence layer.

use crate::db::{StoreError, StoreResult};
use crate::models::User;

/// bcrypt cost factor
pub const BCRYPT_COST: u32 = 10;

/// Hash `plaintext` and store the hash on `user`.
///
/// bcrypt is CPU-bound, so the work runs on the blocking pool.
pub async fn hash_and_store(user: &mut User, plaintext: &str) -> StoreResult<()> {
    let plaintext = plaintext.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, BCRYPT_COST))
        .await
        .map_err(|e| StoreError::Backend(format!("hashing task failed: {}", e)))??;
    user.password_hash = hash;
    Ok(())
}

/// Check a candidate password against the user's stored hash.
///
/// A malformed stored hash counts as a mismatch.
pub async fn compare_password(user: &User, candidate: &str) -> bool {
    let hash = user.password_hash.clone();
    let candidate = candidate.to_string();
    let result = tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &hash)).await;

    match result {
        Ok(Ok(matches)) => matches,
        Ok(Err(e)) => {
            tracing::warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
            false
        }
        Err(e) => {
            tracing::error!(error = %e, "Password verification task failed");
            false
        }
    }
}
