//! Credential store: user records and their tracked cities.
//!
//! [`UserStore`] is implemented by [`FirestoreDb`] for deployments and by
//! [`MemoryStore`] for tests and local development.

pub mod firestore;
pub mod memory;
pub mod password;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::models::{NewTrackedCity, ProfileUpdate, TrackedCity, User};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Uniqueness guards keyed by normalized email
    pub const USER_EMAILS: &str = "user_emails";
    /// Uniqueness guards keyed by username
    pub const USER_USERNAMES: &str = "user_usernames";
}

/// Credential store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("User not found")]
    UserNotFound,

    #[error("City already tracked")]
    CityAlreadyTracked,

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Database error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for users and their embedded tracked-city lists.
///
/// Email and username are unique across all users. Implementations must
/// report a lost uniqueness race with the same `Duplicate*` error as the
/// up-front check.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user with a hashed password and no tracked cities.
    async fn create_user(&self, email: &str, password: &str, username: &str) -> StoreResult<User>;

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>>;

    /// Lookup is case-insensitive.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Change email and/or username, keeping both unique.
    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> StoreResult<User>;

    /// Returns `false` if the user did not exist.
    async fn delete_user(&self, user_id: &str) -> StoreResult<bool>;

    /// Append a city and return the updated list.
    async fn add_tracked_city(
        &self,
        user_id: &str,
        city: NewTrackedCity,
    ) -> StoreResult<Vec<TrackedCity>>;

    /// Remove a city by id and return the updated list. Absent ids are a no-op.
    async fn remove_tracked_city(&self, user_id: &str, city_id: &str)
        -> StoreResult<Vec<TrackedCity>>;

    async fn get_tracked_cities(&self, user_id: &str) -> StoreResult<Vec<TrackedCity>>;
}
