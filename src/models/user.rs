//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::StoreError;
use crate::models::{NewTrackedCity, TrackedCity};
use crate::time_utils::now_rfc3339;

/// User document stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned id (also used as document ID)
    pub id: String,
    /// Lower-cased, trimmed email address (unique)
    pub email: String,
    /// Trimmed username (unique)
    pub username: String,
    /// bcrypt hash; never leaves the server
    pub password_hash: String,
    /// Tracked cities in the order they were added
    #[serde(default)]
    pub tracked_cities: Vec<TrackedCity>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// A fresh user with no password set and no tracked cities.
    pub fn new(email: &str, username: &str) -> Self {
        let now = now_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            username: normalize_username(username),
            password_hash: String::new(),
            tracked_cities: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_tracking(&self, city_id: &str) -> bool {
        self.tracked_cities.iter().any(|c| c.id == city_id)
    }

    /// Append a city, stamping `added_at`. Rejects an id that is already tracked.
    pub fn track_city(&mut self, city: NewTrackedCity) -> Result<&TrackedCity, StoreError> {
        if self.is_tracking(&city.id) {
            return Err(StoreError::CityAlreadyTracked);
        }
        let now = now_rfc3339();
        self.tracked_cities.push(TrackedCity {
            id: city.id,
            name: city.name,
            lat: city.lat,
            lon: city.lon,
            added_at: now.clone(),
        });
        self.updated_at = now;
        Ok(&self.tracked_cities[self.tracked_cities.len() - 1])
    }

    /// Drop a city by id. Returns whether anything was removed.
    pub fn untrack_city(&mut self, city_id: &str) -> bool {
        let before = self.tracked_cities.len();
        self.tracked_cities.retain(|c| c.id != city_id);
        let removed = self.tracked_cities.len() != before;
        if removed {
            self.updated_at = now_rfc3339();
        }
        removed
    }
}

/// Emails compare case-insensitively; store them lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_string()
}

/// Profile fields a user may change after registration.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
}

/// User as returned by the API (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub tracked_cities: Vec<TrackedCity>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            tracked_cities: user.tracked_cities,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
