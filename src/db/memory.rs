// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory credential store.
//!
//! Mirrors the Firestore layout: one map of user documents plus two
//! uniqueness indexes (email → id, username → id). Each user entry is
//! mutated under its shard lock, so check-and-append on the tracked-city
//! list is atomic here.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::db::password::hash_and_store;
use crate::db::{StoreError, StoreResult, UserStore};
use crate::models::user::{normalize_email, normalize_username};
use crate::models::{NewTrackedCity, ProfileUpdate, TrackedCity, User};
use crate::time_utils::now_rfc3339;

/// In-memory user store.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    emails: DashMap<String, String>,
    usernames: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Reserve `key` in `index` for `user_id`, failing with `on_conflict` if taken.
    fn claim(
        index: &DashMap<String, String>,
        key: &str,
        user_id: &str,
        on_conflict: StoreError,
    ) -> StoreResult<()> {
        match index.entry(key.to_string()) {
            Entry::Occupied(_) => Err(on_conflict),
            Entry::Vacant(slot) => {
                slot.insert(user_id.to_string());
                Ok(())
            }
        }
    }

    fn lookup(&self, index: &DashMap<String, String>, key: &str) -> Option<User> {
        let user_id = index.get(key)?.value().clone();
        self.users.get(&user_id).map(|u| u.value().clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, email: &str, password: &str, username: &str) -> StoreResult<User> {
        let mut user = User::new(email, username);

        if self.emails.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if self.usernames.contains_key(&user.username) {
            return Err(StoreError::DuplicateUsername);
        }

        hash_and_store(&mut user, password).await?;

        // Another registration may have raced us while hashing.
        Self::claim(&self.emails, &user.email, &user.id, StoreError::DuplicateEmail)?;
        if let Err(e) = Self::claim(
            &self.usernames,
            &user.username,
            &user.id,
            StoreError::DuplicateUsername,
        ) {
            self.emails.remove(&user.email);
            return Err(e);
        }

        self.users.insert(user.id.clone(), user.clone());
        tracing::debug!(user_id = %user.id, "User created (memory)");
        Ok(user)
    }

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.lookup(&self.emails, &normalize_email(email)))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.lookup(&self.usernames, &normalize_username(username)))
    }

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> StoreResult<User> {
        let current = self
            .find_by_id(user_id)
            .await?
            .ok_or(StoreError::UserNotFound)?;

        let new_email = update
            .email
            .map(|e| normalize_email(&e))
            .filter(|e| *e != current.email);
        let new_username = update
            .username
            .map(|u| normalize_username(&u))
            .filter(|u| *u != current.username);

        if let Some(email) = &new_email {
            Self::claim(&self.emails, email, user_id, StoreError::DuplicateEmail)?;
        }
        if let Some(username) = &new_username {
            if let Err(e) = Self::claim(
                &self.usernames,
                username,
                user_id,
                StoreError::DuplicateUsername,
            ) {
                if let Some(email) = &new_email {
                    self.emails.remove(email);
                }
                return Err(e);
            }
        }

        let mut entry = self.users.get_mut(user_id).ok_or(StoreError::UserNotFound)?;
        if let Some(email) = new_email {
            self.emails.remove(&entry.email);
            entry.email = email;
        }
        if let Some(username) = new_username {
            self.usernames.remove(&entry.username);
            entry.username = username;
        }
        entry.updated_at = now_rfc3339();
        Ok(entry.value().clone())
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<bool> {
        match self.users.remove(user_id) {
            Some((_, user)) => {
                self.emails.remove(&user.email);
                self.usernames.remove(&user.username);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_tracked_city(
        &self,
        user_id: &str,
        city: NewTrackedCity,
    ) -> StoreResult<Vec<TrackedCity>> {
        let mut entry = self.users.get_mut(user_id).ok_or(StoreError::UserNotFound)?;
        entry.track_city(city)?;
        Ok(entry.tracked_cities.clone())
    }

    async fn remove_tracked_city(
        &self,
        user_id: &str,
        city_id: &str,
    ) -> StoreResult<Vec<TrackedCity>> {
        let mut entry = self.users.get_mut(user_id).ok_or(StoreError::UserNotFound)?;
        entry.untrack_city(city_id);
        Ok(entry.tracked_cities.clone())
    }

    async fn get_tracked_cities(&self, user_id: &str) -> StoreResult<Vec<TrackedCity>> {
        self.users
            .get(user_id)
            .map(|u| u.tracked_cities.clone())
            .ok_or(StoreError::UserNotFound)
    }
}
