// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed credential store.
//!
//! Layout:
//! - `users/{id}`: the full user document, tracked cities embedded
//! - `user_emails/{email}` and `user_usernames/{username}`: uniqueness
//!   guards holding the owning user id
//!
//! Firestore has no unique indexes, so uniqueness comes from creating the
//! guard documents with `insert`, which fails if the document exists.
//! Tracked-city changes are a read-modify-write of the whole user
//! document; two concurrent adds of the same city can both pass the
//! duplicate check (last write wins).

use async_trait::async_trait;
use firestore::errors::FirestoreError;
use serde::{Deserialize, Serialize};

use crate::db::password::hash_and_store;
use crate::db::{collections, StoreError, StoreResult, UserStore};
use crate::models::user::{normalize_email, normalize_username};
use crate::models::{NewTrackedCity, ProfileUpdate, TrackedCity, User};
use crate::time_utils::now_rfc3339;

/// Guard document claiming a unique key for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UniqueKey {
    user_id: String,
}

/// Document ids may not contain `/`, be `.` or `..`, or match `__.*__`.
/// Percent-encode the key and give it a fixed prefix.
fn guard_id(key: &str) -> String {
    format!("k:{}", urlencoding::encode(key))
}

fn backend(e: FirestoreError) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, database_id: &str) -> StoreResult<Self> {
        let options = firestore::FirestoreDbOptions::new(project_id.to_string())
            .with_database_id(database_id.to_string());

        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(options).await;
        }

        let client = firestore::FirestoreDb::with_options(options)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(
            project = project_id,
            database = database_id,
            "Connected to Firestore"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(options: firestore::FirestoreDbOptions) -> StoreResult<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Backend(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!("Connected to Firestore (Emulator/Unauthenticated)");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> StoreResult<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError::Backend("Database not connected (offline mode)".to_string()))
    }

    // ─── Documents ───────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(backend)
    }

    /// Write the whole user document.
    async fn put_user(&self, user: &User) -> StoreResult<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, doc_id: &str) -> StoreResult<()> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(doc_id)
            .execute()
            .await
            .map_err(backend)?;
        Ok(())
    }

    // ─── Uniqueness Guards ───────────────────────────────────────

    /// Create the guard document for `key`, or fail with `on_conflict` if it exists.
    async fn claim(
        &self,
        collection: &str,
        key: &str,
        user_id: &str,
        on_conflict: StoreError,
    ) -> StoreResult<()> {
        let guard = UniqueKey {
            user_id: user_id.to_string(),
        };

        let inserted: Result<UniqueKey, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(guard_id(key))
            .object(&guard)
            .execute()
            .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => Err(on_conflict),
            Err(e) => Err(backend(e)),
        }
    }

    /// Best-effort removal of a guard; failures are logged, not returned.
    async fn release(&self, collection: &str, key: &str) {
        if let Err(e) = self.delete_doc(collection, &guard_id(key)).await {
            tracing::error!(collection, error = %e, "Failed to release uniqueness guard");
        }
    }

    async fn lookup(&self, collection: &str, key: &str) -> StoreResult<Option<User>> {
        let guard: Option<UniqueKey> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(&guard_id(key))
            .await
            .map_err(backend)?;

        match guard {
            Some(guard) => self.get_user(&guard.user_id).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn create_user(&self, email: &str, password: &str, username: &str) -> StoreResult<User> {
        let mut user = User::new(email, username);

        // Checked up front so the caller gets the right message without
        // paying for a password hash.
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(StoreError::DuplicateEmail);
        }
        if self.find_by_username(&user.username).await?.is_some() {
            return Err(StoreError::DuplicateUsername);
        }

        hash_and_store(&mut user, password).await?;

        self.claim(
            collections::USER_EMAILS,
            &user.email,
            &user.id,
            StoreError::DuplicateEmail,
        )
        .await?;

        if let Err(e) = self
            .claim(
                collections::USER_USERNAMES,
                &user.username,
                &user.id,
                StoreError::DuplicateUsername,
            )
            .await
        {
            self.release(collections::USER_EMAILS, &user.email).await;
            return Err(e);
        }

        if let Err(e) = self.put_user(&user).await {
            self.release(collections::USER_EMAILS, &user.email).await;
            self.release(collections::USER_USERNAMES, &user.username)
                .await;
            return Err(e);
        }

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.get_user(user_id).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.lookup(collections::USER_EMAILS, &normalize_email(email))
            .await
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.lookup(collections::USER_USERNAMES, &normalize_username(username))
            .await
    }

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> StoreResult<User> {
        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or(StoreError::UserNotFound)?;

        let new_email = update
            .email
            .map(|e| normalize_email(&e))
            .filter(|e| *e != user.email);
        let new_username = update
            .username
            .map(|u| normalize_username(&u))
            .filter(|u| *u != user.username);

        if let Some(email) = &new_email {
            self.claim(
                collections::USER_EMAILS,
                email,
                user_id,
                StoreError::DuplicateEmail,
            )
            .await?;
        }
        if let Some(username) = &new_username {
            if let Err(e) = self
                .claim(
                    collections::USER_USERNAMES,
                    username,
                    user_id,
                    StoreError::DuplicateUsername,
                )
                .await
            {
                if let Some(email) = &new_email {
                    self.release(collections::USER_EMAILS, email).await;
                }
                return Err(e);
            }
        }

        let old_email = new_email
            .as_ref()
            .map(|email| std::mem::replace(&mut user.email, email.clone()));
        let old_username = new_username
            .as_ref()
            .map(|username| std::mem::replace(&mut user.username, username.clone()));
        user.updated_at = now_rfc3339();
        self.put_user(&user).await?;

        if let Some(email) = old_email {
            self.release(collections::USER_EMAILS, &email).await;
        }
        if let Some(username) = old_username {
            self.release(collections::USER_USERNAMES, &username).await;
        }

        Ok(user)
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<bool> {
        let Some(user) = self.get_user(user_id).await? else {
            return Ok(false);
        };

        self.delete_doc(collections::USERS, user_id).await?;
        self.release(collections::USER_EMAILS, &user.email).await;
        self.release(collections::USER_USERNAMES, &user.username)
            .await;

        tracing::info!(user_id, "User deleted");
        Ok(true)
    }

    async fn add_tracked_city(
        &self,
        user_id: &str,
        city: NewTrackedCity,
    ) -> StoreResult<Vec<TrackedCity>> {
        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or(StoreError::UserNotFound)?;

        user.track_city(city)?;
        self.put_user(&user).await?;
        Ok(user.tracked_cities)
    }

    async fn remove_tracked_city(
        &self,
        user_id: &str,
        city_id: &str,
    ) -> StoreResult<Vec<TrackedCity>> {
        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or(StoreError::UserNotFound)?;

        if user.untrack_city(city_id) {
            self.put_user(&user).await?;
        }
        Ok(user.tracked_cities)
    }

    async fn get_tracked_cities(&self, user_id: &str) -> StoreResult<Vec<TrackedCity>> {
        self.get_user(user_id)
            .await?
            .map(|u| u.tracked_cities)
            .ok_or(StoreError::UserNotFound)
    }
}
