// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed credential store, run against the emulator.
//!
//! Start the emulator and set `FIRESTORE_EMULATOR_HOST` to run these;
//! otherwise they are skipped.

mod common;

use weather_tracker::db::password::compare_password;
use weather_tracker::db::{StoreError, UserStore};
use weather_tracker::models::{NewTrackedCity, ProfileUpdate};

/// Unique suffix so repeated runs against one emulator do not collide.
fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8])
}

fn city(id: &str, name: &str) -> NewTrackedCity {
    NewTrackedCity {
        id: id.to_string(),
        name: name.to_string(),
        lat: 39.7392,
        lon: -104.9903,
    }
}

#[tokio::test]
async fn test_create_and_find_user() {
    require_emulator!();
    let db = common::test_db().await;

    let username = unique("alice");
    let email = format!("{}@Example.com", username);
    let user = db.create_user(&email, "secret123", &username).await.unwrap();

    assert_eq!(user.email, email.to_lowercase());
    assert!(user.tracked_cities.is_empty());
    assert_ne!(user.password_hash, "secret123");
    assert!(compare_password(&user, "secret123").await);

    let by_id = db.find_by_id(&user.id).await.unwrap().expect("by id");
    assert_eq!(by_id.id, user.id);

    let by_email = db.find_by_email(&email.to_uppercase()).await.unwrap().expect("by email");
    assert_eq!(by_email.id, user.id);

    let by_username = db.find_by_username(&username).await.unwrap().expect("by username");
    assert_eq!(by_username.id, user.id);

    assert!(db.delete_user(&user.id).await.unwrap());
}

#[tokio::test]
async fn test_duplicates_are_rejected() {
    require_emulator!();
    let db = common::test_db().await;

    let username = unique("bob");
    let email = format!("{}@example.com", username);
    let user = db.create_user(&email, "secret123", &username).await.unwrap();

    let dup_email = db
        .create_user(&email, "secret123", &unique("other"))
        .await
        .unwrap_err();
    assert!(matches!(dup_email, StoreError::DuplicateEmail));

    let dup_username = db
        .create_user(&format!("{}@example.com", unique("other")), "secret123", &username)
        .await
        .unwrap_err();
    assert!(matches!(dup_username, StoreError::DuplicateUsername));

    assert!(db.delete_user(&user.id).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_registration_has_one_winner() {
    require_emulator!();
    let db = common::test_db().await;

    let username = unique("race");
    let email = format!("{}@example.com", username);

    let (a, b) = tokio::join!(
        db.create_user(&email, "secret123", &username),
        db.create_user(&email, "secret123", &username),
    );

    let winners: Vec<_> = [a, b].into_iter().filter_map(Result::ok).collect();
    assert_eq!(winners.len(), 1);

    assert!(db.delete_user(&winners[0].id).await.unwrap());
}

#[tokio::test]
async fn test_tracked_city_lifecycle() {
    require_emulator!();
    let db = common::test_db().await;

    let username = unique("carol");
    let user = db
        .create_user(&format!("{}@example.com", username), "secret123", &username)
        .await
        .unwrap();

    let cities = db
        .add_tracked_city(&user.id, city("denver", "Denver, Colorado"))
        .await
        .unwrap();
    assert_eq!(cities.len(), 1);
    assert!(!cities[0].added_at.is_empty());

    db.add_tracked_city(&user.id, city("boulder", "Boulder, Colorado"))
        .await
        .unwrap();

    let err = db
        .add_tracked_city(&user.id, city("denver", "Denver, Colorado"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::CityAlreadyTracked));

    let cities = db.get_tracked_cities(&user.id).await.unwrap();
    let ids: Vec<_> = cities.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["denver", "boulder"]);

    let cities = db.remove_tracked_city(&user.id, "denver").await.unwrap();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].id, "boulder");

    // Removing an absent id is a no-op.
    let cities = db.remove_tracked_city(&user.id, "denver").await.unwrap();
    assert_eq!(cities.len(), 1);

    assert!(db.delete_user(&user.id).await.unwrap());
}

#[tokio::test]
async fn test_tracked_cities_of_missing_user() {
    require_emulator!();
    let db = common::test_db().await;

    let err = db
        .add_tracked_city("no-such-user", city("denver", "Denver, Colorado"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UserNotFound));

    let err = db.get_tracked_cities("no-such-user").await.unwrap_err();
    assert!(matches!(err, StoreError::UserNotFound));
}

#[tokio::test]
async fn test_update_profile_moves_uniqueness_guards() {
    require_emulator!();
    let db = common::test_db().await;

    let old_name = unique("dave");
    let new_name = unique("david");
    let user = db
        .create_user(&format!("{}@example.com", old_name), "secret123", &old_name)
        .await
        .unwrap();

    let updated = db
        .update_profile(
            &user.id,
            ProfileUpdate {
                username: Some(new_name.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.username, new_name);

    assert!(db.find_by_username(&old_name).await.unwrap().is_none());
    assert_eq!(
        db.find_by_username(&new_name).await.unwrap().unwrap().id,
        user.id
    );

    // The old name is free again.
    let reuse = db
        .create_user(&format!("{}@example.com", unique("erin")), "secret123", &old_name)
        .await
        .unwrap();

    assert!(db.delete_user(&user.id).await.unwrap());
    assert!(db.delete_user(&reuse.id).await.unwrap());
    assert!(!db.delete_user(&user.id).await.unwrap());
}
