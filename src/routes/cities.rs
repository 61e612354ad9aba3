// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracked-city routes for the signed-in user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{NewTrackedCity, TrackedCity};
use crate::routes::extract::ValidatedJson;
use crate::services::TrackedWeather;
use crate::AppState;

/// User city routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user/cities", get(list_cities).post(add_city))
        .route(
            "/api/user/cities/weather",
            get(tracked_weather).delete(remove_weather_city),
        )
        .route("/api/user/cities/{city_id}", delete(remove_city))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackedCitiesResponse {
    pub tracked_cities: Vec<TrackedCity>,
    pub count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CityAddedResponse {
    pub message: String,
    pub city: NewTrackedCity,
    pub tracked_cities: Vec<TrackedCity>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CityRemovedResponse {
    pub message: String,
    pub tracked_cities: Vec<TrackedCity>,
}

async fn list_cities(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<TrackedCitiesResponse>> {
    let tracked_cities = state.tracker().list_cities(&auth.user.id).await?;

    Ok(Json(TrackedCitiesResponse {
        count: tracked_cities.len(),
        tracked_cities,
    }))
}

async fn add_city(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(city): ValidatedJson<NewTrackedCity>,
) -> Result<(StatusCode, Json<CityAddedResponse>)> {
    let tracked_cities = state
        .tracker()
        .add_city(&auth.user.id, city.clone())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CityAddedResponse {
            message: "City added successfully".to_string(),
            city,
            tracked_cities,
        }),
    ))
}

async fn remove_city(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(city_id): Path<String>,
) -> Result<Json<CityRemovedResponse>> {
    untrack(&state, &auth, &city_id).await
}

/// `/weather` is a static route, so a city whose id is literally
/// "weather" is removed here rather than through `{city_id}`.
async fn remove_weather_city(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<CityRemovedResponse>> {
    untrack(&state, &auth, "weather").await
}

async fn untrack(
    state: &AppState,
    auth: &AuthUser,
    city_id: &str,
) -> Result<Json<CityRemovedResponse>> {
    let tracked_cities = state.tracker().remove_city(&auth.user.id, city_id).await?;

    Ok(Json(CityRemovedResponse {
        message: "City removed successfully".to_string(),
        tracked_cities,
    }))
}

/// Weather for every tracked city, in tracking order.
async fn tracked_weather(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<TrackedWeather>> {
    Ok(Json(
        state
            .tracker()
            .weather_for_tracked_cities(&auth.user.id)
            .await?,
    ))
}
