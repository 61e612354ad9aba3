// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public weather and location search routes.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::MaybeUser;
use crate::models::{Location, LocationResult, WeatherSnapshot};
use crate::routes::extract::ValidatedJson;
use crate::services::tracker::fetch_all;
use crate::AppState;

/// Weather routes. `optional_auth` is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/weather", get(get_weather))
        .route("/api/weather/multiple", post(get_multiple_weather))
        .route("/api/search", get(search_locations))
}

fn caller_id(caller: &MaybeUser) -> Option<&str> {
    caller.0.as_ref().map(|u| u.id.as_str())
}

/// Parse a finite coordinate.
fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// ─── Single Location ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    lat: Option<String>,
    lon: Option<String>,
    name: Option<String>,
}

/// Weather for one point.
async fn get_weather(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<MaybeUser>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherSnapshot>> {
    let (Some(lat), Some(lon)) = (
        query.lat.filter(|s| !s.trim().is_empty()),
        query.lon.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Missing required parameters: lat and lon".to_string(),
        ));
    };

    let (Some(lat), Some(lon)) = (parse_coordinate(&lat), parse_coordinate(&lon)) else {
        return Err(AppError::BadRequest("Invalid coordinates".to_string()));
    };

    let location = Location::from_coordinates(lat, lon, None, query.name);
    tracing::debug!(user_id = caller_id(&caller), location = %location.id, "Weather lookup");

    let snapshot = state.weather.get_weather_data(&location).await?;
    Ok(Json(snapshot))
}

// ─── Multiple Locations ──────────────────────────────────────

/// A coordinate sent either as a JSON number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Number(v) => Some(*v).filter(|v| v.is_finite()),
            Coordinate::Text(s) => parse_coordinate(s),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LocationInput {
    id: Option<String>,
    name: Option<String>,
    lat: Option<Coordinate>,
    lon: Option<Coordinate>,
}

#[derive(Debug, Deserialize, Validate)]
struct MultipleWeatherRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "locations must be a non-empty array"))]
    locations: Vec<LocationInput>,
}

/// Weather for several points, each looked up independently.
async fn get_multiple_weather(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<MaybeUser>,
    ValidatedJson(req): ValidatedJson<MultipleWeatherRequest>,
) -> Result<Json<Vec<WeatherSnapshot>>> {
    let locations = req
        .locations
        .into_iter()
        .map(|input| {
            let lat = input.lat.as_ref().and_then(Coordinate::value);
            let lon = input.lon.as_ref().and_then(Coordinate::value);
            match (lat, lon) {
                (Some(lat), Some(lon)) => {
                    Ok(Location::from_coordinates(lat, lon, input.id, input.name))
                }
                _ => Err(AppError::BadRequest(
                    "Each location must have lat and lon properties".to_string(),
                )),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        user_id = caller_id(&caller),
        count = locations.len(),
        "Multi-location weather lookup"
    );

    Ok(Json(fetch_all(&state.weather, locations).await))
}

// ─── Search ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchQuery {
    query: Option<String>,
}

/// Search US locations by name.
async fn search_locations(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<MaybeUser>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<LocationResult>>> {
    let Some(query) = params.query.filter(|q| !q.trim().is_empty()) else {
        return Err(AppError::BadRequest(
            "Missing or invalid query parameter".to_string(),
        ));
    };

    tracing::debug!(user_id = caller_id(&caller), query = %query, "Location search");
    Ok(Json(state.geocoding.search(&query).await?))
}
