// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user tracked cities and the weather fan-out across them.

use futures_util::{stream, StreamExt};
use serde::Serialize;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::{StoreError, UserStore};
use crate::error::AppError;
use crate::logging::audit;
use crate::models::{Location, NewTrackedCity, TrackedCity, WeatherSnapshot};
use crate::services::nws::NwsClient;

/// Weather for every city a user tracks, in tracking order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackedWeather {
    pub weather_data: Vec<WeatherSnapshot>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Fetch weather for every location at once.
///
/// Output order matches input order. A failed lookup becomes an
/// error-shaped snapshot for that location only.
pub async fn fetch_all(weather: &NwsClient, locations: Vec<Location>) -> Vec<WeatherSnapshot> {
    let in_flight = locations.len().max(1);
    stream::iter(locations)
        .map(|location| async move {
            match weather.get_weather_data(&location).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(location = %location.name, error = %e, "Weather lookup failed");
                    WeatherSnapshot::failed(location, e.to_string())
                }
            }
        })
        .buffered(in_flight)
        .collect()
        .await
}

/// Tracked-city operations for one request.
pub struct CityTracker<'a> {
    store: &'a dyn UserStore,
    weather: &'a NwsClient,
}

impl<'a> CityTracker<'a> {
    pub fn new(store: &'a dyn UserStore, weather: &'a NwsClient) -> Self {
        Self { store, weather }
    }

    /// Add a city to the user's list and return the updated list.
    pub async fn add_city(
        &self,
        user_id: &str,
        city: NewTrackedCity,
    ) -> Result<Vec<TrackedCity>, AppError> {
        city.validate()?;
        let city_id = city.id.clone();

        match self.store.add_tracked_city(user_id, city).await {
            Ok(cities) => {
                audit::city_added(user_id, &city_id);
                Ok(cities)
            }
            Err(e @ StoreError::CityAlreadyTracked) => Err(AppError::Conflict(e.to_string())),
            Err(e) => Err(AppError::operation("Failed to add city", e)),
        }
    }

    /// Remove a city by id. Removing an untracked id is not an error.
    pub async fn remove_city(
        &self,
        user_id: &str,
        city_id: &str,
    ) -> Result<Vec<TrackedCity>, AppError> {
        if city_id.trim().is_empty() {
            return Err(AppError::BadRequest("City ID is required".to_string()));
        }

        let cities = self
            .store
            .remove_tracked_city(user_id, city_id)
            .await
            .map_err(|e| AppError::operation("Failed to remove city", e))?;

        audit::city_removed(user_id, city_id);
        Ok(cities)
    }

    pub async fn list_cities(&self, user_id: &str) -> Result<Vec<TrackedCity>, AppError> {
        self.store
            .get_tracked_cities(user_id)
            .await
            .map_err(|e| AppError::operation("Failed to get tracked cities", e))
    }

    /// Weather for all tracked cities. No upstream calls when the list is empty.
    pub async fn weather_for_tracked_cities(
        &self,
        user_id: &str,
    ) -> Result<TrackedWeather, AppError> {
        let cities = self
            .store
            .get_tracked_cities(user_id)
            .await
            .map_err(|e| AppError::operation("Failed to get weather data", e))?;

        if cities.is_empty() {
            return Ok(TrackedWeather {
                weather_data: Vec::new(),
                count: 0,
                message: Some("No tracked cities found".to_string()),
            });
        }

        let locations = cities.iter().map(TrackedCity::location).collect();
        let weather_data = fetch_all(self.weather, locations).await;

        tracing::debug!(user_id, count = weather_data.len(), "Tracked-city weather assembled");
        Ok(TrackedWeather {
            count: weather_data.len(),
            weather_data,
            message: None,
        })
    }
}
