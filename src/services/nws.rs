// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! National Weather Service API client.
//!
//! A lookup is a chain of requests:
//! 1. `/points/{lat},{lon}` for the forecast and station-list URLs
//! 2. the forecast URL for the forecast periods
//! 3. the station-list URL, taking the first station
//! 4. `/stations/{id}/observations/latest` for current conditions
//!
//! Steps 1 and 2 are required. Steps 3 and 4 are best effort; if either
//! fails the snapshot is returned without current conditions.

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;
use crate::models::{CurrentConditions, ForecastPeriod, Location, WeatherSnapshot};
use crate::time_utils::now_rfc3339;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DESCRIPTION: &str = "No description available";

const KMH_TO_MPH: f64 = 0.621371;
const METERS_TO_MILES: f64 = 0.000621371;
const PASCALS_TO_INHG: f64 = 0.0002953;

// ─── NWS Response Types ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsProperties {
    forecast: String,
    observation_stations: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
struct StationsResponse {
    #[serde(default)]
    features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
struct StationFeature {
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationProperties {
    station_identifier: String,
}

#[derive(Debug, Deserialize)]
struct ObservationResponse {
    properties: Observation,
}

/// A quantitative value; NWS reports `null` for missing sensor data.
#[derive(Debug, Default, Deserialize)]
struct Measurement {
    value: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Observation {
    timestamp: String,
    text_description: Option<String>,
    icon: Option<String>,
    temperature: Measurement,
    relative_humidity: Measurement,
    wind_speed: Measurement,
    wind_direction: Measurement,
    visibility: Measurement,
    barometric_pressure: Measurement,
}

// ─── Unit Conversions ────────────────────────────────────────

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Nearest whole number, halves toward positive infinity.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// °C to whole °F. A missing reading is reported as 0.
pub fn celsius_to_fahrenheit(celsius: Option<f64>) -> i64 {
    celsius
        .map(|c| round_half_up(c * 9.0 / 5.0 + 32.0))
        .unwrap_or(0)
}

/// km/h to whole mph. A missing reading is reported as 0.
pub fn kmh_to_mph(kmh: Option<f64>) -> i64 {
    kmh.map(|v| round_half_up(v * KMH_TO_MPH)).unwrap_or(0)
}

/// Meters to miles, one decimal place.
pub fn meters_to_miles(meters: Option<f64>) -> f64 {
    meters
        .map(|v| round_to(v * METERS_TO_MILES, 1))
        .unwrap_or(0.0)
}

/// Pascals to inches of mercury, two decimal places.
pub fn pascals_to_inhg(pascals: Option<f64>) -> f64 {
    pascals
        .map(|v| round_to(v * PASCALS_TO_INHG, 2))
        .unwrap_or(0.0)
}

impl From<Observation> for CurrentConditions {
    fn from(obs: Observation) -> Self {
        Self {
            temperature: celsius_to_fahrenheit(obs.temperature.value),
            temperature_unit: "F".to_string(),
            description: obs
                .text_description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            icon: obs.icon.unwrap_or_default(),
            humidity: obs.relative_humidity.value.unwrap_or(0.0),
            wind_speed: kmh_to_mph(obs.wind_speed.value),
            wind_direction: obs.wind_direction.value.unwrap_or(0.0),
            visibility: meters_to_miles(obs.visibility.value),
            pressure: pascals_to_inhg(obs.barometric_pressure.value),
            timestamp: obs.timestamp,
        }
    }
}

// ─── Client ──────────────────────────────────────────────────

/// Client for api.weather.gov.
#[derive(Clone)]
pub struct NwsClient {
    http: reqwest::Client,
    base_url: String,
}

impl NwsClient {
    /// `contact` goes into the User-Agent, which NWS requires.
    pub fn new(base_url: &str, contact: &str) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(format!("(WeatherTracker, {})", contact))
            .default_headers(headers)
            .build()
            .context("Failed to build NWS HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// NWS hands back absolute URLs; anything else is relative to the base.
    fn resolve(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!("{}{}", self.base_url, path_or_url)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path_or_url: &str) -> anyhow::Result<T> {
        let url = self.resolve(path_or_url);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {}", status.as_u16());
        }

        Ok(response.json().await?)
    }

    /// Fetch forecast and (if available) current conditions for a location.
    pub async fn get_weather_data(&self, location: &Location) -> Result<WeatherSnapshot, AppError> {
        tracing::debug!(location = %location.name, "Fetching weather data");

        let points: PointsResponse = self
            .get_json(&format!("/points/{:.4},{:.4}", location.lat, location.lon))
            .await
            .map_err(|e| Self::fetch_failed(location, e))?;

        let forecast: ForecastResponse = self
            .get_json(&points.properties.forecast)
            .await
            .map_err(|e| Self::fetch_failed(location, e))?;

        let current = match self
            .current_conditions(&points.properties.observation_stations)
            .await
        {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!(
                    location = %location.name,
                    error = %e,
                    "Could not fetch current observations"
                );
                None
            }
        };

        Ok(WeatherSnapshot {
            location: location.clone(),
            current,
            forecast: forecast.properties.periods,
            last_updated: now_rfc3339(),
            error: None,
        })
    }

    async fn current_conditions(&self, stations_url: &str) -> anyhow::Result<Option<CurrentConditions>> {
        let stations: StationsResponse = self.get_json(stations_url).await?;

        let Some(station) = stations.features.into_iter().next() else {
            return Ok(None);
        };

        let observation: ObservationResponse = self
            .get_json(&format!(
                "/stations/{}/observations/latest",
                station.properties.station_identifier
            ))
            .await?;

        Ok(Some(observation.properties.into()))
    }

    fn fetch_failed(location: &Location, cause: anyhow::Error) -> AppError {
        tracing::error!(location = %location.name, error = %cause, "Error fetching weather data");
        AppError::Upstream(format!("Failed to fetch weather data: {}", cause))
    }
}
