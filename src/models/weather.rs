// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather and location types shared by the NWS adapter and the API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::now_rfc3339;

/// A point on the map with a display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    /// Build a location from bare coordinates, deriving id and (if absent) name.
    pub fn from_coordinates(lat: f64, lon: f64, id: Option<String>, name: Option<String>) -> Self {
        Self {
            id: id
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("{}_{}", lat, lon)),
            name: name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("{}, {}", lat, lon)),
            lat,
            lon,
        }
    }
}

/// Latest observation, normalized to US units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurrentConditions {
    /// Degrees Fahrenheit
    pub temperature: i64,
    pub temperature_unit: String,
    pub description: String,
    pub icon: String,
    /// Relative humidity, percent
    pub humidity: f64,
    /// Miles per hour
    pub wind_speed: i64,
    /// Degrees from north
    pub wind_direction: f64,
    /// Miles, one decimal
    pub visibility: f64,
    /// Inches of mercury, two decimals
    pub pressure: f64,
    pub timestamp: String,
}

/// One NWS forecast period, passed through as delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ForecastPeriod {
    pub number: u32,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub is_daytime: bool,
    pub temperature: i64,
    pub temperature_unit: String,
    pub temperature_trend: Option<String>,
    pub wind_speed: String,
    pub wind_direction: String,
    pub icon: String,
    pub short_forecast: String,
    pub detailed_forecast: String,
}

/// Assembled weather for one location.
///
/// When `error` is set, `current` is `None` and `forecast` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub current: Option<CurrentConditions>,
    pub forecast: Vec<ForecastPeriod>,
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeatherSnapshot {
    /// Placeholder for a location whose lookup failed.
    pub fn failed(location: Location, error: impl Into<String>) -> Self {
        Self {
            location,
            current: None,
            forecast: Vec::new(),
            last_updated: now_rfc3339(),
            error: Some(error.into()),
        }
    }
}

/// A geocoding candidate as returned by `/api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LocationResult {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}
