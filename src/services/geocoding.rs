// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Forward geocoding via Nominatim (OpenStreetMap).
//!
//! Results are restricted to the US because only NWS can forecast them.

use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;
use crate::models::LocationResult;

const REQUEST_TIMEOUT_SECS: u64 = 5;
const USER_AGENT: &str = "WeatherTracker/1.0";
const RESULT_LIMIT: &str = "5";

/// One Nominatim search hit. Coordinates arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResult {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    #[serde(default)]
    pub address: GeocodingAddress,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodingAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
}

/// `"{city}, {state}"`, falling back to whichever is present, then the full display name.
pub fn format_location_name(result: &GeocodingResult) -> String {
    let addr = &result.address;
    let city = [&addr.city, &addr.town, &addr.village]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty());
    let state = addr.state.as_ref().filter(|s| !s.is_empty());

    match (city, state) {
        (Some(city), Some(state)) => format!("{}, {}", city, state),
        (Some(city), None) => city.clone(),
        (None, Some(state)) => state.clone(),
        (None, None) => result.display_name.clone(),
    }
}

impl LocationResult {
    /// Convert a search hit. The id keeps the provider's coordinate strings.
    ///
    /// Returns `None` if the coordinates do not parse.
    pub fn from_geocoding(result: &GeocodingResult) -> Option<Self> {
        let lat: f64 = result.lat.trim().parse().ok()?;
        let lon: f64 = result.lon.trim().parse().ok()?;

        Some(Self {
            id: format!("{}_{}", result.lat, result.lon),
            name: format_location_name(result),
            lat,
            lon,
            display_name: result.display_name.clone(),
        })
    }
}

/// Client for the Nominatim search endpoint.
#[derive(Clone)]
pub struct GeocodingClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build geocoding HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search for up to five US locations matching `query`.
    ///
    /// A blank query returns no results without calling the provider.
    pub async fn search_location(&self, query: &str) -> Result<Vec<GeocodingResult>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.fetch(query).await.map_err(|e| {
            tracing::error!(query, error = %e, "Error searching location");
            AppError::Upstream("Failed to search location".to_string())
        })
    }

    /// Search and convert to API results, dropping hits with unusable coordinates.
    pub async fn search(&self, query: &str) -> Result<Vec<LocationResult>, AppError> {
        let results = self.search_location(query).await?;

        Ok(results
            .iter()
            .filter_map(|r| {
                let converted = LocationResult::from_geocoding(r);
                if converted.is_none() {
                    tracing::debug!(lat = %r.lat, lon = %r.lon, "Skipping result with bad coordinates");
                }
                converted
            })
            .collect())
    }

    async fn fetch(&self, query: &str) -> anyhow::Result<Vec<GeocodingResult>> {
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("countrycodes", "us"),
                ("limit", RESULT_LIMIT),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {}", status.as_u16());
        }

        Ok(response.json().await?)
    }
}
