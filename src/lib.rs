// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Weather-Tracker: current conditions and forecasts for the cities you follow
//!
//! This crate provides the backend API: user accounts with cookie sessions,
//! a per-user tracked-city list, and a proxy over the National Weather
//! Service and Nominatim geocoding APIs.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::UserStore;
use error::AppError;
use middleware::SessionKeys;
use services::{CityTracker, GeocodingClient, NwsClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UserStore>,
    pub sessions: SessionKeys,
    pub weather: NwsClient,
    pub geocoding: GeocodingClient,
}

impl AppState {
    /// Build the upstream clients and session keys from `config`.
    pub fn new(config: Config, store: Arc<dyn UserStore>) -> Result<Self, AppError> {
        let weather = NwsClient::new(&config.nws_base_url, &config.nws_user_agent)?;
        let geocoding = GeocodingClient::new(&config.geocoding_base_url)?;
        let sessions = SessionKeys::from_config(&config);

        Ok(Self {
            config,
            store,
            sessions,
            weather,
            geocoding,
        })
    }

    /// Tracked-city operations backed by this state's store and weather client.
    pub fn tracker(&self) -> CityTracker<'_> {
        CityTracker::new(self.store.as_ref(), &self.weather)
    }
}
