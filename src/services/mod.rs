// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - upstream providers and tracked-city logic.

pub mod geocoding;
pub mod nws;
pub mod tracker;

pub use geocoding::GeocodingClient;
pub use nws::NwsClient;
pub use tracker::{CityTracker, TrackedWeather};
