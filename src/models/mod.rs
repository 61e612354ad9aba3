// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod city;
pub mod user;
pub mod weather;

pub use city::{NewTrackedCity, TrackedCity};
pub use user::{ProfileUpdate, PublicUser, User};
pub use weather::{CurrentConditions, ForecastPeriod, Location, LocationResult, WeatherSnapshot};
