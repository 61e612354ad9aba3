//! Tracked city model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::models::Location;

/// A city on a user's dashboard. Embedded in the owning user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackedCity {
    /// Provider id or `"{lat}_{lon}"`; unique within one user's list only
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Set once on insertion
    pub added_at: String,
}

impl TrackedCity {
    pub fn location(&self) -> Location {
        Location {
            id: self.id.clone(),
            name: self.name.clone(),
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// A city as submitted by the client, before it is stamped and stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewTrackedCity {
    #[validate(length(min = 1, message = "City id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "City name is required"))]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}
