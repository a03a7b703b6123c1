//! Place-search results

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceResult {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    /// `null` when the provider does not know
    pub open_now: Option<bool>,
    /// Distance from the query point
    pub distance_km: Option<f64>,
    pub source: String,
}
