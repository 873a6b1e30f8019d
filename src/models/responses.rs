use serde::{Deserialize, Serialize};

use crate::models::domain::{Tier, TravellerRecord};

/// A recommended hotel and how many matched travellers stayed there
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecommendation {
    pub name: String,
    pub city: String,
    pub count: usize,
}

/// Response for the find matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesResponse {
    pub request_id: String,
    pub tier: Tier,
    pub degraded: bool,
    pub warnings: Vec<String>,
    pub matches: Vec<TravellerRecord>,
    pub hotels: Vec<HotelRecommendation>,
    pub venues: Vec<String>,
    pub total_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub travellers: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
