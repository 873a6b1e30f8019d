use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::Tier;

/// Request to find matching travellers
///
/// Dates use DD/MM/YYYY, like the dataset.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesRequest {
    #[serde(default = "default_tier")]
    pub tier: Tier,
    #[validate(length(min = 1))]
    pub arrival_city: String,
    #[validate(length(min = 1))]
    pub arrival_date: String,
    #[validate(length(min = 1))]
    pub return_date: String,
    #[validate(length(min = 1))]
    pub company: String,
    #[validate(length(min = 1))]
    pub mood: String,
    pub networking: bool,
    #[validate(length(min = 1))]
    pub free_time: String,
    #[serde(default)]
    pub statement: Option<String>,
    #[serde(default)]
    pub spotify_token: Option<String>,
}

fn default_tier() -> Tier {
    Tier::Basic
}
