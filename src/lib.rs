//! TraveLink Algo - Traveller matching service for TraveLink
//!
//! Given a traveller's trip and preferences, this library finds other recorded
//! travellers worth meeting, and recommends hotels and venues from what those
//! travellers chose. It implements a tiered pipeline:
//!
//! - **Basic**: same destination, overlapping dates, shared declared preferences
//! - **Interest**: adds travellers with a similar sentiment about shared interests
//! - **Psychology**: adds travellers with a similar personality profile

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{filter_basic, filter_overlap, MatchResult, Matcher};
pub use error::{ClassifierError, MatchError};
pub use models::{FindMatchesRequest, FindMatchesResponse, QueryTraveller, Tier, TravellerRecord};
pub use services::Dataset;
