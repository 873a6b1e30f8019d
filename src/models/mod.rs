// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ClusteringParams, FeatureKind, FeatureVector, FreeTime, Mood, QueryTraveller, Tier,
    TravellerRecord, DATE_FORMAT, DEFAULT_STATEMENT, SENTINEL_NAME,
};
pub use requests::FindMatchesRequest;
pub use responses::{ErrorResponse, FindMatchesResponse, HealthResponse, HotelRecommendation};
