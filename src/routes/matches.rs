use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{matching_venues, parse_trip_date, recommend_hotels, Matcher};
use crate::error::MatchError;
use crate::models::{
    ErrorResponse, FindMatchesRequest, FindMatchesResponse, HealthResponse, QueryTraveller,
    DEFAULT_STATEMENT,
};
use crate::services::{genres_or_none, Dataset, GenreLookup};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub matcher: Arc<Matcher>,
    pub music: Arc<dyn GenreLookup>,
    /// Spotify token used when a request carries none
    pub default_token: Option<String>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/cities", web::get().to(list_cities))
        .route("/companies", web::get().to(list_companies))
        .route("/matches/find", web::post().to(find_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = if state.dataset.is_empty() { "degraded" } else { "healthy" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        travellers: state.dataset.len(),
    })
}

/// Cities known from the dataset
///
/// GET /api/v1/cities
async fn list_cities(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.dataset.cities())
}

/// Companies known from the dataset
///
/// GET /api/v1/companies
async fn list_companies(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.dataset.companies())
}

fn bad_request(error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: 400,
    })
}

/// Turn the request into a validated query traveller
fn build_query(req: &FindMatchesRequest) -> Result<QueryTraveller, MatchError> {
    let statement = req
        .statement
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STATEMENT);

    QueryTraveller::new(
        req.arrival_city.trim(),
        parse_trip_date(&req.arrival_date)?,
        parse_trip_date(&req.return_date)?,
        req.company.trim(),
        req.mood.parse()?,
        req.networking,
        req.free_time.parse()?,
        statement,
    )
}

/// Find matches endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "tier": "basic|interest|psychology",
///   "arrivalCity": "Paris",
///   "arrivalDate": "12/06/2024",
///   "returnDate": "18/06/2024",
///   "company": "Acme",
///   "mood": "Adventure",
///   "networking": true,
///   "freeTime": "Evenings",
///   "statement": "string",
///   "spotifyToken": "string"
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: field_errors={:?}", errors);
        return bad_request("Validation failed", errors);
    }

    let query = match build_query(&req) {
        Ok(query) => query,
        Err(e) => {
            tracing::info!("Rejected find_matches request: {}", e);
            return bad_request("Invalid request", e);
        }
    };

    let request_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        "[{}] Finding {} matches for a trip to {} ({} - {})",
        request_id,
        req.tier,
        query.arrival_city,
        query.arrival_date,
        query.return_date
    );

    let result = state
        .matcher
        .find_matches(state.dataset.records(), &query, req.tier)
        .await;

    let token = req
        .spotify_token
        .as_deref()
        .or(state.default_token.as_deref());
    let genres = genres_or_none(state.music.as_ref(), token).await;

    let hotels = recommend_hotels(&result.travellers, &query.arrival_city);
    let venues = matching_venues(&result.travellers, genres.as_deref());

    tracing::info!(
        "[{}] Returning {} matches, {} hotels, {} venues (degraded: {})",
        request_id,
        result.travellers.len(),
        hotels.len(),
        venues.len(),
        result.degraded
    );

    HttpResponse::Ok().json(FindMatchesResponse {
        request_id,
        tier: result.tier,
        degraded: result.degraded,
        warnings: result.warnings,
        matches: result.travellers,
        hotels,
        venues,
        total_candidates: result.total_candidates,
    })
}
