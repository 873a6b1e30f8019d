use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use travelink_algo::config::{LogFormat, Settings};
use travelink_algo::core::Matcher;
use travelink_algo::models::FeatureKind;
use travelink_algo::routes::{self, AppState};
use travelink_algo::services::{build_extractor, Dataset, SpotifyClient};

/// Read the fallback Spotify token, if one is configured
fn read_default_token(path: Option<&str>) -> Option<String> {
    let path = path?;
    match std::fs::read_to_string(path) {
        Ok(token) => Some(token.trim().to_string()).filter(|t| !t.is_empty()),
        Err(e) => {
            warn!("Could not read Spotify token from {}: {}", path, e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    // Initialize logging; LOG_LEVEL and LOG_FORMAT win over the config file
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    let log_level = std::env::var("LOG_LEVEL").unwrap_or(logging.level);
    let log_format = match std::env::var("LOG_FORMAT") {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            eprintln!("Ignoring LOG_FORMAT: {}", e);
            logging.format
        }),
        Err(_) => logging.format,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Text => subscriber.init(),
    }

    info!("Starting TraveLink matching service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        io::Error::other(format!("Configuration error: {}", e))
    })?;

    info!("Configuration loaded successfully");

    let dataset = Dataset::load(&settings.dataset.path).map_err(|e| {
        error!("Failed to load traveller dataset: {}", e);
        io::Error::other(e.to_string())
    })?;

    if dataset.is_empty() {
        warn!("Traveller dataset is empty, every search will return no matches");
    }

    let mut matcher = Matcher::new(
        (&settings.matching.interest).into(),
        (&settings.matching.psychology).into(),
    )
    .map_err(|e| io::Error::other(e.to_string()))?;

    for kind in [FeatureKind::Sentiment, FeatureKind::Personality] {
        match build_extractor(&settings.classifier, kind).await {
            Ok(Some(extractor)) => {
                matcher = match kind {
                    FeatureKind::Sentiment => matcher.with_sentiment(extractor),
                    FeatureKind::Personality => matcher.with_personality(extractor),
                };
            }
            Ok(None) => info!("{} classifier disabled", kind),
            Err(e) if settings.classifier.required => {
                error!("Failed to load {} classifier: {}", kind, e);
                return Err(io::Error::other(e.to_string()));
            }
            Err(e) => {
                warn!("{} classifier unavailable, its tier will serve basic matches: {}", kind, e);
            }
        }
    }

    info!(
        "Matcher initialized (interest: {:?}, psychology: {:?})",
        settings.matching.interest, settings.matching.psychology
    );

    let music = SpotifyClient::new(
        &settings.music.base_url,
        Duration::from_secs(settings.music.timeout_secs),
    )
    .map_err(|e| io::Error::other(e.to_string()))?;

    // Build application state
    let app_state = AppState {
        dataset: Arc::new(dataset),
        matcher: Arc::new(matcher),
        music: Arc::new(music),
        default_token: read_default_token(settings.music.token_path.as_deref()),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
