use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the matching pipeline
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid date '{0}': expected DD/MM/YYYY")]
    DateParse(String),

    #[error("Return date {return_date} is before arrival date {arrival_date}")]
    InvalidTripWindow {
        arrival_date: NaiveDate,
        return_date: NaiveDate,
    },

    #[error("Invalid {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("Feature extraction failed: {0}")]
    Extraction(#[from] ClassifierError),

    #[error("Clustering failed: {0}")]
    Clustering(String),

    #[error("No feature extractor configured for the {0} tier")]
    ExtractorUnavailable(&'static str),

    #[error("Lexicon build failed: {0}")]
    Lexicon(#[from] aho_corasick::BuildError),
}

/// Errors that can occur when scoring text with a classifier backend
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Inference server returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Feature extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("Lexicon build failed: {0}")]
    Lexicon(#[from] aho_corasick::BuildError),
}
