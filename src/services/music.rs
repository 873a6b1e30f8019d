use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// How many genres a music profile is reduced to
pub const TOP_GENRES: usize = 5;

/// Errors that can occur when looking up a traveller's music taste
#[derive(Debug, Error)]
pub enum MusicError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Unauthorized: invalid or expired access token")]
    Unauthorized,

    #[error("Music API returned error: {0}")]
    ApiError(String),

    #[error("Music lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Source of a traveller's favourite music genres
#[async_trait]
pub trait GenreLookup: Send + Sync {
    /// Up to five genres, most listened first
    async fn top_genres(&self, access_token: &str) -> Result<Vec<String>, MusicError>;
}

#[derive(Debug, Deserialize)]
pub struct TopArtists {
    #[serde(default)]
    pub items: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Count genres across artists and keep the most frequent ones
///
/// Ties keep the order in which genres were first seen.
pub fn extract_top_genres(top_artists: &TopArtists) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for genre in top_artists.items.iter().flat_map(|a| a.genres.iter()) {
        match counts.iter_mut().find(|(name, _)| *name == genre.as_str()) {
            Some((_, count)) => *count += 1,
            None => counts.push((genre.as_str(), 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_GENRES)
        .map(|(genre, _)| genre.to_string())
        .collect()
}

/// Spotify Web API client for the current user's top artists
pub struct SpotifyClient {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl SpotifyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MusicError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
            timeout,
        })
    }

    async fn fetch_top_artists(&self, access_token: &str) -> Result<TopArtists, MusicError> {
        let url = format!("{}/v1/me/top/artists", self.base_url.trim_end_matches('/'));
        tracing::debug!("Fetching top artists from: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            reqwest::StatusCode::UNAUTHORIZED => Err(MusicError::Unauthorized),
            status => Err(MusicError::ApiError(format!(
                "Failed to fetch top artists: {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl GenreLookup for SpotifyClient {
    async fn top_genres(&self, access_token: &str) -> Result<Vec<String>, MusicError> {
        let artists = tokio::time::timeout(self.timeout, self.fetch_top_artists(access_token))
            .await
            .map_err(|_| MusicError::Timeout(self.timeout))??;

        Ok(extract_top_genres(&artists))
    }
}

/// Genres for a traveller, or `None` when the lookup is unavailable
///
/// A failed lookup means "no preference" rather than a failed request.
pub async fn genres_or_none(
    lookup: &dyn GenreLookup,
    access_token: Option<&str>,
) -> Option<Vec<String>> {
    let token = access_token.map(str::trim).filter(|t| !t.is_empty())?;

    match lookup.top_genres(token).await {
        Ok(genres) => Some(genres),
        Err(e) => {
            tracing::warn!("Music genre lookup failed, ignoring music preferences: {}", e);
            None
        }
    }
}
