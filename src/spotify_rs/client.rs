use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::Span;

use crate::error::{Error, Result};
use crate::ports::catalog::{CatalogClient, CatalogTrack};
use crate::spotify_rs::auth::{AccessToken, SpotifyApiCredentials, request_app_token};
use crate::spotify_rs::types::SpotifyTrack;

const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Spotify catalog client authenticated as the application itself.
///
/// The app token is fetched lazily and reused until shortly before it expires.
pub struct SpotifyCatalogClient {
    credentials: SpotifyApiCredentials,
    client: reqwest::Client,
    token: Mutex<Option<AccessToken>>,
    span: Span,
}

impl SpotifyCatalogClient {
    pub fn new(credentials: SpotifyApiCredentials, span: Span) -> Self {
        Self {
            credentials,
            client: reqwest::Client::new(),
            token: Mutex::new(None),
            span,
        }
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        tracing::debug!(
            parent: &self.span,
            client_id = self.credentials.client_id(),
            "Requesting Spotify app token"
        );
        let token = request_app_token(&self.client, &self.credentials)
            .await
            .map_err(|e| {
                tracing::error!(parent: &self.span, error = %e, "Failed to get Spotify app token");
                Error::Catalog(e.to_string())
            })?;

        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

#[async_trait::async_trait]
impl CatalogClient for SpotifyCatalogClient {
    async fn get_track_by_id(&self, catalog_id: &str) -> Result<CatalogTrack> {
        let access_token = self.access_token().await?;

        let response = self
            .client
            .get(format!(
                "{}/tracks/{}",
                SPOTIFY_API_URL,
                urlencoding::encode(catalog_id)
            ))
            .bearer_auth(access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| Error::Catalog(format!("Failed to send request: {e}")))?;

        match response.status() {
            // Spotify answers 400 for ids that are not valid base62
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                tracing::debug!(parent: &self.span, catalog_id, "Track not found in catalog");
                return Err(Error::TrackNotFound(catalog_id.to_string()));
            }
            status if !status.is_success() => {
                tracing::warn!(parent: &self.span, catalog_id, %status, "Catalog lookup failed");
                return Err(Error::Catalog(format!("Spotify returned {status}")));
            }
            _ => {}
        }

        let track: SpotifyTrack = response
            .json()
            .await
            .map_err(|e| Error::Catalog(format!("Failed to parse track: {e}")))?;

        Ok(track.into())
    }
}

impl From<SpotifyTrack> for CatalogTrack {
    fn from(track: SpotifyTrack) -> Self {
        Self {
            id: track.id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album_name: track.album.name,
            album_images: track.album.images.into_iter().map(|i| i.url).collect(),
            album_release_date: track.album.release_date,
            duration_ms: i32::try_from(track.duration_ms).unwrap_or(i32::MAX),
            popularity: track.popularity,
            preview_url: track.preview_url,
            external_urls: track.external_urls,
        }
    }
}
