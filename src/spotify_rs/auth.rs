use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use base64::{
    alphabet,
    engine::{self, general_purpose},
};
use chrono::{DateTime, Utc};

use crate::spotify_rs::types::SpotifyTokenResponse;

pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Tokens are refreshed this long before Spotify says they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

const CUSTOM_ENGINE: engine::GeneralPurpose =
    engine::GeneralPurpose::new(&alphabet::STANDARD, general_purpose::PAD);

#[derive(Debug, Clone)]
pub struct SpotifyApiCredentials {
    client_id: String,
    client_secret: String,
}

impl SpotifyApiCredentials {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn basic_auth_header(&self) -> String {
        format!(
            "Basic {}",
            CUSTOM_ENGINE.encode(format!("{}:{}", self.client_id, self.client_secret))
        )
    }
}

/// An app access token together with the moment it stops being usable.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn from_response(response: SpotifyTokenResponse, now: DateTime<Utc>) -> Self {
        let lifetime = (response.expires_in as i64 - EXPIRY_MARGIN_SECS).max(0);
        Self {
            value: response.access_token,
            expires_at: now + chrono::Duration::seconds(lifetime),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientCredentialsError {
    #[error("Spotify rejected the client credentials: {reason}")]
    Rejected { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Request an app token with the client credentials flow
/// https://developer.spotify.com/documentation/web-api/tutorials/client-credentials-flow
pub async fn request_app_token(
    client: &reqwest::Client,
    credentials: &SpotifyApiCredentials,
) -> Result<AccessToken, ClientCredentialsError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "client_credentials");

    let response = client
        .post(SPOTIFY_TOKEN_URL)
        // Serialized as x-www-form-urlencoded, as required by spotify
        .form(&params)
        .header("Authorization", credentials.basic_auth_header())
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(ClientCredentialsError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(ClientCredentialsError::Rejected {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    let token_response: SpotifyTokenResponse = response
        .json()
        .await
        .map_err(ClientCredentialsError::FailedToParseResponse)?;

    Ok(AccessToken::from_response(token_response, Utc::now()))
}
