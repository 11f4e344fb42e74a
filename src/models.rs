use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user that has not been persisted yet. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl From<entities::user::Model> for User {
    fn from(model: entities::user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            password_hash: model.password,
            created_at: model.created_at,
        }
    }
}

/// A token to record as the user's active session.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: i64,
}

/// Claims carried by every signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: i64,
    /// Issued-at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds)
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    pub songs: Vec<Song>,
}

impl From<entities::playlist::Model> for Playlist {
    fn from(model: entities::playlist::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            user_id: model.user_id,
            songs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub name: String,
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct PlaylistUpdate {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_cover: String,
    /// Duration in seconds
    pub duration: i32,
    pub release_date: String,
    pub popularity: i32,
    pub preview_url: String,
    pub external_url: String,
}

impl From<entities::song::Model> for Song {
    fn from(model: entities::song::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            artist: model.artist,
            album: model.album,
            album_cover: model.album_cover,
            duration: model.duration,
            release_date: model.release_date,
            popularity: model.popularity,
            preview_url: model.preview_url,
            external_url: model.external_url,
        }
    }
}
