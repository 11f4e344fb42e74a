//! Storage capabilities used by the services.
//!
//! Each capability is a trait with one sea-orm implementation. Every
//! playlist-scoped operation takes the caller's user id and filters on it;
//! callers are never trusted to have checked ownership themselves.

use crate::error::Result;
use crate::models::{NewPlaylist, NewToken, NewUser, Playlist, PlaylistUpdate, Song, User};

pub mod credentials;
pub mod playlists;
pub mod sessions;
pub mod tracks;

pub use credentials::DbCredentialStore;
pub use playlists::DbPlaylistStore;
pub use sessions::DbSessionStore;
pub use tracks::DbTrackStore;

/// User records.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Error::UserNotFound` when no user has this email.
    async fn find_by_email(&self, email: &str) -> Result<User>;

    async fn find_by_id(&self, id: i64) -> Result<User>;

    /// Matches on the stored password hash, not a plain password.
    async fn find_by_username_and_password(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User>;

    /// `Error::UserAlreadyExists` when the username or email is taken.
    async fn create(&self, user: NewUser) -> Result<User>;
}

/// Persisted token lifecycle. At most one row, and so at most one active
/// token, exists per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts the user's token row, or overwrites the existing one and
    /// reactivates it.
    async fn save_token(&self, token: NewToken) -> Result<()>;

    /// Marks the user's active token inactive. Idempotent.
    async fn invalidate(&self, user_id: i64) -> Result<()>;

    /// `false` when no row has this token string.
    async fn is_valid(&self, token: &str) -> Result<bool>;
}

/// Playlists, always scoped by owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn create(&self, playlist: NewPlaylist) -> Result<i64>;

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Playlist>>;

    /// `Error::PlaylistNotFound` both for a missing id and for another
    /// owner's playlist.
    async fn get_by_id(&self, owner_id: i64, playlist_id: i64) -> Result<Playlist>;

    async fn update_by_id(&self, owner_id: i64, playlist: PlaylistUpdate) -> Result<()>;

    async fn delete_by_id(&self, owner_id: i64, playlist_id: i64) -> Result<()>;
}

/// Links between playlists and cached catalog songs.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TrackStore: Send + Sync {
    /// Empty when the playlist has no songs or is not owned by `owner_id`.
    async fn list_songs_for_playlist(&self, owner_id: i64, playlist_id: i64) -> Result<Vec<Song>>;

    /// Caches the song (insert-if-absent) and links it to the playlist.
    /// Returns the song id.
    async fn attach(&self, owner_id: i64, playlist_id: i64, song: Song) -> Result<String>;

    async fn detach(&self, owner_id: i64, playlist_id: i64, song_id: &str) -> Result<()>;
}
