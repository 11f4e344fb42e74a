use std::collections::HashMap;

use crate::error::Result;

/// Provider key under which a track's canonical link is published.
pub const PROVIDER: &str = "spotify";

/// Decoupled representation of a catalog track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album_name: String,
    /// Album image URLs, largest first
    pub album_images: Vec<String>,
    pub album_release_date: String,
    pub duration_ms: i32,
    pub popularity: i32,
    pub preview_url: Option<String>,
    /// Keyed by provider name, see [`PROVIDER`]
    pub external_urls: HashMap<String, String>,
}

/// Port trait wrapping the catalog lookup used by business logic.
///
/// Implementations live in `spotify_rs::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// `Error::TrackNotFound` when the catalog has no track with this id.
    async fn get_track_by_id(&self, catalog_id: &str) -> Result<CatalogTrack>;
}
