use std::sync::Arc;

use tracing::{Span, instrument};

use crate::error::Result;
use crate::models::Song;
use crate::ports::catalog::{CatalogClient, CatalogTrack, PROVIDER};
use crate::repository::TrackStore;

const UNKNOWN_ARTIST: &str = "Unknown Artist";

pub struct TrackService {
    tracks: Arc<dyn TrackStore>,
    catalog: Arc<dyn CatalogClient>,
    span: Span,
}

impl TrackService {
    pub fn new(tracks: Arc<dyn TrackStore>, catalog: Arc<dyn CatalogClient>, span: Span) -> Self {
        Self {
            tracks,
            catalog,
            span,
        }
    }

    pub async fn get_catalog_track(&self, catalog_id: &str) -> Result<Song> {
        let track = self.catalog.get_track_by_id(catalog_id).await?;
        Ok(song_from_catalog(track))
    }

    pub async fn list_tracks(&self, owner_id: i64, playlist_id: i64) -> Result<Vec<Song>> {
        self.tracks
            .list_songs_for_playlist(owner_id, playlist_id)
            .await
    }

    /// Looks the track up in the catalog, then caches it and links it to the playlist.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn add_track(&self, owner_id: i64, playlist_id: i64, catalog_id: &str) -> Result<Song> {
        let song = self.get_catalog_track(catalog_id).await?;
        self.tracks.attach(owner_id, playlist_id, song.clone()).await?;
        Ok(song)
    }

    #[instrument(parent = &self.span, skip(self))]
    pub async fn remove_track(&self, owner_id: i64, playlist_id: i64, song_id: &str) -> Result<()> {
        self.tracks.detach(owner_id, playlist_id, song_id).await
    }
}

pub fn song_from_catalog(track: CatalogTrack) -> Song {
    Song {
        artist: track
            .artists
            .into_iter()
            .next()
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        album_cover: track.album_images.into_iter().next().unwrap_or_default(),
        duration: track.duration_ms / 1000,
        external_url: track
            .external_urls
            .get(PROVIDER)
            .cloned()
            .unwrap_or_default(),
        id: track.id,
        title: track.name,
        album: track.album_name,
        release_date: track.album_release_date,
        popularity: track.popularity,
        preview_url: track.preview_url.unwrap_or_default(),
    }
}
