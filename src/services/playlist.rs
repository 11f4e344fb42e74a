use std::sync::Arc;

use tracing::Span;

use crate::error::Result;
use crate::models::{NewPlaylist, Playlist, PlaylistUpdate};
use crate::repository::{PlaylistStore, TrackStore};

pub struct PlaylistService {
    playlists: Arc<dyn PlaylistStore>,
    tracks: Arc<dyn TrackStore>,
    span: Span,
}

impl PlaylistService {
    pub fn new(playlists: Arc<dyn PlaylistStore>, tracks: Arc<dyn TrackStore>, span: Span) -> Self {
        Self {
            playlists,
            tracks,
            span,
        }
    }

    pub async fn create(&self, owner_id: i64, name: String) -> Result<Playlist> {
        let id = self
            .playlists
            .create(NewPlaylist {
                name: name.clone(),
                user_id: owner_id,
            })
            .await?;

        Ok(Playlist {
            id,
            name,
            user_id: owner_id,
            songs: Vec::new(),
        })
    }

    pub async fn list(&self, owner_id: i64) -> Result<Vec<Playlist>> {
        self.playlists.list_by_owner(owner_id).await
    }

    /// The playlist with its songs.
    pub async fn get_by_id(&self, owner_id: i64, playlist_id: i64) -> Result<Playlist> {
        let mut playlist = self.playlists.get_by_id(owner_id, playlist_id).await?;
        playlist.songs = self
            .tracks
            .list_songs_for_playlist(owner_id, playlist_id)
            .await?;

        tracing::debug!(
            parent: &self.span,
            playlist_id,
            songs = playlist.songs.len(),
            "Loaded playlist"
        );
        Ok(playlist)
    }

    pub async fn update(&self, owner_id: i64, update: PlaylistUpdate) -> Result<()> {
        self.playlists.update_by_id(owner_id, update).await
    }

    pub async fn delete(&self, owner_id: i64, playlist_id: i64) -> Result<()> {
        self.playlists.delete_by_id(owner_id, playlist_id).await
    }
}
