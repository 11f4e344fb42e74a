use std::sync::Arc;

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait,
    Set, TransactionTrait,
};
use tracing::Span;

use crate::database::Database;
use crate::entities;
use crate::error::{Error, Result};
use crate::models::Song;
use crate::repository::TrackStore;

/// Attach and detach run their ownership check and writes in one
/// transaction, so a concurrent delete of the playlist cannot interleave.
/// The transaction opens with a write, so SQLite holds the write lock before
/// the ownership read; a deferred read-then-write upgrade gets SQLITE_BUSY
/// under contention.
pub struct DbTrackStore {
    db: Arc<Database>,
    span: Span,
}

impl DbTrackStore {
    pub fn new(db: Arc<Database>, span: Span) -> Self {
        Self { db, span }
    }

    /// Takes the write lock through a no-op update of the playlist row, then
    /// resolves the playlist's real owner before any other write happens.
    async fn lock_owned_playlist(
        &self,
        txn: &impl ConnectionTrait,
        owner_id: i64,
        playlist_id: i64,
    ) -> Result<()> {
        entities::playlist::Entity::update_many()
            .col_expr(
                entities::playlist::Column::Name,
                Expr::col(entities::playlist::Column::Name).into(),
            )
            .filter(entities::playlist::Column::Id.eq(playlist_id))
            .exec(txn)
            .await?;

        let playlist = entities::playlist::Entity::find_by_id(playlist_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                tracing::debug!(parent: &self.span, playlist_id, "Playlist not found");
                Error::PlaylistNotFound
            })?;

        if playlist.user_id != owner_id {
            tracing::warn!(
                parent: &self.span,
                playlist_id,
                user_id = owner_id,
                "Rejected track change on playlist owned by another user"
            );
            return Err(Error::PermissionDenied);
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl TrackStore for DbTrackStore {
    async fn list_songs_for_playlist(&self, owner_id: i64, playlist_id: i64) -> Result<Vec<Song>> {
        let songs = entities::song::Entity::find()
            .join(
                JoinType::InnerJoin,
                entities::playlist_song::Relation::Song.def().rev(),
            )
            .join(
                JoinType::InnerJoin,
                entities::playlist_song::Relation::Playlist.def(),
            )
            .filter(entities::playlist::Column::Id.eq(playlist_id))
            .filter(entities::playlist::Column::UserId.eq(owner_id))
            .all(&self.db.conn)
            .await?;

        tracing::debug!(
            parent: &self.span,
            playlist_id,
            count = songs.len(),
            "Listed playlist songs"
        );
        Ok(songs.into_iter().map(Song::from).collect())
    }

    async fn attach(&self, owner_id: i64, playlist_id: i64, song: Song) -> Result<String> {
        let txn = self.db.conn.begin().await?;

        self.lock_owned_playlist(&txn, owner_id, playlist_id).await?;

        let song_id = song.id.clone();
        let song_model = entities::song::ActiveModel {
            id: Set(song.id),
            title: Set(song.title),
            artist: Set(song.artist),
            album: Set(song.album),
            album_cover: Set(song.album_cover),
            duration: Set(song.duration),
            release_date: Set(song.release_date),
            popularity: Set(song.popularity),
            preview_url: Set(song.preview_url),
            external_url: Set(song.external_url),
        };

        // The first attach caches the song; later ones keep the cached row
        entities::song::Entity::insert(song_model)
            .on_conflict(
                OnConflict::column(entities::song::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        let link = entities::playlist_song::ActiveModel {
            playlist_id: Set(playlist_id),
            song_id: Set(song_id.clone()),
        };
        entities::playlist_song::Entity::insert(link)
            .on_conflict(
                OnConflict::columns([
                    entities::playlist_song::Column::PlaylistId,
                    entities::playlist_song::Column::SongId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(parent: &self.span, playlist_id, song_id = %song_id, "Song attached");
        Ok(song_id)
    }

    async fn detach(&self, owner_id: i64, playlist_id: i64, song_id: &str) -> Result<()> {
        let txn = self.db.conn.begin().await?;

        self.lock_owned_playlist(&txn, owner_id, playlist_id).await?;

        let result = entities::playlist_song::Entity::delete_many()
            .filter(entities::playlist_song::Column::PlaylistId.eq(playlist_id))
            .filter(entities::playlist_song::Column::SongId.eq(song_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(
            parent: &self.span,
            playlist_id,
            song_id,
            removed = result.rows_affected,
            "Song detached"
        );
        Ok(())
    }
}
