use std::sync::Arc;

use sea_orm::prelude::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::Span;

use crate::database::Database;
use crate::entities;
use crate::error::{Error, Result};
use crate::models::{NewPlaylist, Playlist, PlaylistUpdate};
use crate::repository::PlaylistStore;

/// Update and delete are single statements filtered on `(user_id, id)`; zero
/// rows affected means the playlist is missing or owned by someone else.
pub struct DbPlaylistStore {
    db: Arc<Database>,
    span: Span,
}

impl DbPlaylistStore {
    pub fn new(db: Arc<Database>, span: Span) -> Self {
        Self { db, span }
    }
}

#[async_trait::async_trait]
impl PlaylistStore for DbPlaylistStore {
    async fn create(&self, playlist: NewPlaylist) -> Result<i64> {
        let model = entities::playlist::ActiveModel {
            user_id: Set(playlist.user_id),
            name: Set(playlist.name),
            ..Default::default()
        };

        let created = model.insert(&self.db.conn).await.inspect_err(|e| {
            tracing::error!(parent: &self.span, error = %e, "Failed to create playlist")
        })?;

        tracing::info!(
            parent: &self.span,
            playlist_id = created.id,
            user_id = created.user_id,
            "Playlist created"
        );
        Ok(created.id)
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Playlist>> {
        let playlists = entities::playlist::Entity::find()
            .filter(entities::playlist::Column::UserId.eq(owner_id))
            .order_by_asc(entities::playlist::Column::Id)
            .all(&self.db.conn)
            .await?;

        tracing::debug!(
            parent: &self.span,
            user_id = owner_id,
            count = playlists.len(),
            "Listed playlists"
        );
        Ok(playlists.into_iter().map(Playlist::from).collect())
    }

    async fn get_by_id(&self, owner_id: i64, playlist_id: i64) -> Result<Playlist> {
        entities::playlist::Entity::find_by_id(playlist_id)
            .filter(entities::playlist::Column::UserId.eq(owner_id))
            .one(&self.db.conn)
            .await?
            .map(Playlist::from)
            .ok_or_else(|| {
                tracing::debug!(parent: &self.span, playlist_id, user_id = owner_id, "Playlist not found");
                Error::PlaylistNotFound
            })
    }

    async fn update_by_id(&self, owner_id: i64, playlist: PlaylistUpdate) -> Result<()> {
        let result = entities::playlist::Entity::update_many()
            .col_expr(entities::playlist::Column::Name, Expr::value(playlist.name))
            .filter(entities::playlist::Column::UserId.eq(owner_id))
            .filter(entities::playlist::Column::Id.eq(playlist.id))
            .exec(&self.db.conn)
            .await?;

        if result.rows_affected == 0 {
            tracing::debug!(parent: &self.span, playlist_id = playlist.id, user_id = owner_id, "No playlist updated");
            return Err(Error::PlaylistNotFound);
        }

        tracing::info!(parent: &self.span, playlist_id = playlist.id, "Playlist updated");
        Ok(())
    }

    async fn delete_by_id(&self, owner_id: i64, playlist_id: i64) -> Result<()> {
        let result = entities::playlist::Entity::delete_many()
            .filter(entities::playlist::Column::UserId.eq(owner_id))
            .filter(entities::playlist::Column::Id.eq(playlist_id))
            .exec(&self.db.conn)
            .await?;

        if result.rows_affected == 0 {
            tracing::debug!(parent: &self.span, playlist_id, user_id = owner_id, "No playlist deleted");
            return Err(Error::PlaylistNotFound);
        }

        tracing::info!(parent: &self.span, playlist_id, "Playlist deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_user, test_db};

    async fn setup() -> (Arc<Database>, DbPlaylistStore, i64, i64) {
        let db = test_db().await;
        let alice = insert_user(&db, "alice").await;
        let bob = insert_user(&db, "bob").await;
        let store = DbPlaylistStore::new(db.clone(), Span::none());
        (db, store, alice.id, bob.id)
    }

    fn new_playlist(user_id: i64, name: &str) -> NewPlaylist {
        NewPlaylist {
            name: name.into(),
            user_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_db, store, alice, _bob) = setup().await;

        let id = store.create(new_playlist(alice, "Road Trip")).await.unwrap();
        let playlist = store.get_by_id(alice, id).await.unwrap();

        assert_eq!(playlist.id, id);
        assert_eq!(playlist.name, "Road Trip");
        assert_eq!(playlist.user_id, alice);
        assert!(playlist.songs.is_empty());
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let (_db, store, alice, bob) = setup().await;
        store.create(new_playlist(alice, "One")).await.unwrap();
        store.create(new_playlist(alice, "Two")).await.unwrap();
        store.create(new_playlist(bob, "Bob's")).await.unwrap();

        let playlists = store.list_by_owner(alice).await.unwrap();
        let names: Vec<_> = playlists.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_list_by_owner_empty() {
        let (_db, store, alice, _bob) = setup().await;

        assert!(store.list_by_owner(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_other_owners_playlist_is_not_found() {
        let (_db, store, alice, bob) = setup().await;
        let id = store.create(new_playlist(bob, "Bob's")).await.unwrap();

        assert!(matches!(
            store.get_by_id(alice, id).await,
            Err(Error::PlaylistNotFound)
        ));
        assert!(matches!(
            store.get_by_id(alice, 9999).await,
            Err(Error::PlaylistNotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_by_id() {
        let (_db, store, alice, _bob) = setup().await;
        let id = store.create(new_playlist(alice, "Old")).await.unwrap();

        store
            .update_by_id(
                alice,
                PlaylistUpdate {
                    id,
                    name: "New".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(store.get_by_id(alice, id).await.unwrap().name, "New");
    }

    #[tokio::test]
    async fn test_update_other_owners_playlist_is_not_found() {
        let (_db, store, alice, bob) = setup().await;
        let id = store.create(new_playlist(alice, "Mine")).await.unwrap();

        let result = store
            .update_by_id(
                bob,
                PlaylistUpdate {
                    id,
                    name: "Hijacked".into(),
                },
            )
            .await;

        assert!(matches!(result, Err(Error::PlaylistNotFound)));
        assert_eq!(store.get_by_id(alice, id).await.unwrap().name, "Mine");
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let (_db, store, alice, _bob) = setup().await;
        let id = store.create(new_playlist(alice, "Gone")).await.unwrap();

        store.delete_by_id(alice, id).await.unwrap();

        assert!(matches!(
            store.get_by_id(alice, id).await,
            Err(Error::PlaylistNotFound)
        ));
        assert!(matches!(
            store.delete_by_id(alice, id).await,
            Err(Error::PlaylistNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_other_owners_playlist_is_not_found() {
        let (_db, store, alice, bob) = setup().await;
        let id = store.create(new_playlist(alice, "Road Trip")).await.unwrap();

        assert!(matches!(
            store.delete_by_id(bob, id).await,
            Err(Error::PlaylistNotFound)
        ));

        let playlist = store.get_by_id(alice, id).await.unwrap();
        assert_eq!(playlist.name, "Road Trip");
        assert_eq!(playlist.user_id, alice);
    }
}
