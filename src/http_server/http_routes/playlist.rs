use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::http_server::{auth::AuthUser, error::ApiError, extract, state::AppState};
use crate::models::{Playlist, PlaylistUpdate};

#[derive(Debug, Deserialize)]
pub struct PlaylistInput {
    name: String,
}

impl PlaylistInput {
    fn name(self) -> Result<String, ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::BadRequest("name must not be empty".to_string()));
        }
        Ok(name)
    }
}

pub async fn create_playlist(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    extract::Json(input): extract::Json<PlaylistInput>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist = app_state
        .playlists
        .create(user.user_id, input.name()?)
        .await?;

    Ok(Json(json!({ "status": "ok", "id": playlist.id })))
}

pub async fn list_playlists(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<Playlist>>, ApiError> {
    Ok(Json(app_state.playlists.list(user.user_id).await?))
}

pub async fn get_playlist(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    extract::Path(playlist_id): extract::Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist = app_state
        .playlists
        .get_by_id(user.user_id, playlist_id)
        .await?;

    Ok(Json(json!({ "playlist": playlist })))
}

pub async fn update_playlist(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    extract::Path(playlist_id): extract::Path<i64>,
    extract::Json(input): extract::Json<PlaylistInput>,
) -> Result<Json<Playlist>, ApiError> {
    let name = input.name()?;

    app_state
        .playlists
        .update(
            user.user_id,
            PlaylistUpdate {
                id: playlist_id,
                name: name.clone(),
            },
        )
        .await?;

    Ok(Json(Playlist {
        id: playlist_id,
        name,
        user_id: user.user_id,
        songs: Vec::new(),
    }))
}

pub async fn delete_playlist(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    extract::Path(playlist_id): extract::Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .playlists
        .delete(user.user_id, playlist_id)
        .await?;

    Ok(Json(json!({ "message": "playlist deleted" })))
}
