use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use serde_json::json;

use crate::http_server::{auth::AuthUser, error::ApiError, extract, state::AppState};
use crate::models::Song;

pub async fn get_catalog_track(
    State(app_state): State<Arc<AppState>>,
    _user: AuthUser,
    extract::Path(track_id): extract::Path<String>,
) -> Result<Json<Song>, ApiError> {
    Ok(Json(app_state.tracks.get_catalog_track(&track_id).await?))
}

pub async fn list_playlist_tracks(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    extract::Path(playlist_id): extract::Path<i64>,
) -> Result<Json<Vec<Song>>, ApiError> {
    Ok(Json(
        app_state
            .tracks
            .list_tracks(user.user_id, playlist_id)
            .await?,
    ))
}

pub async fn add_track_to_playlist(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    extract::Path((track_id, playlist_id)): extract::Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let song = app_state
        .tracks
        .add_track(user.user_id, playlist_id, &track_id)
        .await?;

    Ok(Json(json!({ "song": song })))
}

pub async fn remove_track_from_playlist(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
    extract::Path((track_id, playlist_id)): extract::Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tracks
        .remove_track(user.user_id, playlist_id, &track_id)
        .await?;

    Ok(Json("Track removed from playlist"))
}
