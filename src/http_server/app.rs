use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
#[cfg(not(debug_assertions))]
use tower_http::cors::{AllowMethods, AllowOrigin};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::http_server::{
    http_routes::{auth, playlist, tracks},
    state::AppState,
};

pub const API_PATH: &str = "/api/v1";

pub fn router(app_state: Arc<AppState>) -> Router {
    #[cfg(debug_assertions)]
    let cors_layer = CorsLayer::permissive();

    #[cfg(not(debug_assertions))]
    let cors_layer = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(AllowMethods::any())
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let api = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/ping", get(auth::ping))
        .route(
            "/playlist",
            post(playlist::create_playlist).get(playlist::list_playlists),
        )
        .route(
            "/playlist/{playlist_id}",
            get(playlist::get_playlist)
                .put(playlist::update_playlist)
                .delete(playlist::delete_playlist),
        )
        .route("/tracks/{track_id}", get(tracks::get_catalog_track))
        .route(
            "/tracks/playlist/{playlist_id}",
            get(tracks::list_playlist_tracks),
        )
        .route(
            "/tracks/{track_id}/playlist/{playlist_id}",
            post(tracks::add_track_to_playlist).delete(tracks::remove_track_from_playlist),
        );

    Router::new()
        .nest(API_PATH, api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state)
}

pub async fn start(port: u16, app_state: Arc<AppState>) -> color_eyre::Result<()> {
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", port))?;

    tracing::info!(port, "HTTP server listening");
    axum::serve(listener, app)
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}
