use std::sync::Arc;

use crate::services::{AuthService, PlaylistService, TrackService};

pub struct AppState {
    pub auth: Arc<AuthService>,
    pub playlists: Arc<PlaylistService>,
    pub tracks: Arc<TrackService>,
}
