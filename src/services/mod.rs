pub mod auth;
pub mod playlist;
pub mod track;

pub use auth::AuthService;
pub use playlist::PlaylistService;
pub use track::TrackService;
