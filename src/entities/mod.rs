pub mod playlist;
pub mod playlist_song;
pub mod song;
pub mod token;
pub mod user;
