//! Catalog adapter backed by the Spotify Web API.

pub mod auth;
pub mod client;
pub mod types;

pub use client::SpotifyCatalogClient;
