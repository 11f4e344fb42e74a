mod config;
mod database;
mod entities;
mod error;
mod http_server;
mod logging;
mod models;
mod ports;
mod repository;
mod security;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config,
    database::Database,
    http_server::state::AppState,
    logging::{component_span, init_tracing},
    repository::{DbCredentialStore, DbPlaylistStore, DbSessionStore, DbTrackStore},
    services::{AuthService, PlaylistService, TrackService},
    spotify_rs::{SpotifyCatalogClient, auth::SpotifyApiCredentials},
};

const SERVICE_NAME: &str = "music-service";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "MUSIC_SERVICE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `music_service=debug` (overrides logging.level)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API
    Serve(ServeArgs),
    /// Apply pending database migrations and exit
    Migrate,
    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(ClapArgs, Debug)]
struct ServeArgs {
    /// Port to listen on (overrides server.port)
    #[arg(short, long, env = "MUSIC_SERVICE_HTTP_PORT")]
    port: Option<u16>,

    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    spotify_client_id: Option<String>,

    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    spotify_client_secret: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    if let Commands::Config(command) = &args.command {
        return run_config_command(command, args.config.as_deref());
    }

    let mut config = Config::load(args.config.as_deref())
        .with_context(|| "Failed to load music-service config")?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    let tracer_provider = init_tracing(
        SERVICE_NAME,
        config.logging.otlp_endpoint.as_deref(),
        &config.logging.level,
    )?;

    let result = match args.command {
        Commands::Serve(serve_args) => serve(config, serve_args).await,
        Commands::Migrate => migrate(&config).await,
        Commands::Config(_) => Ok(()),
    };

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            eprintln!("Failed to shut down tracer provider: {e}");
        }
    }

    result
}

fn run_config_command(command: &ConfigCommands, path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()
            .ok_or_else(|| color_eyre::eyre::eyre!("No default config path found"))?,
    };

    match command {
        ConfigCommands::CreateDefault => {
            if Config::create_default(&path)? {
                println!("Default config written to {}", path.display());
            } else {
                println!("Config already exists at {}", path.display());
            }
        }
        ConfigCommands::Path => println!("{}", path.display()),
    }

    Ok(())
}

async fn migrate(config: &Config) -> Result<()> {
    // Opening the database applies pending migrations
    Database::open(&config.database_path()).await?;
    tracing::info!("Migrations applied");
    Ok(())
}

async fn serve(mut config: Config, args: ServeArgs) -> Result<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(secret) = args.jwt_secret {
        config.jwt.secret = secret;
    }
    if let Some(client_id) = args.spotify_client_id {
        config.spotify.client_id = client_id;
    }
    if let Some(client_secret) = args.spotify_client_secret {
        config.spotify.client_secret = client_secret;
    }
    config.validate().wrap_err("Invalid configuration")?;

    let database = Arc::new(Database::open(&config.database_path()).await?);

    let credentials = Arc::new(DbCredentialStore::new(
        database.clone(),
        component_span("credential_store"),
    ));
    let sessions = Arc::new(DbSessionStore::new(
        database.clone(),
        component_span("session_store"),
    ));
    let playlists = Arc::new(DbPlaylistStore::new(
        database.clone(),
        component_span("playlist_store"),
    ));
    let tracks = Arc::new(DbTrackStore::new(
        database.clone(),
        component_span("track_store"),
    ));
    let catalog = Arc::new(SpotifyCatalogClient::new(
        SpotifyApiCredentials::new(
            config.spotify.client_id.clone(),
            config.spotify.client_secret.clone(),
        ),
        component_span("spotify_catalog"),
    ));

    let app_state = Arc::new(AppState {
        auth: Arc::new(AuthService::new(
            credentials,
            sessions,
            config.auth_settings(),
            component_span("auth_service"),
        )),
        playlists: Arc::new(PlaylistService::new(
            playlists,
            tracks.clone(),
            component_span("playlist_service"),
        )),
        tracks: Arc::new(TrackService::new(
            tracks,
            catalog,
            component_span("track_service"),
        )),
    });

    http_server::app::start(config.server.port, app_state).await
}
