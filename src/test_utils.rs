use std::sync::Arc;

use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, Database as SeaDatabase};

use crate::database::Database;
use crate::entities;

pub async fn test_db() -> Arc<Database> {
    let conn = SeaDatabase::connect("sqlite::memory:?mode=rwc")
        .await
        .unwrap();

    // Enable foreign keys
    conn.execute_unprepared("PRAGMA foreign_keys = ON")
        .await
        .unwrap();

    migration::Migrator::up(&conn, None)
        .await
        .unwrap_or_else(|e| panic!("Failed to run migrations: {}", e));

    Arc::new(Database { conn })
}

pub async fn insert_user(db: &Database, username: &str) -> entities::user::Model {
    use sea_orm::{ActiveModelBehavior, ActiveModelTrait, Set};

    let user = entities::user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password: Set(format!("hash-of-{}", username)),
        ..entities::user::ActiveModel::new()
    };
    user.insert(&db.conn).await.unwrap()
}

pub async fn insert_playlist(
    db: &Database,
    user_id: i64,
    name: &str,
) -> entities::playlist::Model {
    use sea_orm::{ActiveModelTrait, Set};

    let playlist = entities::playlist::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        ..Default::default()
    };
    playlist.insert(&db.conn).await.unwrap()
}

pub fn song(id: &str) -> crate::models::Song {
    crate::models::Song {
        id: id.to_string(),
        title: format!("Title {}", id),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        album_cover: "https://img.example.com/cover.jpg".to_string(),
        duration: 215,
        release_date: "2020-01-01".to_string(),
        popularity: 50,
        preview_url: String::new(),
        external_url: format!("https://open.spotify.com/track/{}", id),
    }
}
