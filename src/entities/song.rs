use sea_orm::entity::prelude::*;

/// Catalog track cached locally, keyed by the catalog id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "songs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_cover: String,
    /// Duration in seconds
    pub duration: i32,
    pub release_date: String,
    pub popularity: i32,
    pub preview_url: String,
    pub external_url: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
