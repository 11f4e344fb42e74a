use std::sync::Arc;

use sea_orm::prelude::Expr;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelBehavior, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::Span;

use crate::database::Database;
use crate::entities::{self, token::TokenStatus};
use crate::error::Result;
use crate::models::NewToken;
use crate::repository::SessionStore;

pub struct DbSessionStore {
    db: Arc<Database>,
    span: Span,
}

impl DbSessionStore {
    pub fn new(db: Arc<Database>, span: Span) -> Self {
        Self { db, span }
    }
}

#[async_trait::async_trait]
impl SessionStore for DbSessionStore {
    async fn save_token(&self, token: NewToken) -> Result<()> {
        let user_id = token.user_id;
        let model = entities::token::ActiveModel {
            token: Set(token.token),
            expires_at: Set(token.expires_at),
            user_id: Set(token.user_id),
            ..entities::token::ActiveModel::new()
        };

        // tokens.user_id is unique, so an existing row is overwritten in place
        entities::token::Entity::insert(model)
            .on_conflict(
                OnConflict::column(entities::token::Column::UserId)
                    .update_columns([
                        entities::token::Column::Token,
                        entities::token::Column::ExpiresAt,
                        entities::token::Column::Status,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db.conn)
            .await
            .inspect_err(|e| {
                tracing::error!(parent: &self.span, user_id, error = %e, "Failed to save token")
            })?;

        tracing::debug!(parent: &self.span, user_id, "Token saved");
        Ok(())
    }

    async fn invalidate(&self, user_id: i64) -> Result<()> {
        let result = entities::token::Entity::update_many()
            .col_expr(
                entities::token::Column::Status,
                Expr::value(TokenStatus::Inactive),
            )
            .filter(entities::token::Column::UserId.eq(user_id))
            .filter(entities::token::Column::Status.eq(TokenStatus::Active))
            .exec(&self.db.conn)
            .await
            .inspect_err(|e| {
                tracing::error!(parent: &self.span, user_id, error = %e, "Failed to invalidate token")
            })?;

        tracing::debug!(
            parent: &self.span,
            user_id,
            invalidated = result.rows_affected,
            "Tokens invalidated"
        );
        Ok(())
    }

    async fn is_valid(&self, token: &str) -> Result<bool> {
        let row = entities::token::Entity::find()
            .filter(entities::token::Column::Token.eq(token))
            .one(&self.db.conn)
            .await?;

        Ok(row.is_some_and(|row| row.status == TokenStatus::Active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_user, test_db};
    use chrono::{Duration, Utc};
    use sea_orm::PaginatorTrait;

    fn new_token(user_id: i64, token: &str) -> NewToken {
        NewToken {
            token: token.into(),
            expires_at: Utc::now() + Duration::hours(1),
            user_id,
        }
    }

    async fn rows_for(db: &Database, user_id: i64) -> Vec<entities::token::Model> {
        entities::token::Entity::find()
            .filter(entities::token::Column::UserId.eq(user_id))
            .all(&db.conn)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_saved_token_is_valid() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;
        let store = DbSessionStore::new(db, Span::none());

        store.save_token(new_token(user.id, "tok-1")).await.unwrap();

        assert!(store.is_valid("tok-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_valid() {
        let db = test_db().await;
        let store = DbSessionStore::new(db, Span::none());

        assert!(!store.is_valid("never-issued").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_twice_keeps_one_active_row() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;
        let store = DbSessionStore::new(db.clone(), Span::none());

        store.save_token(new_token(user.id, "tok-1")).await.unwrap();
        store.save_token(new_token(user.id, "tok-2")).await.unwrap();

        let rows = rows_for(&db, user.id).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].token, "tok-2");
        assert_eq!(rows[0].status, TokenStatus::Active);

        // The overwritten token no longer matches any row
        assert!(!store.is_valid("tok-1").await.unwrap());
        assert!(store.is_valid("tok-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_reactivates_invalidated_row() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;
        let store = DbSessionStore::new(db.clone(), Span::none());

        store.save_token(new_token(user.id, "tok-1")).await.unwrap();
        store.invalidate(user.id).await.unwrap();
        store.save_token(new_token(user.id, "tok-2")).await.unwrap();

        let rows = rows_for(&db, user.id).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, TokenStatus::Active);
        assert!(store.is_valid("tok-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalidate_only_affects_that_user() {
        let db = test_db().await;
        let alice = insert_user(&db, "alice").await;
        let bob = insert_user(&db, "bob").await;
        let store = DbSessionStore::new(db.clone(), Span::none());

        store.save_token(new_token(alice.id, "tok-a")).await.unwrap();
        store.save_token(new_token(bob.id, "tok-b")).await.unwrap();

        store.invalidate(alice.id).await.unwrap();

        assert!(!store.is_valid("tok-a").await.unwrap());
        assert!(store.is_valid("tok-b").await.unwrap());

        // Rows are kept, only flipped to inactive
        let total = entities::token::Entity::find().count(&db.conn).await.unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let db = test_db().await;
        let user = insert_user(&db, "alice").await;
        let store = DbSessionStore::new(db, Span::none());

        // No token at all
        store.invalidate(user.id).await.unwrap();

        store.save_token(new_token(user.id, "tok-1")).await.unwrap();
        store.invalidate(user.id).await.unwrap();
        store.invalidate(user.id).await.unwrap();

        assert!(!store.is_valid("tok-1").await.unwrap());
    }
}
