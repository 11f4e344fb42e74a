use std::sync::Arc;

use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::Span;

use crate::database::Database;
use crate::entities;
use crate::error::{Error, Result};
use crate::models::{NewUser, User};
use crate::repository::CredentialStore;

pub struct DbCredentialStore {
    db: Arc<Database>,
    span: Span,
}

impl DbCredentialStore {
    pub fn new(db: Arc<Database>, span: Span) -> Self {
        Self { db, span }
    }

    fn found(&self, user: Option<entities::user::Model>, lookup: &str) -> Result<User> {
        match user {
            Some(user) => {
                tracing::debug!(parent: &self.span, user_id = user.id, lookup, "User found");
                Ok(user.into())
            }
            None => {
                tracing::debug!(parent: &self.span, lookup, "User not found");
                Err(Error::UserNotFound)
            }
        }
    }
}

#[async_trait::async_trait]
impl CredentialStore for DbCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<User> {
        let user = entities::user::Entity::find()
            .filter(entities::user::Column::Email.eq(email))
            .one(&self.db.conn)
            .await?;

        self.found(user, "email")
    }

    async fn find_by_id(&self, id: i64) -> Result<User> {
        let user = entities::user::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await?;

        self.found(user, "id")
    }

    async fn find_by_username_and_password(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User> {
        let user = entities::user::Entity::find()
            .filter(entities::user::Column::Username.eq(username))
            .filter(entities::user::Column::Password.eq(password_hash))
            .one(&self.db.conn)
            .await?;

        self.found(user, "username_and_password")
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let model = entities::user::ActiveModel {
            username: Set(user.username),
            email: Set(user.email),
            password: Set(user.password_hash),
            ..entities::user::ActiveModel::new()
        };

        let created = model.insert(&self.db.conn).await.map_err(|e| {
            let err = Error::from_user_insert(e);
            tracing::warn!(parent: &self.span, error = %err, "Failed to create user");
            err
        })?;

        tracing::info!(parent: &self.span, user_id = created.id, "User created");
        Ok(created.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_db;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "$2b$04$hash".into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_email() {
        let db = test_db().await;
        let store = DbCredentialStore::new(db, Span::none());

        let created = store.create(new_user("alice", "a@x.com")).await.unwrap();
        let found = store.find_by_email("a@x.com").await.unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.username, "alice");
        assert_eq!(found.password_hash, "$2b$04$hash");
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let db = test_db().await;
        let store = DbCredentialStore::new(db, Span::none());

        let created = store.create(new_user("alice", "a@x.com")).await.unwrap();
        let found = store.find_by_id(created.id).await.unwrap();

        assert_eq!(found.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let db = test_db().await;
        let store = DbCredentialStore::new(db, Span::none());

        assert!(matches!(
            store.find_by_email("nobody@x.com").await,
            Err(Error::UserNotFound)
        ));
        assert!(matches!(
            store.find_by_id(9999).await,
            Err(Error::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_find_by_username_and_password_requires_both() {
        let db = test_db().await;
        let store = DbCredentialStore::new(db, Span::none());
        store.create(new_user("alice", "a@x.com")).await.unwrap();

        let user = store
            .find_by_username_and_password("alice", "$2b$04$hash")
            .await
            .unwrap();
        assert_eq!(user.username, "alice");

        assert!(matches!(
            store
                .find_by_username_and_password("alice", "other-hash")
                .await,
            Err(Error::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_already_exists() {
        let db = test_db().await;
        let store = DbCredentialStore::new(db, Span::none());
        store.create(new_user("alice", "a@x.com")).await.unwrap();

        let result = store.create(new_user("alice2", "a@x.com")).await;
        assert!(matches!(result, Err(Error::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_duplicate_username_already_exists() {
        let db = test_db().await;
        let store = DbCredentialStore::new(db, Span::none());
        store.create(new_user("alice", "a@x.com")).await.unwrap();

        let result = store.create(new_user("alice", "b@x.com")).await;
        assert!(matches!(result, Err(Error::UserAlreadyExists)));
    }
}
