use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{Span, instrument};

use crate::error::{Error, Result};
use crate::models::{NewToken, NewUser, TokenClaims, User};
use crate::repository::{CredentialStore, SessionStore};
use crate::security;

/// Only the HMAC family is accepted when verifying.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

/// Issues, verifies and revokes session tokens.
///
/// Tokens are signed JWTs that are also persisted through the [`SessionStore`].
/// A token only authenticates while its persisted row is active, which is what
/// lets logout take effect before the token expires.
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    settings: AuthSettings,
    span: Span,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        settings: AuthSettings,
        span: Span,
    ) -> Self {
        Self {
            credentials,
            sessions,
            settings,
            span,
        }
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        self.credentials.create(user).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<User> {
        self.credentials.find_by_email(email).await
    }

    /// Signs a token for the user and records it as their active session.
    ///
    /// `password_hash` is the stored hash; the plain password has already been
    /// checked against it by the caller.
    #[instrument(parent = &self.span, skip(self, password_hash))]
    pub async fn create_token(&self, username: &str, password_hash: &str) -> Result<String> {
        let user = self
            .credentials
            .find_by_username_and_password(username, password_hash)
            .await?;

        let now = Utc::now();
        let expires_at = now + self.settings.token_ttl;
        let claims = TokenClaims {
            user_id: user.id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.settings.secret.as_bytes()),
        )
        .map_err(Error::TokenSigning)?;

        // Not handed out unless it was recorded
        self.sessions
            .save_token(NewToken {
                token: token.clone(),
                expires_at,
                user_id: user.id,
            })
            .await?;

        tracing::info!(user_id = user.id, "Token issued");
        Ok(token)
    }

    /// Verifies signature, algorithm and expiry and returns the user id claim.
    pub fn parse_token(&self, token: &str) -> Result<i64> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();

        let data = jsonwebtoken::decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.settings.secret.as_bytes()),
            &validation,
        )
        .inspect_err(|e| tracing::debug!(parent: &self.span, error = %e, "Rejected token"))?;

        Ok(data.claims.user_id)
    }

    pub async fn invalidate_token(&self, user_id: i64) -> Result<()> {
        self.sessions.invalidate(user_id).await
    }

    pub async fn is_token_valid(&self, token: &str) -> Result<bool> {
        self.sessions.is_valid(token).await
    }

    #[instrument(parent = &self.span, skip(self, password))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        match self.find_user_by_email(email).await {
            Ok(_) => return Err(Error::UserAlreadyExists),
            Err(Error::UserNotFound) => {}
            Err(e) => return Err(e),
        }

        let password_hash = security::hash_password(password, self.settings.bcrypt_cost)?;

        self.create_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await
    }

    /// Unknown email and wrong password are reported the same way.
    #[instrument(parent = &self.span, skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let user = self.find_user_by_email(email).await.map_err(|e| match e {
            Error::UserNotFound => Error::InvalidCredentials,
            e => e,
        })?;

        if !security::verify_password(password, &user.password_hash)? {
            tracing::info!(user_id = user.id, "Wrong password");
            return Err(Error::InvalidCredentials);
        }

        self.create_token(&user.username, &user.password_hash).await
    }

    /// Resolves a bearer token to its user id. The token must verify and still
    /// be the user's active session.
    pub async fn authenticate(&self, token: &str) -> Result<i64> {
        let user_id = self.parse_token(token)?;

        if !self.is_token_valid(token).await? {
            tracing::debug!(parent: &self.span, user_id, "Token is no longer active");
            return Err(Error::InvalidToken("token has been revoked".to_string()));
        }

        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::repository::{DbCredentialStore, DbSessionStore, MockSessionStore};
    use crate::test_utils::test_db;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use sea_orm::DbErr;

    const SECRET: &str = "test-secret";

    fn settings() -> AuthSettings {
        AuthSettings {
            secret: SECRET.into(),
            token_ttl: Duration::hours(1),
            bcrypt_cost: 4,
        }
    }

    fn service_with(db: Arc<Database>, settings: AuthSettings) -> AuthService {
        AuthService::new(
            Arc::new(DbCredentialStore::new(db.clone(), Span::none())),
            Arc::new(DbSessionStore::new(db, Span::none())),
            settings,
            Span::none(),
        )
    }

    async fn service() -> AuthService {
        service_with(test_db().await, settings())
    }

    fn sign(claims: &TokenClaims, algorithm: Algorithm, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(algorithm),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims_for(user_id: i64) -> TokenClaims {
        let now = Utc::now();
        TokenClaims {
            user_id,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        }
    }

    #[tokio::test]
    async fn test_no_session_means_no_valid_token() {
        let service = service().await;
        let alice = service.register("alice", "a@x.com", "pw1").await.unwrap();

        let forged = sign(&claims_for(alice.id), Algorithm::HS256, SECRET);

        assert!(!service.is_token_valid(&forged).await.unwrap());
        assert!(!service.is_token_valid("anything").await.unwrap());
        assert!(matches!(
            service.authenticate(&forged).await,
            Err(Error::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_created_token_is_valid_and_parses() {
        let service = service().await;
        let alice = service.register("alice", "a@x.com", "pw1").await.unwrap();

        let token = service
            .create_token("alice", &alice.password_hash)
            .await
            .unwrap();

        assert!(service.is_token_valid(&token).await.unwrap());
        assert_eq!(service.parse_token(&token).unwrap(), alice.id);
        assert_eq!(service.authenticate(&token).await.unwrap(), alice.id);
    }

    #[tokio::test]
    async fn test_create_token_for_unknown_user() {
        let service = service().await;

        assert!(matches!(
            service.create_token("ghost", "hash").await,
            Err(Error::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_invalidate_only_affects_that_user() {
        let service = service().await;
        service.register("alice", "a@x.com", "pw1").await.unwrap();
        service.register("bob", "b@x.com", "pw2").await.unwrap();

        let alice_token = service.login("a@x.com", "pw1").await.unwrap();
        let bob_token = service.login("b@x.com", "pw2").await.unwrap();
        let alice_id = service.parse_token(&alice_token).unwrap();

        service.invalidate_token(alice_id).await.unwrap();

        assert!(!service.is_token_valid(&alice_token).await.unwrap());
        assert!(service.is_token_valid(&bob_token).await.unwrap());
        assert!(service.authenticate(&alice_token).await.is_err());
        assert!(service.authenticate(&bob_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_token_not_returned_when_save_fails() {
        let db = test_db().await;
        let credentials = Arc::new(DbCredentialStore::new(db, Span::none()));
        let user = credentials
            .create(NewUser {
                username: "alice".into(),
                email: "a@x.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        let mut sessions = MockSessionStore::new();
        sessions
            .expect_save_token()
            .times(1)
            .returning(|_| Err(Error::Storage(DbErr::Custom("disk full".into()))));

        let service = AuthService::new(credentials, Arc::new(sessions), settings(), Span::none());

        let result = service.create_token("alice", &user.password_hash).await;
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let service = service().await;
        let past = Utc::now() - Duration::hours(2);
        let claims = TokenClaims {
            user_id: 1,
            iat: past.timestamp(),
            exp: (past + Duration::hours(1)).timestamp(),
        };

        let token = sign(&claims, Algorithm::HS256, SECRET);

        assert!(matches!(
            service.parse_token(&token),
            Err(Error::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_token_past_its_ttl_is_rejected() {
        let service = service_with(
            test_db().await,
            AuthSettings {
                token_ttl: Duration::seconds(-120),
                ..settings()
            },
        );
        let alice = service.register("alice", "a@x.com", "pw1").await.unwrap();

        let token = service
            .create_token("alice", &alice.password_hash)
            .await
            .unwrap();

        assert!(service.parse_token(&token).is_err());
    }

    #[tokio::test]
    async fn test_other_hmac_variants_are_accepted() {
        let service = service().await;

        let token = sign(&claims_for(7), Algorithm::HS512, SECRET);

        assert_eq!(service.parse_token(&token).unwrap(), 7);
    }

    #[tokio::test]
    async fn test_unsigned_token_is_rejected() {
        let service = service().await;
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims_for(1)).unwrap());

        let token = format!("{header}.{payload}.");

        assert!(matches!(
            service.parse_token(&token),
            Err(Error::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected() {
        let service = service().await;

        let token = sign(&claims_for(1), Algorithm::HS256, "another-secret");

        assert!(matches!(
            service.parse_token(&token),
            Err(Error::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = service().await;
        service.register("alice", "a@x.com", "pw1").await.unwrap();

        assert!(matches!(
            service.register("alice2", "a@x.com", "pw1").await,
            Err(Error::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_register_stores_hash() {
        let service = service().await;

        let user = service.register("alice", "a@x.com", "pw1").await.unwrap();

        assert_ne!(user.password_hash, "pw1");
        assert!(security::verify_password("pw1", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let service = service().await;
        service.register("alice", "a@x.com", "pw1").await.unwrap();

        assert!(matches!(
            service.login("a@x.com", "wrong").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody@x.com", "pw1").await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_logout_then_login_again() {
        let service = service().await;
        service.register("alice", "a@x.com", "pw1").await.unwrap();

        let first = service.login("a@x.com", "pw1").await.unwrap();
        let user_id = service.authenticate(&first).await.unwrap();
        service.invalidate_token(user_id).await.unwrap();
        assert!(service.authenticate(&first).await.is_err());

        let second = service.login("a@x.com", "pw1").await.unwrap();
        assert_eq!(service.authenticate(&second).await.unwrap(), user_id);
    }
}
