use sea_orm::{DbErr, SqlErr};

/// Errors surfaced by the stores and services.
///
/// Stores translate storage failures into a specific kind where the mapping is
/// unambiguous (zero rows affected, unique constraint violated); everything
/// else is passed through as [`Error::Storage`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("user not found")]
    UserNotFound,
    /// Also returned when the playlist exists but belongs to someone else.
    #[error("playlist not found")]
    PlaylistNotFound,
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("user does not own this playlist")]
    PermissionDenied,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("track {0} not found in catalog")]
    TrackNotFound(String),
    #[error("catalog request failed: {0}")]
    Catalog(String),
    #[error("storage failure: {0}")]
    Storage(#[from] DbErr),
    #[error("failed to sign token: {0}")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),
    #[error("failed to hash password: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::UserNotFound | Error::PlaylistNotFound | Error::TrackNotFound(_)
        )
    }

    /// Maps an insert failure: only a unique constraint violation reported by
    /// the driver means the record already exists.
    pub(crate) fn from_user_insert(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Error::UserAlreadyExists,
            _ => Error::Storage(err),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::InvalidToken(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
