use axum::{
    Json,
    body::Body,
    extract::rejection::{JsonRejection, PathRejection},
    http::{Response, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

use crate::error::Error;

/// Error returned from handlers, rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Domain(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Domain(err) => match err {
                err if err.is_not_found() => StatusCode::NOT_FOUND,
                Error::UserAlreadyExists => StatusCode::CONFLICT,
                Error::PermissionDenied => StatusCode::FORBIDDEN,
                Error::InvalidCredentials | Error::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                Error::Catalog(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response<Body> {
        let status = self.status();

        let message = match self {
            ApiError::BadRequest(message) | ApiError::Unauthorized(message) => message,
            ApiError::Domain(err) if status.is_server_error() => {
                tracing::error!(error = ?err, "Request failed");
                match err {
                    Error::Catalog(_) => "catalog is unavailable".to_string(),
                    _ => "internal server error".to_string(),
                }
            }
            ApiError::Domain(err) => err.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::PlaylistNotFound, StatusCode::NOT_FOUND),
            (Error::TrackNotFound("t".into()), StatusCode::NOT_FOUND),
            (Error::UserAlreadyExists, StatusCode::CONFLICT),
            (Error::PermissionDenied, StatusCode::FORBIDDEN),
            (Error::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (Error::InvalidToken("expired".into()), StatusCode::UNAUTHORIZED),
            (Error::Catalog("timeout".into()), StatusCode::BAD_GATEWAY),
            (
                Error::Storage(DbErr::Custom("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
