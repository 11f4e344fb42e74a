use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::http_server::{auth::AuthUser, error::ApiError, extract, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    email: String,
    password: String,
}

fn check_email(email: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("invalid email".to_string()));
    }
    Ok(())
}

fn check_not_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

pub async fn register(
    State(app_state): State<Arc<AppState>>,
    extract::Json(input): extract::Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    check_not_empty("username", &input.username)?;
    check_email(&input.email)?;
    check_not_empty("password", &input.password)?;

    let user = app_state
        .auth
        .register(&input.username, &input.email, &input.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "id": user.id })),
    ))
}

pub async fn login(
    State(app_state): State<Arc<AppState>>,
    extract::Json(input): extract::Json<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    check_email(&input.email)?;
    check_not_empty("password", &input.password)?;

    let token = app_state.auth.login(&input.email, &input.password).await?;

    Ok(Json(json!({ "token": token })))
}

pub async fn logout(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    app_state.auth.invalidate_token(user.user_id).await?;

    Ok(Json(
        json!({ "status": "successfully logged out", "id": user.user_id }),
    ))
}

pub async fn ping(_user: AuthUser) -> Json<&'static str> {
    Json("pong")
}
