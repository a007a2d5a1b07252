//! Account endpoints.
//!
//! - `POST /api/auth/register`, `POST /api/auth/login`
//! - `GET /api/auth/me`
//! - `POST /api/auth/forgot-password`, `POST /api/auth/reset-password`

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::auth::AuthSession;
use crate::models::UserProfile;

pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a reset link has been sent.";
pub const RESET_PASSWORD_MESSAGE: &str = "Password reset successful. You can now log in.";

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `POST /api/auth/register`: create an account and sign in.
pub async fn register(
    State(ctx): State<ApiContext>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let Json(req) = body?;
    let session = ctx
        .core
        .auth
        .register(&ctx.core.db, &req.email, &req.password, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let Json(req) = body?;
    let session = ctx
        .core
        .auth
        .login(&ctx.core.db, &req.email, &req.password)
        .await?;
    Ok(Json(session))
}

/// `GET /api/auth/me`: the signed-in user.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = ctx.core.auth.current_user(&ctx.core.db, &user.user_id)?;
    Ok(Json(profile))
}

/// `POST /api/auth/forgot-password`: same answer whether or not the
/// account exists.
pub async fn forgot_password(
    State(ctx): State<ApiContext>,
    body: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body?;
    ctx.core.auth.forgot_password(&ctx.core.db, &req.email).await?;
    Ok(Json(MessageResponse {
        message: FORGOT_PASSWORD_MESSAGE,
    }))
}

/// `POST /api/auth/reset-password`
pub async fn reset_password(
    State(ctx): State<ApiContext>,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body?;
    ctx.core
        .auth
        .reset_password(&ctx.core.db, &req.token, &req.password)
        .await?;
    Ok(Json(MessageResponse {
        message: RESET_PASSWORD_MESSAGE,
    }))
}
