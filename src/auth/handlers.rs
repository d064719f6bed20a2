use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
            ProtectedResponse, PublicUser, RegisterRequest, ResetPasswordRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
    },
    error::ApiError,
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/:token", post(reset_password))
}

/// Routes mounted behind the auth middleware.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/protected", get(protected))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let user = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, keys, payload))]
pub async fn login(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state.auth.authenticate(payload).await?;
    let token = keys
        .sign_session(user.id, &user.email, user.role)
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        role: user.role,
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.forgot_password(&payload.email).await?;
    Ok(Json(MessageResponse::new(
        "If the email is registered, a password reset link has been sent",
    )))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.reset_password(&token, &payload.password).await?;
    Ok(Json(MessageResponse::new("Password reset successfully")))
}

pub async fn protected(user: AuthUser) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "Access granted".into(),
        user_id: user.user_id,
        email: user.email,
        role: user.role,
    })
}
