use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::{extractors::AuthUser, jwt::JwtKeys};
use crate::error::ApiError;

/// Gate for protected routes.
///
/// Missing header, a header that is not `Bearer <token>`, and a token that
/// fails verification each end the request with 401. On success the caller's
/// identity is stored in the request extensions for [`AuthUser`].
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::Unauthorized("Authorization header required"))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("Invalid token format"))?;

    let claims = keys.verify(token).map_err(|_| {
        warn!(path = %request.uri().path(), "invalid or expired token");
        ApiError::Unauthorized("Invalid or expired token")
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}
