mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod repo;
pub mod repo_types;
pub mod reset_tokens;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

pub fn protected_router() -> Router<AppState> {
    handlers::protected_routes()
}
