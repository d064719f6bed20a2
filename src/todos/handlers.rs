use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    extract::{parse_id, ApiJson},
    state::AppState,
    todos::{dto::TodoRequest, repo_types::Todo},
};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_todos(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state.todos.list(user.access()).await?;
    Ok(Json(todos))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_todo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    let todo = state.todos.get(parse_id(&id)?, user.access()).await?;
    Ok(Json(todo))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn create_todo(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<TodoRequest>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = state.todos.create(payload, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn update_todo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<TodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    let todo = state
        .todos
        .update(parse_id(&id)?, payload, user.access())
        .await?;
    Ok(Json(todo))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_todo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.todos.delete(parse_id(&id)?, user.access()).await?;
    Ok(StatusCode::NO_CONTENT)
}
