use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::policy::Access,
    error::{ApiError, RepoError},
    todos::{
        dto::TodoRequest,
        repo::TodoStore,
        repo_types::{NewTodo, Todo, TodoChanges},
    },
};

const MAX_TITLE_LEN: usize = 255;

fn checked_title(raw: &str) -> Result<String, ApiError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::validation("Title is too long"));
    }
    Ok(title.to_string())
}

fn repo_err(e: RepoError) -> ApiError {
    match e {
        RepoError::NotFound => ApiError::NotFound("Todo"),
        other => ApiError::Internal(other.into()),
    }
}

pub struct TodoService {
    todos: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(todos: Arc<dyn TodoStore>) -> Self {
        Self { todos }
    }

    /// The owner is always the caller.
    #[instrument(skip(self, req))]
    pub async fn create(&self, req: TodoRequest, user_id: Uuid) -> Result<Todo, ApiError> {
        let title = checked_title(&req.title)?;
        let todo = self
            .todos
            .create(NewTodo {
                user_id,
                title,
                completed: req.completed,
            })
            .await
            .map_err(repo_err)?;
        info!(todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    pub async fn list(&self, access: Access) -> Result<Vec<Todo>, ApiError> {
        match access.list_scope() {
            None => self.todos.list_all().await,
            Some(user_id) => self.todos.list_by_user(user_id).await,
        }
        .map_err(repo_err)
    }

    /// Loads a todo and applies the ownership rule.
    async fn authorized(&self, id: Uuid, access: Access) -> Result<Todo, ApiError> {
        let todo = self.todos.find_by_id(id).await.map_err(repo_err)?;
        access.authorize(todo.user_id)?;
        Ok(todo)
    }

    pub async fn get(&self, id: Uuid, access: Access) -> Result<Todo, ApiError> {
        self.authorized(id, access).await
    }

    #[instrument(skip(self, req))]
    pub async fn update(
        &self,
        id: Uuid,
        req: TodoRequest,
        access: Access,
    ) -> Result<Todo, ApiError> {
        self.authorized(id, access).await?;
        let title = checked_title(&req.title)?;
        let todo = self
            .todos
            .update(
                id,
                TodoChanges {
                    title,
                    completed: req.completed,
                },
            )
            .await
            .map_err(repo_err)?;
        info!(todo_id = %todo.id, "todo updated");
        Ok(todo)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, access: Access) -> Result<(), ApiError> {
        self.authorized(id, access).await?;
        self.todos.delete(id).await.map_err(repo_err)?;
        info!(todo_id = %id, "todo deleted");
        Ok(())
    }
}
