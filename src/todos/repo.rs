use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::RepoError;
use crate::todos::repo_types::{NewTodo, Todo, TodoChanges};

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn create(&self, todo: NewTodo) -> Result<Todo, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Todo, RepoError>;
    /// Newest first.
    async fn list_all(&self) -> Result<Vec<Todo>, RepoError>;
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Todo>, RepoError>;
    /// Rewrites title and completion, bumps `updated_at`; the owner is untouched.
    async fn update(&self, id: Uuid, changes: TodoChanges) -> Result<Todo, RepoError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Clone)]
pub struct PgTodoStore {
    db: PgPool,
}

impl PgTodoStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    #[instrument(skip(self, todo), fields(user_id = %todo.user_id))]
    async fn create(&self, todo: NewTodo) -> Result<Todo, RepoError> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (id, user_id, title, completed)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, completed, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(todo.user_id)
        .bind(&todo.title)
        .bind(todo.completed)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Todo, RepoError> {
        sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, title, completed, created_at, updated_at
            FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<Todo>, RepoError> {
        let rows = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, title, completed, created_at, updated_at
            FROM todos
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Todo>, RepoError> {
        let rows = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, title, completed, created_at, updated_at
            FROM todos
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: Uuid, changes: TodoChanges) -> Result<Todo, RepoError> {
        sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET title = $2, completed = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, title, completed, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(changes.completed)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let res = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
