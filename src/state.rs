use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{PgUserStore, UserStore},
        reset_tokens::{PgResetTokenStore, ResetTokenStore},
        services::AuthService,
    },
    config::AppConfig,
    db,
    mailer::{LogMailer, Mailer, SmtpMailer},
    todos::{
        repo::{PgTodoStore, TodoStore},
        services::TodoService,
    },
};

/// Shared, read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub auth: Arc<AuthService>,
    pub todos: Arc<TodoService>,
    pub reset_tokens: Arc<dyn ResetTokenStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.db).await?;

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
            None => {
                tracing::warn!("SMTP_USER/SMTP_PASSWORD not set; reset links will only be logged");
                Arc::new(LogMailer)
            }
        };

        Ok(Self::from_parts(
            db.clone(),
            config,
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgTodoStore::new(db.clone())),
            Arc::new(PgResetTokenStore::new(db)),
            mailer,
        ))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        todos: Arc<dyn TodoStore>,
        reset_tokens: Arc<dyn ResetTokenStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let jwt = JwtKeys::new(&config.jwt);
        let auth = Arc::new(AuthService::new(
            users,
            reset_tokens.clone(),
            mailer,
            config.clone(),
        ));
        Self {
            db,
            config,
            jwt,
            auth,
            todos: Arc::new(TodoService::new(todos)),
            reset_tokens,
        }
    }
}
