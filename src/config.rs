use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub max_lifetime_secs: u64,
}

impl DbConfig {
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfig {
    pub ttl_minutes: i64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub reset: ResetConfig,
    pub frontend_url: String,
    /// `None` when SMTP credentials are not configured; mail is then only logged.
    pub smtp: Option<SmtpConfig>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let db = DbConfig {
            url: std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
            max_connections: env_or("DB_MAX_CONNECTIONS", 25),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 300),
        };

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        anyhow::ensure!(!secret.is_empty(), "JWT_SECRET must not be empty");
        let jwt = JwtConfig {
            secret,
            session_ttl_hours: env_or("SESSION_TTL_HOURS", 24),
        };

        let reset = ResetConfig {
            ttl_minutes: env_or("RESET_TOKEN_TTL_MINUTES", 60),
            cleanup_interval_secs: env_or("RESET_TOKEN_CLEANUP_SECS", 3600),
        };

        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let smtp = match (std::env::var("SMTP_USER"), std::env::var("SMTP_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() => Some(SmtpConfig {
                host: std::env::var("SMTP_HOST")
                    .unwrap_or_else(|_| "sandbox.smtp.mailtrap.io".into()),
                port: env_or("SMTP_PORT", 2525),
                from: std::env::var("SMTP_FROM").unwrap_or_else(|_| username.clone()),
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            db,
            jwt,
            reset,
            frontend_url,
            smtp,
        })
    }

    /// Link a user follows to choose a new password.
    pub fn reset_url(&self, token: &str) -> String {
        format!("{}/reset-password/{}", self.frontend_url, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_url_joins_frontend_base() {
        let cfg = crate::testing::test_config();
        assert_eq!(
            cfg.reset_url("abc123"),
            "http://localhost:3000/reset-password/abc123"
        );
    }

    #[test]
    fn env_or_falls_back_on_garbage() {
        std::env::set_var("TODO_API_TEST_NUMBER", "not-a-number");
        assert_eq!(env_or("TODO_API_TEST_NUMBER", 7u32), 7);
        std::env::set_var("TODO_API_TEST_NUMBER", "42");
        assert_eq!(env_or("TODO_API_TEST_NUMBER", 7u32), 42);
    }
}
