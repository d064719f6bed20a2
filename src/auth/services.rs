use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        password::{hash_password, is_acceptable_password, verify_password, MIN_PASSWORD_LEN},
        repo::UserStore,
        repo_types::{NewUser, Role, User},
        reset_tokens::{generate_reset_token, ResetTokenStore},
    },
    config::AppConfig,
    error::{ApiError, RepoError, ResetTokenError},
    mailer::Mailer,
};

const MAX_FIELD_LEN: usize = 255;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    email.len() <= MAX_FIELD_LEN && EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn checked_email(raw: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    Ok(email)
}

fn checked_password(password: &str) -> Result<(), ApiError> {
    if !is_acceptable_password(password) {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Registration, login and password reset.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    reset_tokens: Arc<dyn ResetTokenStore>,
    mailer: Arc<dyn Mailer>,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        reset_tokens: Arc<dyn ResetTokenStore>,
        mailer: Arc<dyn Mailer>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            reset_tokens,
            mailer,
            config,
        }
    }

    /// Creates a `user`-role account. The returned record carries no hash.
    #[instrument(skip_all)]
    pub async fn register(&self, req: RegisterRequest) -> Result<User, ApiError> {
        let username = req.username.trim().to_string();
        if username.is_empty() || username.chars().count() > MAX_FIELD_LEN {
            return Err(ApiError::validation("Invalid username"));
        }
        let email = checked_email(&req.email)?;
        checked_password(&req.password)?;

        let password_hash = hash_password(&req.password)?;
        let user = self
            .users
            .create(NewUser {
                username,
                email,
                password_hash,
                role: Role::User,
            })
            .await
            .map_err(|e| match e {
                RepoError::DuplicateEmail => {
                    warn!("email or username already registered");
                    ApiError::DuplicateEmail
                }
                other => ApiError::Internal(other.into()),
            })?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user.without_hash())
    }

    /// Unknown email and wrong password both yield `InvalidCredentials`.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, req: LoginRequest) -> Result<User, ApiError> {
        let email = checked_email(&req.email)?;
        if req.password.is_empty() {
            return Err(ApiError::validation("Password is required"));
        }

        let user = match self.users.find_by_email(&email).await {
            Ok(u) => u,
            Err(RepoError::NotFound) => {
                warn!(email = %email, "login unknown email");
                return Err(ApiError::InvalidCredentials);
            }
            Err(e) => return Err(ApiError::Internal(e.into())),
        };

        if !verify_password(&req.password, &user.password_hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(ApiError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        Ok(user.without_hash())
    }

    /// Always succeeds for a well-formed email, whether or not an account exists.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, raw_email: &str) -> Result<(), ApiError> {
        let email = checked_email(raw_email)?;

        let user = match self.users.find_by_email(&email).await {
            Ok(u) => u,
            Err(RepoError::NotFound) => {
                info!("password reset requested for unknown email");
                return Ok(());
            }
            Err(e) => return Err(ApiError::Internal(e.into())),
        };

        match self.reset_tokens.invalidate_for_user(user.id).await {
            Ok(0) => {}
            Ok(n) => info!(user_id = %user.id, invalidated = n, "previous reset tokens invalidated"),
            Err(e) => warn!(error = %e, user_id = %user.id, "failed to invalidate previous reset tokens"),
        }

        let token = generate_reset_token();
        let expires_at =
            OffsetDateTime::now_utc() + TimeDuration::minutes(self.config.reset.ttl_minutes);
        self.reset_tokens
            .save(user.id, &token, expires_at)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;

        let reset_url = self.config.reset_url(&token);
        if let Err(e) = self.mailer.send_password_reset(&user.email, &reset_url).await {
            error!(error = %e, user_id = %user.id, "failed to send reset email");
        }

        info!(user_id = %user.id, "password reset token issued");
        Ok(())
    }

    /// Claims the token before touching the password, so a token changes it at most once.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        checked_password(new_password)?;
        let hash = hash_password(new_password)?;

        let reset = match self.reset_tokens.consume(token).await {
            Ok(Some(t)) => t,
            Ok(None) => return Err(self.refusal(token).await.into()),
            Err(e) => return Err(ApiError::Internal(e.into())),
        };

        self.users
            .update_password(reset.user_id, &hash)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => ApiError::from(ResetTokenError::NotFound),
                other => ApiError::Internal(other.into()),
            })?;

        info!(user_id = %reset.user_id, "password reset completed");
        Ok(())
    }

    /// Why a token could not be claimed.
    async fn refusal(&self, token: &str) -> ResetTokenError {
        match self.reset_tokens.find_by_token(token).await {
            Ok(t) if OffsetDateTime::now_utc() >= t.expires_at => ResetTokenError::Expired,
            Ok(_) => ResetTokenError::AlreadyUsed,
            Err(RepoError::NotFound) => ResetTokenError::NotFound,
            Err(e) => {
                warn!(error = %e, "reset token lookup failed");
                ResetTokenError::NotFound
            }
        }
    }
}
