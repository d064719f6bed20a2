use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::{claims::Claims, repo_types::Role},
    config::JwtConfig,
    state::AppState,
};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    /// Bad signature, wrong algorithm, expired or malformed claims.
    #[error("invalid or expired token")]
    InvalidOrExpired,
}

/// Signing material for session tokens, built once at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    session_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            session_ttl: Duration::from_secs((cfg.session_ttl_hours.max(0) as u64) * 3600),
        }
    }

    pub fn sign_session(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.session_ttl.as_secs() as i64);
        let claims = Claims {
            user_id,
            email: email.to_string(),
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id = %user_id, role = %role, "session token signed");
        Ok(token)
    }

    /// Only HS256 is accepted; a token signed with any other algorithm is rejected.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "session token rejected");
            TokenError::InvalidOrExpired
        })?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            session_ttl_hours: 24,
        })
    }

    fn now() -> usize {
        OffsetDateTime::now_utc().unix_timestamp() as usize
    }

    #[test]
    fn sign_and_verify_session_token() {
        let keys = keys("dev-secret");
        let user_id = Uuid::new_v4();
        let token = keys
            .sign_session(user_id, "alice@x.com", Role::Admin)
            .expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "alice@x.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = keys("secret-1")
            .sign_session(Uuid::new_v4(), "a@b.co", Role::User)
            .unwrap();
        assert!(matches!(
            keys("secret-2").verify(&token),
            Err(TokenError::InvalidOrExpired)
        ));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let claims = Claims {
            user_id: Uuid::new_v4(),
            email: "a@b.co".into(),
            role: Role::User,
            iat: now() - 7200,
            exp: now() - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(keys("dev-secret").verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_algorithm_substitution() {
        let claims = Claims {
            user_id: Uuid::new_v4(),
            email: "a@b.co".into(),
            role: Role::Admin,
            iat: now(),
            exp: now() + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(keys("dev-secret").verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_malformed_claims() {
        let claims = serde_json::json!({
            "user_id": "not-a-uuid",
            "email": "a@b.co",
            "role": "superuser",
            "iat": now(),
            "exp": now() + 3600,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(keys("dev-secret").verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(keys("dev-secret").verify("invalid.token.here").is_err());
    }
}
