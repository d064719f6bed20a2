use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

/// Outbound mail used by the password-reset flow.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .with_context(|| format!("smtp relay {}", cfg.host))?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .build();
        let from = cfg
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("parse sender {}", cfg.from))?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> anyhow::Result<()> {
        let to = to.parse::<Mailbox>().context("parse recipient")?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Password reset")
            .header(ContentType::TEXT_PLAIN)
            .body(reset_body(reset_url))
            .context("build reset email")?;
        self.transport
            .send(message)
            .await
            .context("smtp send")?;
        Ok(())
    }
}

/// Used when SMTP is not configured: the link only goes to the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> anyhow::Result<()> {
        tracing::info!(
            %to,
            reset_url = %redacted(reset_url),
            "smtp not configured; password reset link not sent"
        );
        tracing::debug!(%to, %reset_url, "password reset link");
        Ok(())
    }
}

/// Reset link with the token segment masked, for info-level logs.
fn redacted(reset_url: &str) -> String {
    match reset_url.rsplit_once('/') {
        Some((base, token)) if !token.is_empty() => format!("{base}/<redacted>"),
        _ => "<redacted>".to_string(),
    }
}

fn reset_body(reset_url: &str) -> String {
    format!(
        "We received a request to reset your password.\r\n\
         Open the link below to choose a new one. It works once and expires shortly.\r\n\r\n\
         {reset_url}\r\n\r\n\
         If you did not ask for this, you can ignore this email.\r\n"
    )
}
