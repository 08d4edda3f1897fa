use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::env;
use std::sync::Arc;

use crate::models::User;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl SmtpConfig {
    /// SMTP settings from the environment; `None` unless `SMTP_HOST` is set
    pub fn from_env() -> Option<Self> {
        let host = env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty())?;

        Some(Self {
            host,
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: env::var("SMTP_USERNAME").unwrap_or_default(),
            password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("EMAIL_FROM").unwrap_or_else(|_| "noreply@fitstudio.local".to_string()),
            from_name: "FitStudio".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Invalid email address: {0}")]
    InvalidEmailAddress(String),
    #[error("Failed to build email: {0}")]
    BuildFailed(String),
    #[error("SMTP connection failed: {0}")]
    SmtpConnectionFailed(String),
    #[error("Email sending failed: {0}")]
    EmailSendingFailed(String),
}

/// Synchronous delivery of one message
#[cfg_attr(test, mockall::automock)]
pub trait Mailer: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| EmailError::InvalidEmailAddress(e.to_string()))?;

        let mut builder = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| EmailError::SmtpConnectionFailed(e.to_string()))?
            .port(config.port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(config.username.clone(), config.password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| EmailError::InvalidEmailAddress(e.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| EmailError::BuildFailed(e.to_string()))?;

        self.transport
            .send(&email)
            .map_err(|e| EmailError::EmailSendingFailed(e.to_string()))?;

        Ok(())
    }
}

/// Used when no SMTP server is configured: the message is only logged
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        tracing::info!("{}", LogMailer::summary(message));
        Ok(())
    }
}

impl LogMailer {
    /// Log line for an undelivered message; bodies may carry reset links and are left out
    fn summary(message: &EmailMessage) -> String {
        format!(
            "Email to {} not sent (SMTP not configured): {} ({} byte body withheld)",
            message.to,
            message.subject,
            message.body.len()
        )
    }
}

/// Picks the SMTP mailer when configured, falling back to logging
pub fn mailer_from_config(config: Option<&SmtpConfig>) -> Arc<dyn Mailer> {
    match config {
        Some(smtp) => match SmtpMailer::new(smtp) {
            Ok(mailer) => Arc::new(mailer),
            Err(e) => {
                tracing::warn!("SMTP mailer unavailable, logging emails instead: {}", e);
                Arc::new(LogMailer)
            }
        },
        None => Arc::new(LogMailer),
    }
}

/// Composes account emails and hands them to a `Mailer` on the blocking pool
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>, frontend_url: impl Into<String>) -> Self {
        Self {
            mailer,
            frontend_url: frontend_url.into(),
        }
    }

    pub fn welcome_message(&self, user: &User) -> EmailMessage {
        EmailMessage {
            to: user.email.clone(),
            subject: "Welcome to FitStudio".to_string(),
            body: format!(
                "Hi {},\n\nYour FitStudio account is ready. Browse trainings and book your first session at {}.\n\nSee you at the studio!",
                user.name, self.frontend_url
            ),
        }
    }

    pub fn password_reset_message(&self, user: &User, token: &str) -> EmailMessage {
        EmailMessage {
            to: user.email.clone(),
            subject: "FitStudio password reset".to_string(),
            body: format!(
                "Hi {},\n\nUse the link below to choose a new password. It is valid for one hour.\n\n{}/reset-password?token={}\n\nIf you did not request a reset, ignore this email.",
                user.name,
                self.frontend_url.trim_end_matches('/'),
                token
            ),
        }
    }

    pub async fn send_welcome(&self, user: &User) -> Result<(), EmailError> {
        self.deliver(self.welcome_message(user)).await
    }

    pub async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), EmailError> {
        self.deliver(self.password_reset_message(user, token)).await
    }

    async fn deliver(&self, message: EmailMessage) -> Result<(), EmailError> {
        let mailer = self.mailer.clone();
        let to = message.to.clone();

        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| EmailError::EmailSendingFailed(e.to_string()))??;

        tracing::info!("Sent email to {}", to);
        Ok(())
    }
}
