//! Notification email delivery.
//!
//! Handlers talk to a [`Mailer`]; production uses the SMTP relay, and a disabled
//! mailer stands in when no relay is configured.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::errors::AppError;

/// Subject of the subscription notification.
pub const NOTIFICATION_SUBJECT: &str = "Welcome to ImpactMakers";

/// Plain-text body of the subscription notification.
pub const NOTIFICATION_BODY: &str = "Thank you for subscribing to ImpactMakers!\n\n\
You will now hear about new volunteer opportunities, upcoming events and stories \
from our community as soon as they are posted.\n\n\
Together we make an impact.\nThe ImpactMakers Team";

/// A single outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    /// The fixed subscription notification for `to`.
    pub fn notification(to: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: NOTIFICATION_SUBJECT.to_string(),
            body: NOTIFICATION_BODY.to_string(),
        }
    }
}

/// Sends mail and reports the relay's response line.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<String, AppError>;
}

/// SMTP relay mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self, AppError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<String, AppError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;

        let response = self.transport.send(message).await?;
        let text = response.message().collect::<Vec<_>>().join(" ");
        tracing::info!("Mail relay accepted message to {}: {}", mail.to, response.code());

        Ok(format!("{} {}", response.code(), text))
    }
}

/// Mailer used when no relay is configured; every send fails.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<String, AppError> {
        Err(AppError::Mail(format!(
            "No mail relay configured, dropping mail to {}",
            mail.to
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_mailer_fails() {
        let result = DisabledMailer
            .send(OutgoingMail::notification("ada@example.com"))
            .await;
        assert!(matches!(result, Err(AppError::Mail(_))));
    }

    #[tokio::test]
    async fn test_smtp_mailer_rejects_bad_sender() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        assert!(SmtpMailer::new(&config, "ImpactMakers <no-reply@impactmakers.org>").is_ok());
        assert!(SmtpMailer::new(&config, "not an address").is_err());
    }
}
