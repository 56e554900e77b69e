//! Outbound notification of found slots.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::{Config, EmailSettings};

/// What happened to a notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Not attempted, with the reason
    Skipped(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<Delivery>;
}

/// Used when notifications are turned off
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, _subject: &str, _body: &str) -> Result<Delivery> {
        Ok(Delivery::Skipped(
            "notifications disabled (SEND_EMAIL is not set)".to_string(),
        ))
    }
}

/// Mails the operator's own address over SMTP with implicit TLS
pub struct SmtpNotifier {
    settings: EmailSettings,
}

impl SmtpNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        SmtpNotifier { settings }
    }

    pub fn message(&self, subject: &str, body: &str) -> Result<Message> {
        let address = self
            .settings
            .address
            .parse::<Mailbox>()
            .with_context(|| format!("Bad mail address '{}'", self.settings.address))?;
        Message::builder()
            .from(address.clone())
            .to(address)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("Failed to build message")
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<Delivery> {
        let message = self.message(subject, body)?;
        let creds = Credentials::new(
            self.settings.address.clone(),
            self.settings.app_password.expose().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.settings.smtp_host)
            .with_context(|| format!("SMTP relay error for {}", self.settings.smtp_host))?
            .port(self.settings.smtp_port)
            .credentials(creds)
            .build();

        transport.send(message).await.context("SMTP send failed")?;
        info!(
            "Mail sent to {} via {}:{}",
            self.settings.address, self.settings.smtp_host, self.settings.smtp_port
        );
        Ok(Delivery::Sent)
    }
}

/// Notifier matching the configured toggle
pub fn from_config(config: &Config) -> Box<dyn Notifier> {
    match &config.email {
        Some(settings) => Box::new(SmtpNotifier::new(settings.clone())),
        None => Box::new(DisabledNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;

    fn settings(address: &str) -> EmailSettings {
        EmailSettings {
            address: address.to_string(),
            app_password: Secret::new("pw"),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
        }
    }

    #[tokio::test]
    async fn test_disabled_notifier_skips() {
        let delivery = DisabledNotifier.send("s", "b").await.unwrap();
        assert!(matches!(delivery, Delivery::Skipped(reason) if reason.contains("SEND_EMAIL")));
    }

    #[test]
    fn test_message_is_addressed_to_self() {
        let notifier = SmtpNotifier::new(settings("me@example.com"));
        let message = notifier
            .message("【CBTS/IPA】基本情報 空き枠を検出しました（沖縄県）", "body")
            .unwrap();
        let envelope = message.envelope();
        assert_eq!(envelope.from().unwrap().to_string(), "me@example.com");
        assert_eq!(envelope.to().len(), 1);
        assert_eq!(envelope.to()[0].to_string(), "me@example.com");
    }

    #[tokio::test]
    async fn test_bad_address_is_an_error() {
        let notifier = SmtpNotifier::new(settings("not an address"));
        assert!(notifier.send("s", "b").await.is_err());
    }
}
