use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email could not be sent: {0}")]
    Delivery(String),
}

/// Outgoing email transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Writes emails to the log instead of delivering them
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email queued");
        tracing::debug!("Email body:\n{}", email.body);
        Ok(())
    }
}

/// Keeps every email in memory so callers can inspect what was sent
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn last_to(&self, address: &str) -> Option<Email> {
        self.sent().into_iter().rev().find(|email| email.to == address)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        self.sent
            .lock()
            .map_err(|_| MailError::Delivery("outbox lock poisoned".to_string()))?
            .push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str, subject: &str) -> Email {
        Email { to: to.into(), subject: subject.into(), body: String::new() }
    }

    #[tokio::test]
    async fn recording_mailer_keeps_order() {
        let mailer = RecordingMailer::new();
        mailer.send(email("a@example.com", "first")).await.unwrap();
        mailer.send(email("b@example.com", "other")).await.unwrap();
        mailer.send(email("a@example.com", "second")).await.unwrap();

        assert_eq!(mailer.sent().len(), 3);
        assert_eq!(mailer.last_to("a@example.com").unwrap().subject, "second");
        assert!(mailer.last_to("c@example.com").is_none());
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        assert!(LogMailer.send(email("a@example.com", "hi")).await.is_ok());
    }
}
