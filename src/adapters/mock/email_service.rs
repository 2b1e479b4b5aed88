use crate::ports::email_service::{EmailService as EmailServiceTrait, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// A mail that was handed to the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub message: String,
    pub recipients: Vec<String>,
}

/// Mock implementation of EmailService
///
/// Does not deliver anything. Records every call so tests can
/// assert on what would have been sent, and can be switched to fail.
pub struct EmailService {
    sent: Mutex<Vec<SentMail>>,
    failing: Mutex<bool>,
}

impl EmailService {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: Mutex::new(false),
        }
    }

    /// Make subsequent calls fail
    pub fn fail_with_error(&self) {
        *self.failing.lock().unwrap() = true;
    }

    /// All recorded calls in order
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for EmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailServiceTrait for EmailService {
    async fn send_mails(&self, message: &str, recipients: &[String]) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err("mock email service failure".into());
        }

        tracing::info!(recipients = recipients.len(), "mock email service: mails not delivered");
        self.sent.lock().unwrap().push(SentMail {
            message: message.to_string(),
            recipients: recipients.to_vec(),
        });
        Ok(())
    }
}
