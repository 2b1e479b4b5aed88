//! SMTP implementation of the email service port

use crate::config::EmailConfig;
use crate::ports::email_service::{EmailService as EmailServiceTrait, Result};
use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::str::FromStr;

/// EmailServiceのSMTP実装
///
/// 1回の呼び出しで1通のメッセージを作り、全宛先をBccに入れて送る。
/// 送信はブロッキングなので tokio のブロッキングプールで実行する。
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// 送信するメッセージを組み立てる
    ///
    /// 解釈できない宛先はログに残して除外し、残りの宛先に送る。
    /// 有効な宛先が1件もなければ None。
    fn build_message(&self, body: &str, recipients: &[String]) -> Result<Option<Message>> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Library");
        let from = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))?;

        let mut builder = Message::builder()
            .from(from.clone())
            .to(from)
            .subject(self.config.subject.as_str())
            .header(ContentType::TEXT_PLAIN);

        let mut accepted = 0;
        for recipient in recipients {
            match Mailbox::from_str(recipient) {
                Ok(mailbox) => {
                    builder = builder.bcc(mailbox);
                    accepted += 1;
                }
                Err(e) => {
                    tracing::warn!(recipient = %recipient, error = %e, "skipping invalid recipient");
                }
            }
        }

        if accepted == 0 {
            return Ok(None);
        }

        Ok(Some(builder.body(body.to_string())?))
    }

    fn build_transport(&self) -> Result<SmtpTransport> {
        let builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let builder = match (&self.config.smtp_username, &self.config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(builder.build())
    }
}

#[async_trait]
impl EmailServiceTrait for EmailService {
    async fn send_mails(&self, message: &str, recipients: &[String]) -> Result<()> {
        if recipients.is_empty() {
            return Ok(());
        }

        let Some(email) = self.build_message(message, recipients)? else {
            tracing::warn!("no deliverable recipients, nothing sent");
            return Ok(());
        };
        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await??;

        tracing::info!(recipients = recipients.len(), "late loan mail sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EmailService {
        EmailService::new(EmailConfig::default())
    }

    #[test]
    fn test_build_message_puts_recipients_in_bcc() {
        let recipients = vec![
            "fulano@email.com".to_string(),
            "ciclano@email.com".to_string(),
        ];
        let message = service()
            .build_message("late!", &recipients)
            .unwrap()
            .unwrap();

        let envelope = message.envelope();
        let to: Vec<String> = envelope.to().iter().map(|a| a.to_string()).collect();
        assert!(to.contains(&"fulano@email.com".to_string()));
        assert!(to.contains(&"ciclano@email.com".to_string()));

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(!formatted.contains("fulano@email.com"));
        assert!(formatted.contains("Subject: Late book loan"));
    }

    #[test]
    fn test_build_message_skips_invalid_addresses() {
        let recipients = vec![
            "a..b@x.com".to_string(),
            ".a@x.com".to_string(),
            "a@[127.0.0.1]".to_string(),
            "good@example.com".to_string(),
        ];
        let message = service()
            .build_message("late!", &recipients)
            .unwrap()
            .unwrap();

        let to: Vec<String> = message
            .envelope()
            .to()
            .iter()
            .map(|a| a.to_string())
            .collect();
        assert!(to.contains(&"good@example.com".to_string()));
        assert!(!to.iter().any(|a| a.contains("x.com") || a.contains("127.0.0.1")));
    }

    #[test]
    fn test_build_message_without_valid_address_is_none() {
        let recipients = vec!["not an address".to_string()];
        assert!(
            service()
                .build_message("late!", &recipients)
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_send_mails_with_only_invalid_addresses_is_ok() {
        let recipients = vec!["a..b@x.com".to_string()];
        assert!(service().send_mails("late!", &recipients).await.is_ok());
    }
}
