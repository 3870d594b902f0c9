use std::time::Duration as StdDuration;

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde_json::json;

use super::{MailTransport, OutboundEmail};
use crate::config::AppConfig;
use crate::services::google_auth::GoogleCredentials;

const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

/// Outbound mail through the Gmail API, sharing the calendar's OAuth
/// credential shape. Unconfigured means sends are dropped with a warning.
pub struct GmailMailer {
    credentials: Option<GoogleCredentials>,
    from: String,
    client: reqwest::Client,
}

impl GmailMailer {
    pub fn from_config(config: &AppConfig) -> Self {
        let credentials = if config.calendar_configured() && !config.mail_from.is_empty() {
            Some(GoogleCredentials {
                client_id: config.google_client_id.clone(),
                client_secret: config.google_client_secret.clone(),
                refresh_token: config.google_refresh_token.clone(),
            })
        } else {
            None
        };

        Self {
            credentials,
            from: config.mail_from.clone(),
            client: reqwest::Client::builder()
                .timeout(StdDuration::from_secs(config.http_timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    /// RFC 822 multipart message, base64url-encoded the way the Gmail API
    /// expects raw payloads.
    fn encode_message(&self, message: &OutboundEmail) -> String {
        let boundary = "slotbook-alt-boundary";
        let raw = format!(
            "From: {from}\r\n\
             To: {to}\r\n\
             Subject: {subject}\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n\
             \r\n\
             --{boundary}\r\n\
             Content-Type: text/plain; charset=\"UTF-8\"\r\n\
             \r\n\
             {text}\r\n\
             --{boundary}\r\n\
             Content-Type: text/html; charset=\"UTF-8\"\r\n\
             \r\n\
             {html}\r\n\
             --{boundary}--\r\n",
            from = self.from,
            to = message.to,
            subject = message.subject,
            text = message.text_body,
            html = message.html_body,
        );
        URL_SAFE.encode(raw)
    }
}

#[async_trait]
impl MailTransport for GmailMailer {
    async fn verify(&self) -> anyhow::Result<()> {
        let credentials = self
            .credentials
            .as_ref()
            .context("mail transport not configured")?;

        // A successful token exchange is the cheapest end-to-end probe the
        // API offers.
        credentials.fetch_access_token(&self.client).await?;
        Ok(())
    }

    async fn send(&self, message: &OutboundEmail) -> anyhow::Result<()> {
        let credentials = self
            .credentials
            .as_ref()
            .context("mail transport not configured")?;

        let access_token = credentials.fetch_access_token(&self.client).await?;

        let body = json!({ "raw": self.encode_message(message) });

        let resp = self
            .client
            .post(GMAIL_SEND_URL)
            .bearer_auth(&access_token)
            .json(&body)
            .send()
            .await
            .context("failed to call Gmail send endpoint")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gmail send error ({status}): {body}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_message_contains_headers_and_parts() {
        let mailer = GmailMailer {
            credentials: None,
            from: "shop@example.com".to_string(),
            client: reqwest::Client::new(),
        };
        let message = OutboundEmail {
            to: "alice@example.com".to_string(),
            subject: "Booking confirmed".to_string(),
            text_body: "See you soon.".to_string(),
            html_body: "<p>See you soon.</p>".to_string(),
        };

        let decoded = String::from_utf8(
            URL_SAFE.decode(mailer.encode_message(&message)).unwrap(),
        )
        .unwrap();

        assert!(decoded.contains("From: shop@example.com"));
        assert!(decoded.contains("To: alice@example.com"));
        assert!(decoded.contains("Subject: Booking confirmed"));
        assert!(decoded.contains("See you soon."));
        assert!(decoded.contains("<p>See you soon.</p>"));
        assert!(decoded.contains("multipart/alternative"));
    }

    #[tokio::test]
    async fn test_unconfigured_verify_fails() {
        let mailer = GmailMailer {
            credentials: None,
            from: String::new(),
            client: reqwest::Client::new(),
        };
        assert!(mailer.verify().await.is_err());
    }
}
