pub mod gmail;

use async_trait::async_trait;

/// A transactional message: plain-text body plus an HTML alternative.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Cheap connectivity probe, run before each send attempt.
    async fn verify(&self) -> anyhow::Result<()>;

    async fn send(&self, message: &OutboundEmail) -> anyhow::Result<()>;
}
