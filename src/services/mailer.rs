use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("Failed to write email: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound confirmation-mail collaborator. Callers treat dispatch as
/// best-effort; a failed send must never fail the surrounding request.
#[async_trait]
pub trait ConfirmationMailer: Send + Sync {
    async fn send_confirmation_email(&self, to: &str, token: &str) -> Result<(), MailerError>;
}

/// Writes emails to an outbox directory instead of talking to an SMTP relay.
pub struct FileMailer {
    outbox_dir: PathBuf,
    base_url: String,
}

impl FileMailer {
    pub fn new(outbox_dir: PathBuf, base_url: String) -> Self {
        Self { outbox_dir, base_url }
    }
}

#[async_trait]
impl ConfirmationMailer for FileMailer {
    async fn send_confirmation_email(&self, to: &str, token: &str) -> Result<(), MailerError> {
        let confirmation_url = format!("{}/auth/confirm/{}", self.base_url, token);

        let body = format!(
            "To: {to}\n\
             Subject: Confirm your account\n\n\
             Hello,\n\n\
             Please confirm your account by clicking the following link:\n\n\
             {confirmation_url}\n\n\
             If you did not register for this account, please ignore this email.\n"
        );

        tokio::fs::create_dir_all(&self.outbox_dir).await?;

        let filename = format!(
            "{}_{}.txt",
            Utc::now().format("%Y-%m-%d_%H-%M-%S"),
            Uuid::new_v4()
        );
        tokio::fs::write(self.outbox_dir.join(filename), body).await?;

        Ok(())
    }
}
