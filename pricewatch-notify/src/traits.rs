use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("desktop notification failed: {0}")]
    Desktop(String),

    #[error("invalid mail address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("mail message build failed: {0}")]
    Message(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("notification task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// One delivery channel for alerts.
///
/// `subject` is the product the alert is about; `body` is the full
/// multi-line alert text. Channels decide how to title the message.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name used in logs and dispatch reports.
    fn channel(&self) -> &'static str;

    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}
