use crate::traits::{Notifier, NotifyError};
use async_trait::async_trait;
use notify_rust::{Notification, Timeout};
use pricewatch_config::DesktopConfig;
use std::time::Duration;

/// Local OS notification (libnotify/D-Bus, macOS Notification Center, WinRT toast).
pub struct DesktopNotifier {
    title: String,
    timeout: Duration,
}

impl DesktopNotifier {
    pub fn new(title: impl Into<String>, timeout: Duration) -> Self {
        Self {
            title: title.into(),
            timeout,
        }
    }

    pub fn from_config(title: &str, cfg: &DesktopConfig) -> Self {
        Self::new(title, Duration::from_secs(cfg.timeout_secs))
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    fn channel(&self) -> &'static str {
        "desktop"
    }

    async fn send(&self, _subject: &str, body: &str) -> Result<(), NotifyError> {
        let summary = self.title.clone();
        let body = body.to_string();
        let timeout_ms = u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX);

        // notify-rust blocks on the platform notification service.
        tokio::task::spawn_blocking(move || {
            Notification::new()
                .summary(&summary)
                .body(&body)
                .timeout(Timeout::Milliseconds(timeout_ms))
                .show()
                .map(|_| ())
                .map_err(|e| NotifyError::Desktop(e.to_string()))
        })
        .await?
    }
}
