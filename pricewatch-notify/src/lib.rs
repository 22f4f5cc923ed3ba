//! Alert delivery for price and stock changes.
//!
//! This crate exposes a common [`traits::Notifier`] interface, the concrete
//! desktop and SMTP channels, and [`Notifiers`], the fan-out used by the
//! tracker. A failing channel is logged and skipped; it never stops the
//! remaining channels or the tracking run.
//!
//! # Examples
//! ```no_run
//! use pricewatch_config::NotifyConfig;
//! use pricewatch_notify::Notifiers;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), pricewatch_notify::traits::NotifyError> {
//! let notifiers = Notifiers::from_config(&NotifyConfig::default())?;
//! let report = notifiers
//!     .notify("GPU A", "GPU A\nPrice dropped! Previous: $999, Now: $899")
//!     .await;
//! assert!(report.failed.is_empty());
//! # Ok(())
//! # }
//! ```
pub mod desktop;
pub mod email;
pub mod traits;

use desktop::DesktopNotifier;
use email::EmailNotifier;
use pricewatch_config::NotifyConfig;
use traits::{Notifier, NotifyError};

/// Which channels accepted an alert and which failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

/// Ordered set of enabled channels.
#[derive(Default)]
pub struct Notifiers {
    channels: Vec<Box<dyn Notifier>>,
}

impl Notifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the channels enabled in configuration: desktop first, then email.
    pub fn from_config(cfg: &NotifyConfig) -> Result<Self, NotifyError> {
        let mut notifiers = Self::new();
        if cfg.desktop.enabled {
            notifiers.push(Box::new(DesktopNotifier::from_config(
                &cfg.title,
                &cfg.desktop,
            )));
        }
        if cfg.email.enabled {
            notifiers.push(Box::new(EmailNotifier::from_config(&cfg.title, &cfg.email)?));
        }
        tracing::debug!(
            channels=?notifiers.channel_names(),
            "notify.channels.configured"
        );
        Ok(notifiers)
    }

    pub fn push(&mut self, channel: Box<dyn Notifier>) {
        self.channels.push(channel);
    }

    pub fn with(mut self, channel: impl Notifier + 'static) -> Self {
        self.push(Box::new(channel));
        self
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.channel()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Offer the alert to every channel in order. Failures are logged and
    /// recorded in the report, never returned.
    pub async fn notify(&self, subject: &str, body: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        for channel in &self.channels {
            let name = channel.channel();
            match channel.send(subject, body).await {
                Ok(()) => {
                    tracing::info!(channel = name, subject, "notify.delivered");
                    report.delivered.push(name);
                }
                Err(err) => {
                    tracing::warn!(channel = name, subject, error=%err, "notify.failed");
                    report.failed.push(name);
                }
            }
        }
        report
    }
}
