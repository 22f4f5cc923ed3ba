use crate::compare::{alert_message, compare};
use crate::history::{History, HistoryError};
use crate::report::{write_failure, write_observation};
use async_trait::async_trait;
use pricewatch_common::{HistoryEntry, Observation};
use pricewatch_extract::{ExtractError, extract};
use pricewatch_http::{HttpClient, HttpError, RequestOpts};
use pricewatch_notify::Notifiers;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Source of product page HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, HttpError>;
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_page(&self, url: &str) -> Result<String, HttpError> {
        self.get_text(url, RequestOpts::default()).await
    }
}

/// Why one product could not be read. Never aborts a run.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error(transparent)]
    Fetch(#[from] HttpError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Failures that end a run.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("failed to write report: {0}")]
    Console(#[from] io::Error),
    #[error(transparent)]
    History(#[from] HistoryError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tracked: usize,
    pub failed: usize,
    pub alerts: usize,
}

/// Fetch and extract one product page.
pub async fn observe<F>(fetcher: &F, url: &str) -> Result<Observation, ProductError>
where
    F: PageFetcher + ?Sized,
{
    let html = fetcher.fetch_page(url).await?;
    Ok(extract(&html)?)
}

/// Print a single product without touching history or notifications.
/// Returns whether the product could be read.
pub async fn check<F, W>(fetcher: &F, url: &str, out: &mut W) -> Result<bool, TrackerError>
where
    F: PageFetcher + ?Sized,
    W: Write,
{
    match observe(fetcher, url).await {
        Ok(obs) => {
            write_observation(out, &obs)?;
            Ok(true)
        }
        Err(err) => {
            tracing::warn!(url, error=%err, "tracker.check.failed");
            write_failure(out, url, &err)?;
            Ok(false)
        }
    }
}

/// Drives one tracking pass over a list of product URLs.
pub struct Tracker<F> {
    fetcher: F,
    notifiers: Notifiers,
    history: History,
    history_path: PathBuf,
}

impl<F: PageFetcher> Tracker<F> {
    pub fn new(fetcher: F, notifiers: Notifiers, history: History, history_path: PathBuf) -> Self {
        Self {
            fetcher,
            notifiers,
            history,
            history_path,
        }
    }

    /// Read the history file up front; an unreadable file stops here, before
    /// any request is made.
    pub fn load(fetcher: F, notifiers: Notifiers, history_path: PathBuf) -> Result<Self, HistoryError> {
        let history = History::load(&history_path)?;
        Ok(Self::new(fetcher, notifiers, history, history_path))
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Track every URL in order, then persist history once.
    ///
    /// Per-product failures are printed and skipped. Only console write
    /// errors and a failed history save end the run early.
    pub async fn run<W: Write>(&mut self, urls: &[String], out: &mut W) -> Result<RunSummary, TrackerError> {
        let mut summary = RunSummary::default();
        tracing::info!(products = urls.len(), "tracker.run.start");

        for url in urls {
            let obs = match observe(&self.fetcher, url).await {
                Ok(obs) => obs,
                Err(err) => {
                    tracing::warn!(url = %url, error=%err, "tracker.product.fetch_failed");
                    write_failure(out, url, &err)?;
                    summary.failed += 1;
                    continue;
                }
            };

            writeln!(out)?;
            write_observation(out, &obs)?;
            summary.tracked += 1;

            let events = compare(self.history.get(url), &obs);
            if !events.is_empty() {
                let title = obs.title.as_deref().unwrap_or(url);
                let body = alert_message(title, &events);
                tracing::info!(url = %url, events = events.len(), "tracker.product.changed");
                let report = self.notifiers.notify(title, &body).await;
                if !report.failed.is_empty() {
                    tracing::warn!(url = %url, failed=?report.failed, "tracker.alert.partial");
                }
                summary.alerts += 1;
            }

            self.history.upsert(url, HistoryEntry::from(&obs));
        }

        self.history.save(&self.history_path)?;
        writeln!(out, "\nTracking complete.")?;
        tracing::info!(
            tracked = summary.tracked,
            failed = summary.failed,
            alerts = summary.alerts,
            "tracker.run.complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_common::Availability;
    use pricewatch_notify::traits::{Notifier, NotifyError};
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Pages(HashMap<String, String>);

    impl Pages {
        fn with(mut self, url: &str, name: &str, price: &str, preorder: bool) -> Self {
            let html = format!(
                r#"<html><script>window.__INITIAL_STATE__ = {{"product":{{"product":{{"name":"{name}","regularPrice":{price},"isPreorderable":{preorder}}}}}}};</script></html>"#
            );
            self.0.insert(url.to_string(), html);
            self
        }
    }

    #[async_trait]
    impl PageFetcher for Pages {
        async fn fetch_page(&self, url: &str) -> Result<String, HttpError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| HttpError::Network(format!("no route to {url}")))
        }
    }

    type Sent = Arc<Mutex<Vec<(String, String)>>>;

    struct Recording(Sent);

    #[async_trait]
    impl Notifier for Recording {
        fn channel(&self) -> &'static str {
            "recording"
        }
        async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
            self.0
                .lock()
                .unwrap()
                .push((subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn first_run_sets_baseline_without_alerting() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        let sent: Sent = Arc::default();
        let pages = Pages::default().with("u1", "GPU A", "999", false);
        let mut tracker = Tracker::load(pages, Notifiers::new().with(Recording(sent.clone())), path.clone()).unwrap();

        let mut out = Vec::new();
        let summary = tracker.run(&urls(&["u1"]), &mut out).await.unwrap();

        assert_eq!(summary, RunSummary { tracked: 1, failed: 0, alerts: 0 });
        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nProduct: GPU A\nPrice: $999\nAvailability: In Stock\n\nTracking complete.\n"
        );
        let saved = History::load(&path).unwrap();
        assert_eq!(saved.get("u1").unwrap().price, Some(Decimal::from(999)));
    }

    #[tokio::test]
    async fn price_drop_and_stock_change_send_one_alert() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        let mut history = History::default();
        history.upsert(
            "u1",
            HistoryEntry {
                price: Some(Decimal::from(999)),
                availability: Availability::InStock,
            },
        );
        let sent: Sent = Arc::default();
        let pages = Pages::default().with("u1", "GPU A", "899", true);
        let mut tracker = Tracker::new(pages, Notifiers::new().with(Recording(sent.clone())), history, path);

        let summary = tracker.run(&urls(&["u1"]), &mut Vec::new()).await.unwrap();

        assert_eq!(summary.alerts, 1);
        assert_eq!(
            sent.lock().unwrap().as_slice(),
            &[(
                "GPU A".to_string(),
                "GPU A\nPrice dropped! Previous: $999, Now: $899\nStock change! Previous: In Stock, Now: Out of Stock"
                    .to_string()
            )]
        );
        assert_eq!(
            tracker.history().get("u1"),
            Some(&HistoryEntry {
                price: Some(Decimal::from(899)),
                availability: Availability::OutOfStock,
            })
        );
    }

    #[tokio::test]
    async fn failed_product_is_reported_and_left_out_of_history() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        let pages = Pages::default().with("u1", "GPU A", "999", false);
        let mut tracker = Tracker::load(pages, Notifiers::new(), path.clone()).unwrap();

        let mut out = Vec::new();
        let summary = tracker.run(&urls(&["missing", "u1"]), &mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(summary, RunSummary { tracked: 1, failed: 1, alerts: 0 });
        assert!(out.starts_with("Failed to retrieve product info for missing: network error: no route to missing\n"));
        assert!(out.ends_with("Tracking complete.\n"));
        let saved = History::load(&path).unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved.get("missing").is_none());
    }

    #[tokio::test]
    async fn check_prints_without_persisting() {
        let pages = Pages::default().with("u1", "GPU A", "999", false);
        let mut out = Vec::new();
        assert!(check(&pages, "u1", &mut out).await.unwrap());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Product: GPU A\nPrice: $999\nAvailability: In Stock\n"
        );

        let mut out = Vec::new();
        assert!(!check(&pages, "nope", &mut out).await.unwrap());
        assert!(String::from_utf8(out).unwrap().starts_with("Failed to retrieve product info for nope"));
    }
}
