//! Minimal HTTP client for fetching product pages with safe logging.
//!
//! - Browser-like `User-Agent` and `Accept-Language` on every request
//! - Request options: extra headers, timeout, retry budget
//! - Retry budget defaults to zero; when raised, 429/5xx and network errors
//!   are retried with exponential backoff and `Retry-After` support
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), pricewatch_http::HttpError> {
//! let client = pricewatch_http::HttpClient::new()?;
//! let html = client
//!     .get_text("https://www.bestbuy.ca/en-ca/product/19177947", Default::default())
//!     .await?;
//! assert!(!html.is_empty());
//! # Ok(()) }
//! ```
//!
//! Observability: `http.request.start`, `http.response` and
//! `http.response.body_snippet` at debug/trace, `http.retrying` and
//! `http.error` at warn. Bodies are only ever logged truncated.

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Desktop Chrome on Windows; the storefront serves the full page to it.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned error {status}: {snippet}")]
    Status { status: StatusCode, snippet: String },
}

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use pricewatch_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(1),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub headers: Option<HeaderMap>,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    user_agent: HeaderValue,
    accept_language: HeaderValue,
    /// `None` leaves reqwest's default (no overall timeout).
    pub default_timeout: Option<Duration>,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client with browser-like identification headers.
    ///
    /// ```no_run
    /// use pricewatch_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new()?;
    /// assert_eq!(client.default_timeout, None);
    /// assert_eq!(client.max_retries, 0);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            user_agent: HeaderValue::from_static(DEFAULT_USER_AGENT),
            accept_language: HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
            default_timeout: None,
            max_retries: 0,
        })
    }

    /// Override the `User-Agent` sent with every request.
    pub fn with_user_agent(mut self, ua: &str) -> Result<Self, HttpError> {
        self.user_agent = HeaderValue::from_str(ua)
            .map_err(|e| HttpError::Build(format!("invalid User-Agent: {e}")))?;
        Ok(self)
    }

    /// Override the `Accept-Language` sent with every request.
    pub fn with_accept_language(mut self, lang: &str) -> Result<Self, HttpError> {
        self.accept_language = HeaderValue::from_str(lang)
            .map_err(|e| HttpError::Build(format!("invalid Accept-Language: {e}")))?;
        Ok(self)
    }

    /// Set an overall per-request timeout.
    ///
    /// ```no_run
    /// use pricewatch_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?.with_timeout(Some(Duration::from_secs(2)));
    /// assert_eq!(client.default_timeout, Some(Duration::from_secs(2)));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Option<Duration>) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget (zero) returned by [`HttpClient::new`].
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// GET a page and return its body as text (lossy UTF-8).
    ///
    /// Retries only 429, 5xx and transport failures, and only while the
    /// budget (`opts.retries`, else the client default) lasts.
    pub async fn get_text(&self, url: &str, opts: RequestOpts) -> Result<String, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;
        let headers = self.request_headers(opts.headers.as_ref());
        let timeout = opts.timeout.or(self.default_timeout);
        let max_retries = opts.retries.unwrap_or(self.max_retries);

        let mut attempt = 0usize;
        loop {
            tracing::debug!(
                attempt = attempt + 1,
                max_retries,
                host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                timeout_ms=?timeout.map(|t| t.as_millis() as u64),
                "http.request.start"
            );

            let (error, delay) = match self.attempt(&url, &headers, timeout, attempt + 1).await {
                Attempt::Page(body) => return Ok(String::from_utf8_lossy(&body).into_owned()),
                Attempt::Failed(error) => {
                    tracing::warn!(url=%url, error=%error, "http.error");
                    return Err(error);
                }
                Attempt::Transient { error, delay } => (error, delay),
            };

            if attempt >= max_retries {
                tracing::warn!(url=%url, error=%error, attempts = attempt + 1, "http.error");
                return Err(error);
            }
            attempt += 1;
            tracing::warn!(
                url=%url,
                error=%error,
                attempt,
                max_retries,
                backoff_ms = delay.as_millis() as u64,
                "http.retrying"
            );
            sleep(delay).await;
        }
    }

    fn request_headers(&self, extra: Option<&HeaderMap>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers.insert(ACCEPT_LANGUAGE, self.accept_language.clone());
        if let Some(extra) = extra {
            for (k, v) in extra {
                headers.insert(k, v.clone());
            }
        }
        headers
    }

    /// One round trip, classified for the retry loop.
    async fn attempt(
        &self,
        url: &Url,
        headers: &HeaderMap,
        timeout: Option<Duration>,
        attempt: usize,
    ) -> Attempt {
        let mut rb = self.inner.get(url.clone()).headers(headers.clone());
        if let Some(t) = timeout {
            rb = rb.timeout(t);
        }

        let started = std::time::Instant::now();
        let resp = match rb.send().await {
            Ok(resp) => resp,
            Err(err) => return Attempt::transient(HttpError::Network(err.to_string()), attempt),
        };
        let status = resp.status();
        let retry_after = retry_after_delay_secs(resp.headers()).map(Duration::from_secs);
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(err) => return Attempt::transient(HttpError::Network(err.to_string()), attempt),
        };

        tracing::debug!(
            %status,
            duration_ms = started.elapsed().as_millis() as u64,
            body_len = body.len(),
            "http.response"
        );

        if status.is_success() {
            return Attempt::Page(body.to_vec());
        }

        let snippet = snip_body(&body);
        tracing::trace!(body_snippet=%snippet, "http.response.body_snippet");
        let error = HttpError::Status { status, snippet };

        if status == StatusCode::TOO_MANY_REQUESTS {
            // Without Retry-After, give the rate limiter at least a second.
            let delay = retry_after.unwrap_or_else(|| backoff(attempt).max(Duration::from_millis(1100)));
            Attempt::Transient { error, delay }
        } else if status.is_server_error() {
            let delay = retry_after.unwrap_or_else(|| backoff(attempt));
            Attempt::Transient { error, delay }
        } else {
            Attempt::Failed(error)
        }
    }
}

enum Attempt {
    Page(Vec<u8>),
    Transient { error: HttpError, delay: Duration },
    Failed(HttpError),
}

impl Attempt {
    fn transient(error: HttpError, attempt: usize) -> Self {
        Attempt::Transient {
            error,
            delay: backoff(attempt),
        }
    }
}

// ==============================
// Helpers
// ==============================

fn backoff(attempt: usize) -> Duration {
    Duration::from_millis(200u64.saturating_mul(1 << (attempt.saturating_sub(1)).min(16)))
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() > 500 {
        let mut snip: String = text.chars().take(500).collect();
        snip.push_str("...");
        snip
    } else {
        text.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(2), Duration::from_millis(400));
        assert_eq!(backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn snip_body_truncates_on_char_boundary() {
        let long = "é".repeat(600);
        let snip = snip_body(long.as_bytes());
        assert!(snip.ends_with("..."));
        assert_eq!(snip.chars().count(), 503);
        assert_eq!(snip_body(b"short"), "short");
    }

    #[test]
    fn retry_after_parses_seconds_only() {
        let mut h = HeaderMap::new();
        h.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after_delay_secs(&h), Some(3));
        h.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_delay_secs(&h), None);
    }
}
