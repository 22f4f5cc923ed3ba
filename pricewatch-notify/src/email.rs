use crate::traits::{Notifier, NotifyError};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use pricewatch_config::{EmailConfig, SMTP_PASSWORD_ENV};

/// Plain-text mail submitted to an SMTP relay over STARTTLS with login auth.
pub struct EmailNotifier {
    subject_prefix: String,
    from: Mailbox,
    to: Mailbox,
    relay: String,
    port: u16,
    credentials: Credentials,
}

impl EmailNotifier {
    /// Build from configuration. Missing username, recipient or password is
    /// a configuration error rather than a delivery failure.
    pub fn from_config(subject_prefix: &str, cfg: &EmailConfig) -> Result<Self, NotifyError> {
        let username = cfg
            .username
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| NotifyError::Config("notify.email.username is not set".into()))?;
        let to = cfg
            .to
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| NotifyError::Config("notify.email.to is not set".into()))?;
        let password = cfg.resolved_password().ok_or_else(|| {
            NotifyError::Config(format!(
                "notify.email.password is not set and {SMTP_PASSWORD_ENV} is empty"
            ))
        })?;

        Ok(Self {
            subject_prefix: subject_prefix.to_string(),
            from: parse_mailbox(cfg.from.as_deref().unwrap_or(&username))?,
            to: parse_mailbox(to)?,
            relay: cfg.smtp_server.clone(),
            port: cfg.smtp_port,
            credentials: Credentials::new(username, password),
        })
    }

    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(format!("{}: {}", self.subject_prefix, subject))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Message(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse::<Mailbox>().map_err(|e| NotifyError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(subject, body)?;
        let relay = self.relay.clone();
        let port = self.port;
        let credentials = self.credentials.clone();

        tracing::debug!(relay=%relay, port, "notify.email.submit");

        tokio::task::spawn_blocking(move || {
            let mailer = SmtpTransport::starttls_relay(&relay)
                .map_err(|e| NotifyError::Smtp(e.to_string()))?
                .port(port)
                .credentials(credentials)
                .build();
            mailer
                .send(&message)
                .map(|_| ())
                .map_err(|e| NotifyError::Smtp(e.to_string()))
        })
        .await?
    }
}
