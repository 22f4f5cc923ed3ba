//! Loader for tracker configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (serde `default` attributes below)
//! 2. YAML files / inline YAML snippets, in the order they were added
//! 3. `PRICEWATCH__`-prefixed environment variables, `__` between path
//!    segments (`PRICEWATCH__NOTIFY__EMAIL__ENABLED=true`); `products` may be
//!    given as a comma-separated list
//!
//! After merging, `${VAR}` placeholders in any string are expanded from the
//! process environment. The SMTP password is usually supplied that way, or
//! through `PRICEWATCH_SMTP_PASSWORD` when the file leaves it out.
use config::{Config, ConfigError, Environment, File};
use pricewatch_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_CONFIG_FILE: &str = "pricewatch.yaml";
pub const DEFAULT_HISTORY_FILE: &str = "bestbuy_price_history.json";
pub const SMTP_PASSWORD_ENV: &str = "PRICEWATCH_SMTP_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
pub struct PricewatchConfig {
    /// Product page URLs, tracked in this order.
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    /// `None` keeps the built-in browser identification string.
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub accept_language: Option<String>,
    /// Unset means no timeout beyond the transport's own.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Desktop notification title and email subject prefix.
    #[serde(default = "default_alert_title")]
    pub title: String,
    #[serde(default)]
    pub desktop: DesktopConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            title: default_alert_title(),
            desktop: DesktopConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DesktopConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_desktop_timeout")]
    pub timeout_secs: u64,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_desktop_timeout(),
        }
    }
}

/// Outbound mail settings. Credentials are plain configuration values.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Defaults to `username`.
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            from: None,
            to: None,
        }
    }
}

impl EmailConfig {
    /// Configured password, or `PRICEWATCH_SMTP_PASSWORD` when the config
    /// leaves it empty or holds an unresolved `${VAR}` placeholder.
    pub fn resolved_password(&self) -> Option<String> {
        self.password
            .clone()
            .filter(|p| !p.is_empty() && !p.contains("${"))
            .or_else(|| std::env::var(SMTP_PASSWORD_ENV).ok())
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub stderr: bool,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            dir: None,
            stderr: false,
            filter: default_log_filter(),
        }
    }
}

fn default_history_path() -> PathBuf {
    PathBuf::from(DEFAULT_HISTORY_FILE)
}
fn default_alert_title() -> String {
    "BestBuy Alert".into()
}
fn default_true() -> bool {
    true
}
fn default_desktop_timeout() -> u64 {
    10
}
fn default_smtp_server() -> String {
    "smtp.gmail.com".into()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_log_format() -> LogFormat {
    LogFormat::Text
}
fn default_log_filter() -> String {
    "info".into()
}

impl PricewatchConfig {
    /// Reject combinations that would only fail later, mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let email = &self.notify.email;
        if email.enabled {
            if email.username.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Message(
                    "notify.email.enabled requires notify.email.username".into(),
                ));
            }
            if email.to.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Message(
                    "notify.email.enabled requires notify.email.to".into(),
                ));
            }
            if email.resolved_password().is_none() {
                return Err(ConfigError::Message(format!(
                    "notify.email.enabled requires notify.email.password or {SMTP_PASSWORD_ENV}"
                )));
            }
        }
        if let Some(blank) = self.products.iter().find(|u| u.trim().is_empty()) {
            return Err(ConfigError::Message(format!(
                "products contains an empty entry: {blank:?}"
            )));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct PricewatchConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PricewatchConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PricewatchConfigLoader {
    /// Start from the built-in defaults; environment overrides are applied at [`load`](Self::load).
    ///
    /// ```
    /// use pricewatch_config::PricewatchConfigLoader;
    ///
    /// let config = PricewatchConfigLoader::new()
    ///     .with_yaml_str("products: []")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert!(config.products.is_empty());
    /// assert_eq!(config.notify.email.smtp_port, 587);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when absent, so env-only setups work.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use pricewatch_config::PricewatchConfigLoader;
    ///
    /// let cfg = PricewatchConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// products:
    ///   - "https://www.bestbuy.ca/en-ca/product/19177947"
    /// notify:
    ///   desktop:
    ///     enabled: false
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.products.len(), 1);
    /// assert!(!cfg.notify.desktop.enabled);
    /// assert!(!cfg.notify.email.enabled);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    pub fn load(self) -> Result<PricewatchConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("PRICEWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("products"),
            )
            .build()?;

        // Expand `${VAR}` on an untyped tree first
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        // Back through config's own deserializer: it coerces scalars, so an
        // all-digit password or `PRICEWATCH__NOTIFY__TITLE=2024` still lands
        // in a `String` field.
        Config::try_from(&v)?.try_deserialize()
    }
}
