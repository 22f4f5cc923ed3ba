use anyhow::{Context, Result};
use pricewatch_common::observability::LogConfig;
use pricewatch_config::{
    DEFAULT_CONFIG_FILE, HttpConfig, LoggingConfig, PricewatchConfig, PricewatchConfigLoader,
};
use pricewatch_http::HttpClient;
use std::path::Path;
use std::time::Duration;

/// An explicit path must exist; the default file is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<PricewatchConfig> {
    let loader = match explicit {
        Some(path) => PricewatchConfigLoader::new().with_file(path),
        None => PricewatchConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg = loader.load().context("failed to load configuration")?;
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

pub fn log_config(cfg: &LoggingConfig, verbose: bool) -> LogConfig {
    LogConfig {
        log_dir: cfg.dir.clone(),
        emit_stderr: cfg.stderr || verbose,
        format: cfg.format,
        default_filter: if verbose {
            "debug".to_string()
        } else {
            cfg.filter.clone()
        },
        ..LogConfig::default()
    }
}

pub fn http_client(cfg: &HttpConfig) -> Result<HttpClient> {
    let mut client = HttpClient::new()?
        .with_timeout(cfg.timeout_secs.map(Duration::from_secs))
        .with_retries(cfg.retries);
    if let Some(ua) = cfg.user_agent.as_deref() {
        client = client
            .with_user_agent(ua)
            .context("http.user_agent is not a valid header value")?;
    }
    if let Some(lang) = cfg.accept_language.as_deref() {
        client = client
            .with_accept_language(lang)
            .context("http.accept_language is not a valid header value")?;
    }
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_common::observability::LogFormat;

    #[test]
    fn verbose_forces_debug_on_stderr() {
        let cfg = LoggingConfig::default();
        let quiet = log_config(&cfg, false);
        assert_eq!(quiet.default_filter, "info");
        assert!(!quiet.emit_stderr);

        let loud = log_config(&cfg, true);
        assert_eq!(loud.default_filter, "debug");
        assert!(loud.emit_stderr);
        assert_eq!(loud.format, LogFormat::Text);
        assert_eq!(loud.app_name, "pricewatch");
    }

    #[test]
    fn http_settings_reach_the_client() {
        let cfg = HttpConfig {
            timeout_secs: Some(15),
            retries: 2,
            ..HttpConfig::default()
        };
        let client = http_client(&cfg).unwrap();
        assert_eq!(client.default_timeout, Some(Duration::from_secs(15)));
        assert_eq!(client.max_retries, 2);
    }

    #[test]
    fn bad_user_agent_is_rejected() {
        let cfg = HttpConfig {
            user_agent: Some("bad\nagent".into()),
            ..HttpConfig::default()
        };
        assert!(http_client(&cfg).is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = std::env::temp_dir().join("pricewatch-no-such-dir");
        assert!(load_config(Some(&dir.join("pricewatch.yaml"))).is_err());
    }
}
