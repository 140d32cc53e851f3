use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::config::proc_validator;
use crate::config::settings::{LogFormat, LoggingConfig};
use crate::config::ServiceConfig;
use crate::observability::metrics::get_metrics;

pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Used when no config file is given: everything comes from the environment.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"
settings:
  safety_margin_ms: ${SAFETY_MARGIN_MS:30000}
  http_timeout_ms: ${HTTP_TIMEOUT_MS:10000}
credentials:
  account_id: "${SERVICE_ACCOUNT_EMAIL:}"
sheets:
  spreadsheet_id: "${SPREADSHEET_ID:}"
"#;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(\w+)(?::([^\}]*))?\}").expect("env var pattern is valid")
});

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config file '{}'", path.display()))?;

    let expanded = expand_env_vars(&content);
    let mut service_config = parse_config(expanded).await?;
    apply_private_key_env(&mut service_config);
    Ok(service_config)
}

/// Config built from `DEFAULT_CONFIG_TEMPLATE` and the process environment.
pub async fn env_to_config() -> Result<ServiceConfig> {
    let mut service_config = parse_config(expand_env_vars(DEFAULT_CONFIG_TEMPLATE)).await?;
    apply_private_key_env(&mut service_config);
    Ok(service_config)
}

/// Fills an unset key from `PRIVATE_KEY`, read verbatim after parsing:
/// multi-line PEM does not survive substitution into a YAML scalar.
fn apply_private_key_env(service_config: &mut ServiceConfig) {
    if !service_config.credentials.private_key.trim().is_empty() {
        return;
    }
    if let Ok(private_key) = std::env::var(PRIVATE_KEY_ENV) {
        debug!("private key taken from {}", PRIVATE_KEY_ENV);
        service_config.credentials.private_key = private_key;
    }
}

pub async fn parse_config(content: String) -> Result<ServiceConfig> {
    let metrics = get_metrics().await;
    let mut service_config: ServiceConfig = serde_yaml::from_str(&content).inspect_err(|e| {
        error!("parse config error: {}", e);
        metrics.config_errors.inc();
    })?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging =
            Some(LoggingConfig::new("info".to_owned(), LogFormat::from_env()));
    }

    debug!("validation config ...");
    proc_validator::validate_service_config(&service_config).await?;

    Ok(service_config)
}

/// Replace `${VAR}` and `${VAR:default}` with environment values.
/// Unset variables without a default become empty strings.
pub fn expand_env_vars(input: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string()
}
