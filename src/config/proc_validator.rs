//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Missing credential values are NOT errors: they switch the
//!   credential store to unconfigured mode at startup
//! - Values that would make the sync path misbehave are errors:
//!   * safety margin / timeout bounds
//!   * assertion lifetime above what the token endpoint accepts
//!   * unusable URLs
//!   * empty or malformed destination map

use anyhow::{anyhow, Result};
use reqwest::Url;
use std::collections::HashSet;
use tracing::{error, info};

use crate::config::credentials::CredentialsConfig;
use crate::config::settings::SettingsConfig;
use crate::config::sheets::SheetsConfig;
use crate::config::ServiceConfig;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::MAX_ASSERTION_LIFETIME_SECS;

const MAX_SAFETY_MARGIN_MS: i64 = 10 * 60 * 1000;
const MAX_HTTP_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// Public entrypoint: returns Ok(()) or an error listing every issue.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<()> {
    let errors = collect_errors(cfg);

    if errors.is_empty() {
        info!("config valid");
        return Ok(());
    }

    error!("configuration validation errors ({}):", errors.len());
    for e in &errors {
        error!(" - {}", e);
    }
    get_metrics().await.config_errors.inc();
    Err(anyhow!(
        "config is not valid, total errors:{}, \n{}",
        errors.len(),
        errors.join("\n")
    ))
}

pub fn collect_errors(cfg: &ServiceConfig) -> Vec<String> {
    let mut errors: Vec<String> = Vec::new();
    validate_settings(&cfg.settings, &mut errors);
    validate_credentials(&cfg.credentials, &mut errors);
    validate_sheets(&cfg.sheets, &mut errors);
    errors
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(margin) = settings.safety_margin_ms {
        if margin < 0 {
            errors.push(format!(
                "settings.safety_margin_ms ({}) must not be negative",
                margin
            ));
        } else if margin > MAX_SAFETY_MARGIN_MS {
            errors.push(format!(
                "settings.safety_margin_ms ({}) is unreasonably large, max {}",
                margin, MAX_SAFETY_MARGIN_MS
            ));
        }
    }

    if let Some(timeout) = settings.http_timeout_ms {
        if timeout == 0 || timeout > MAX_HTTP_TIMEOUT_MS {
            errors.push(format!(
                "settings.http_timeout_ms ({}) must be within 1..={}",
                timeout, MAX_HTTP_TIMEOUT_MS
            ));
        }
    }

    if settings.metrics.is_enabled && !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }

    if settings.server.host.is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be a valid port",
            settings.server.port
        ));
    }

    if let Some(logging) = &settings.logging {
        let level = logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of trace, debug, info, warn, error",
                logging.level
            ));
        }
    }
}

/// CREDENTIALS VALIDATION
fn validate_credentials(credentials: &CredentialsConfig, errors: &mut Vec<String>) {
    validate_url("credentials.token_uri", &credentials.token_uri, errors);

    if credentials.scope.trim().is_empty() {
        errors.push("credentials.scope must not be empty".to_string());
    }

    if let Some(lifetime) = credentials.assertion_lifetime_seconds {
        if lifetime <= 0 || lifetime > MAX_ASSERTION_LIFETIME_SECS {
            errors.push(format!(
                "credentials.assertion_lifetime_seconds ({}) must be within 1..={}",
                lifetime, MAX_ASSERTION_LIFETIME_SECS
            ));
        }
    }
}

/// SHEETS VALIDATION
fn validate_sheets(sheets: &SheetsConfig, errors: &mut Vec<String>) {
    validate_url("sheets.api_root", &sheets.api_root, errors);

    if sheets.value_input_option != "USER_ENTERED" && sheets.value_input_option != "RAW" {
        errors.push(format!(
            "sheets.value_input_option '{}' must be USER_ENTERED or RAW",
            sheets.value_input_option
        ));
    }

    if sheets.destinations.is_empty() {
        errors.push("sheets.destinations is empty; at least one destination required".to_string());
    }

    let mut sheet_names = HashSet::new();
    for (destination, sheet) in &sheets.destinations {
        if sheet.trim().is_empty() {
            errors.push(format!(
                "sheets.destinations['{}'] must name a sheet",
                destination
            ));
        } else if sheet.contains('!') {
            errors.push(format!(
                "sheets.destinations['{}'] sheet name '{}' must not contain '!'",
                destination, sheet
            ));
        }
        // 1:1 mapping
        if !sheet_names.insert(sheet.as_str()) {
            errors.push(format!(
                "sheets.destinations['{}'] reuses sheet '{}'",
                destination, sheet
            ));
        }
    }
}

fn validate_url(field: &str, value: &str, errors: &mut Vec<String>) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "{} '{}' has unsupported scheme '{}'",
            field,
            value,
            url.scheme()
        )),
        Err(err) => errors.push(format!("{} '{}' is not a valid URL: {}", field, value, err)),
    }
}
