//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * token cache and retry invariants
//!   * http base urls and timeout
//!   * server / metrics / webhook paths and their collisions
//!   * logging level
//!   * account credential sources

use reqwest::Url;
use tracing::{error, info};

use crate::config::account::{AccountConfig, SecretValue, ServiceConfig, WebhookConfig};
use crate::config::settings::{HttpConfig, RetryConfig, SettingsConfig};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{HEALTH_PATH, MAX_STALE_AFTER_SECS};

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_account(&cfg.account, &mut errors);
    validate_webhook(&cfg.webhook, &cfg.settings, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    let stale_after = settings.token_cache.stale_after_seconds;
    if stale_after == 0 {
        errors.push("settings.token_cache.stale_after_seconds must be > 0".to_string());
    } else if stale_after > MAX_STALE_AFTER_SECS {
        errors.push(format!(
            "settings.token_cache.stale_after_seconds ({}) must be <= {}",
            stale_after, MAX_STALE_AFTER_SECS
        ));
    }

    if let Some(retry) = &settings.retry {
        validate_retry("settings.retry", retry, errors);
    }

    validate_http(&settings.http, errors);

    if settings.server.host.is_empty() {
        errors.push(format!(
            "settings.server.host '{}' must be valid",
            settings.server.host
        ));
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_retry(path: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if let Some(attempts) = retry.attempts {
        if attempts == 0 {
            errors.push(format!("{}.attempts must be > 0", path));
        }
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if max < base {
            errors.push(format!(
                "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
                path, max, base
            ));
        }
    }
}

fn validate_http(http: &HttpConfig, errors: &mut Vec<String>) {
    if http.timeout_ms == 0 {
        errors.push("settings.http.timeout_ms must be > 0".to_string());
    }
    for (name, value) in [
        ("api_base_url", &http.api_base_url),
        ("open_base_url", &http.open_base_url),
    ] {
        match Url::parse(value) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(format!(
                "settings.http.{} '{}' has unsupported scheme '{}'",
                name,
                value,
                url.scheme()
            )),
            Err(err) => errors.push(format!(
                "settings.http.{} '{}' is not a valid url: {}",
                name, value, err
            )),
        }
    }
}

/// ACCOUNT
fn validate_account(account: &AccountConfig, errors: &mut Vec<String>) {
    validate_secret_value("account.app_id", &account.app_id, errors);
    validate_secret_value("account.app_secret", &account.app_secret, errors);
    validate_secret_value("account.token", &account.token, errors);
}

fn validate_secret_value(path: &str, v: &SecretValue, errors: &mut Vec<String>) {
    match v {
        SecretValue::Literal { value } => {
            if value.trim().is_empty() {
                errors.push(format!("{}: literal value cannot be empty", path));
            }
        }
        SecretValue::FromEnv { from_env } => {
            if from_env.trim().is_empty() {
                errors.push(format!("{}: env name cannot be empty", path));
            }
        }
        SecretValue::FromFile { path: p } => {
            if p.trim().is_empty() {
                errors.push(format!("{}: path cannot be empty", path));
            }
            // file existence is checked when the value is resolved
        }
    }
}

/// WEBHOOK
fn validate_webhook(webhook: &WebhookConfig, settings: &SettingsConfig, errors: &mut Vec<String>) {
    if !webhook.path.starts_with('/') {
        errors.push(format!(
            "webhook.path '{}' must start with '/'",
            webhook.path
        ));
    }
    if webhook.path == HEALTH_PATH {
        errors.push(format!(
            "webhook.path '{}' collides with the health route",
            webhook.path
        ));
    }
    if settings.metrics.is_enabled && webhook.path == settings.metrics.path {
        errors.push(format!(
            "webhook.path '{}' collides with settings.metrics.path",
            webhook.path
        ));
    }
    if webhook.expose_api && (webhook.path == "/oauth/callback" || webhook.path.starts_with("/users/")) {
        errors.push(format!(
            "webhook.path '{}' collides with the api routes",
            webhook.path
        ));
    }
    if let Some(text) = &webhook.auto_reply_text {
        if text.is_empty() {
            errors.push("webhook.auto_reply_text cannot be empty; remove it to disable replies".to_string());
        }
    }
}
