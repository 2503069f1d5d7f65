use std::io::Write;
use std::path::Path;

use serial_test::serial;

use crate::config::account::SecretValue;
use crate::config::proc_loader::{expand_env_vars, file_to_config, parse_config};
use crate::config::settings::LogFormat;
use crate::utils::logging::{resolve_logging_config, LogLevel};

const VALID_YAML: &str = r#"
settings:
  server:
    host: 127.0.0.1
    port: "8080"
  metrics:
    path: /metrics
    is_enabled: true
account:
  app_id: { value: wx1 }
  app_secret: { value: s1 }
  token: { value: t1 }
"#;

#[tokio::test]
#[serial]
async fn demo_config_is_valid() {
    std::env::remove_var("WX_API_BASE_URL");
    let path = Path::new("demos/weixin-agent.yaml");
    let service_config = file_to_config(path)
        .await
        .expect("demos/weixin-agent.yaml must exist in repo root for tests");

    assert_eq!(service_config.settings.http.api_base_url, "https://api.weixin.qq.com");
    assert_eq!(service_config.webhook.path, "/weixin");
    assert!(matches!(service_config.account.app_secret, SecretValue::FromEnv { .. }));
}

#[tokio::test]
async fn minimal_config_gets_defaults() {
    let service_config = parse_config(VALID_YAML.to_owned()).await.unwrap();
    let settings = &service_config.settings;

    assert_eq!(settings.token_cache.stale_after_seconds, 5000);
    assert!(!settings.token_cache.serve_stale_on_failure);
    assert_eq!(settings.http.timeout_ms, 5000);
    assert_eq!(settings.http.open_base_url, "https://open.weixin.qq.com");
    assert_eq!(service_config.webhook.path, "/weixin");
    assert_eq!(service_config.webhook.auto_reply_text, None);

    let logging = settings.logging.as_ref().unwrap();
    assert_eq!(logging.level, "info");
    assert_eq!(logging.format, LogFormat::Compact);

    let account = service_config.account.resolve().unwrap();
    assert_eq!(account.identity.app_id, "wx1");
    assert_eq!(account.token, "t1");
}

#[tokio::test]
async fn invalid_config_reports_all_errors() {
    let invalid_yaml = r#"
settings:
  token_cache:
    stale_after_seconds: 0
  retry:
    attempts: 0
    base_delay_ms: 500
    max_delay_ms: 100
  http:
    api_base_url: "ftp://api.weixin.qq.com"
  server:
    host: 127.0.0.1
    port: "http"
  metrics:
    path: /metrics
    is_enabled: true
  logging:
    level: loud
    format: json
account:
  app_id: { value: "" }
  app_secret: { from_env: WX_APP_SECRET }
  token: { path: " " }
webhook:
  path: /metrics
  auto_reply_text: ""
"#;

    let err = parse_config(invalid_yaml.to_owned()).await.unwrap_err().to_string();

    assert!(err.contains("config is not valid, total errors:10"), "{}", err);
    for expected in [
        "stale_after_seconds must be > 0",
        "settings.retry.attempts must be > 0",
        "max_delay_ms (100) must be >= base_delay_ms (500)",
        "unsupported scheme 'ftp'",
        "settings.server.port 'http'",
        "settings.logging.level 'loud' invalid",
        "account.app_id: literal value cannot be empty",
        "account.token: path cannot be empty",
        "collides with settings.metrics.path",
        "auto_reply_text cannot be empty",
    ] {
        assert!(err.contains(expected), "missing '{}' in {}", expected, err);
    }
}

#[tokio::test]
async fn stale_window_beyond_token_lifetime_is_rejected() {
    let yaml = VALID_YAML.replace(
        "settings:\n",
        "settings:\n  token_cache:\n    stale_after_seconds: 18446744073709551615\n",
    );

    let err = parse_config(yaml).await.unwrap_err().to_string();
    assert!(err.contains("total errors:1"), "{}", err);
    assert!(err.contains("stale_after_seconds (18446744073709551615) must be <= 7200"), "{}", err);

    let yaml = VALID_YAML.replace(
        "settings:\n",
        "settings:\n  token_cache:\n    stale_after_seconds: 7200\n",
    );
    assert!(parse_config(yaml).await.is_ok());
}

#[tokio::test]
async fn unparsable_yaml_is_an_error() {
    assert!(parse_config("settings: [".to_owned()).await.is_err());
    assert!(parse_config("account: {}".to_owned()).await.is_err());
}

#[tokio::test]
#[serial]
async fn env_placeholders_are_expanded() {
    std::env::set_var("WEIXIN_AGENT_TEST_APP_ID", "wx-from-env");
    std::env::remove_var("WEIXIN_AGENT_TEST_MISSING");

    let expanded = expand_env_vars("a: ${WEIXIN_AGENT_TEST_APP_ID}\nb: ${WEIXIN_AGENT_TEST_MISSING:fallback}\nc: ${WEIXIN_AGENT_TEST_MISSING}").unwrap();
    assert_eq!(expanded, "a: wx-from-env\nb: fallback\nc: ");

    std::env::remove_var("WEIXIN_AGENT_TEST_APP_ID");
}

#[tokio::test]
#[serial]
async fn secrets_resolve_from_env_and_file() {
    std::env::set_var("WEIXIN_AGENT_TEST_SECRET", "from-env");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "from-file").unwrap();

    let from_env = SecretValue::FromEnv { from_env: "WEIXIN_AGENT_TEST_SECRET".into() };
    let from_file = SecretValue::FromFile { path: file.path().display().to_string() };
    let missing = SecretValue::FromEnv { from_env: "WEIXIN_AGENT_TEST_NOT_SET".into() };

    assert_eq!(from_env.resolve().unwrap(), "from-env");
    assert_eq!(from_file.resolve().unwrap(), "from-file");
    assert!(missing.resolve().is_err());

    std::env::remove_var("WEIXIN_AGENT_TEST_SECRET");
}

#[tokio::test]
#[serial]
async fn config_file_with_env_secret_loads() {
    std::env::set_var("WEIXIN_AGENT_TEST_PORT", "9090");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{}",
        VALID_YAML.replace("\"8080\"", "\"${WEIXIN_AGENT_TEST_PORT:8080}\"")
    )
    .unwrap();

    let service_config = file_to_config(file.path()).await.unwrap();
    assert_eq!(service_config.settings.server.port, "9090");

    std::env::remove_var("WEIXIN_AGENT_TEST_PORT");
}

#[test]
fn cli_log_level_wins_over_config() {
    let config = crate::config::settings::LoggingConfig::new("WARN".to_owned(), LogFormat::Json);

    let resolved = resolve_logging_config(Some(&config), Some(LogLevel::DEBUG));
    assert_eq!(resolved.level, "debug");
    assert_eq!(resolved.format, LogFormat::Json);

    let resolved = resolve_logging_config(Some(&config), None);
    assert_eq!(resolved.level, "warn");

    let resolved = resolve_logging_config(None, None);
    assert_eq!(resolved.level, "info");
    assert_eq!(resolved.format, LogFormat::Compact);
}
