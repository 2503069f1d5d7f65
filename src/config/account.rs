use serde::Deserialize;
use std::fmt;
use std::{env, fs};

use crate::config::settings::SettingsConfig;
use crate::error::{Result, WeixinError};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub account: AccountConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// ================================
/// Official account credentials
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    pub app_id: SecretValue,
    pub app_secret: SecretValue,
    /// shared secret typed into the platform console for the webhook handshake
    pub token: SecretValue,
}

/// Where a credential value comes from
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum SecretValue {
    Literal { value: String },
    FromEnv { from_env: String },
    FromFile { path: String },
}

impl SecretValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            SecretValue::Literal { value } => Ok(value.to_owned()),
            SecretValue::FromEnv { from_env } => env::var(from_env)
                .map_err(|err| WeixinError::Config(format!("env '{}': {}", from_env, err))),
            SecretValue::FromFile { path } => fs::read_to_string(path)
                .map(|res| res.trim().to_string())
                .map_err(|err| WeixinError::Config(format!("file '{}': {}", path, err))),
        }
    }
}

/// App identity used against the token and OAuth endpoints
#[derive(Clone)]
pub struct AppIdentity {
    pub app_id: String,
    pub app_secret: String,
}

impl AppIdentity {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }
}

impl fmt::Debug for AppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppIdentity")
            .field("app_id", &self.app_id)
            .field("app_secret", &"***")
            .finish()
    }
}

/// Account with every credential resolved
#[derive(Debug, Clone)]
pub struct Account {
    pub identity: AppIdentity,
    pub token: String,
}

impl AccountConfig {
    pub fn resolve(&self) -> Result<Account> {
        Ok(Account {
            identity: AppIdentity::new(self.app_id.resolve()?, self.app_secret.resolve()?),
            token: self.token.resolve()?,
        })
    }
}

/// ================================
/// Webhook
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    #[serde(default = "default_webhook_path")]
    pub path: String,
    /// text sent back to every inbound message; `success` (no reply) when absent
    pub auto_reply_text: Option<String>,
    /// mount the user info and oauth callback routes
    #[serde(default)]
    pub expose_api: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            path: default_webhook_path(),
            auto_reply_text: None,
            expose_api: false,
        }
    }
}

fn default_webhook_path() -> String {
    "/weixin".to_string()
}
