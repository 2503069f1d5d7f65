use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::api::endpoints::Endpoints;
use crate::api::response::{failure_reason, read_json};
use crate::cache::credential::Credential;
use crate::cache::token_cache::TokenCache;
use crate::config::account::AppIdentity;
use crate::config::settings::{HttpConfig, SettingsConfig};
use crate::error::Result;
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;

/// Official account api client.
///
/// Cheap to clone; clones share the http connection pool and the access token cache.
#[derive(Debug, Clone)]
pub struct WeixinClient {
    pub(crate) client: Client,
    pub(crate) endpoints: Arc<Endpoints>,
    pub(crate) cache: Arc<TokenCache>,
}

impl WeixinClient {
    pub fn new(client: Client, endpoints: Arc<Endpoints>, cache: Arc<TokenCache>) -> Self {
        Self { client, endpoints, cache }
    }

    pub fn from_settings(settings: &SettingsConfig, identity: AppIdentity) -> Result<Self> {
        let client = build_http_client(&settings.http)?;
        let endpoints = Arc::new(Endpoints::from_config(&settings.http)?);
        let cache = Arc::new(TokenCache::new(
            client.clone(),
            endpoints.clone(),
            identity,
            settings.token_cache.clone(),
            RetrySettings::from_config(&settings.retry),
        ));
        Ok(Self::new(client, endpoints, cache))
    }

    pub fn token_cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    pub fn identity(&self) -> &AppIdentity {
        self.cache.identity()
    }

    pub async fn access_token(&self) -> Result<Credential> {
        self.cache.get_token().await
    }

    /// GET a platform endpoint and check the reply for an in-band error
    pub(crate) async fn get_json(&self, endpoint: &'static str, url: Url) -> Result<Value> {
        let metrics = get_metrics().await;
        metrics.api_requests.with_label_values(&[endpoint]).inc();

        let result = async {
            let response = self.client.get(url).send().await?;
            read_json(response).await
        }
        .await;

        if let Err(err) = &result {
            metrics.api_failures.with_label_values(&[endpoint, failure_reason(err)]).inc();
            warn!(endpoint, error = %err, "weixin api call failed");
        }
        result
    }
}

pub fn build_http_client(http: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_millis(http.timeout_ms))
        .build()?;
    Ok(client)
}
