use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::api::endpoints::Endpoints;
use crate::api::response::{failure_reason, read_json, typed};
use crate::cache::credential::Credential;
use crate::config::account::AppIdentity;
use crate::config::settings::TokenCacheConfig;
use crate::error::{Result, WeixinError};
use crate::helpers::time::{get_instant, now_i64};
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Access token cache for one app identity.
///
/// Staleness check, refresh and read happen under one lock, so callers that
/// overlap on a stale token wait for a single refresh sequence instead of
/// each spending a request against the platform quota.
#[derive(Debug)]
pub struct TokenCache {
    client: Client,
    endpoints: Arc<Endpoints>,
    identity: AppIdentity,
    policy: TokenCacheConfig,
    retry: RetrySettings,
    state: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub fn new(
        client: Client,
        endpoints: Arc<Endpoints>,
        identity: AppIdentity,
        policy: TokenCacheConfig,
        retry: RetrySettings,
    ) -> Self {
        Self {
            client,
            endpoints,
            identity,
            policy,
            retry,
            state: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> &AppIdentity {
        &self.identity
    }

    /// Current access token, refreshed first when absent or stale
    pub async fn get_token(&self) -> Result<Credential> {
        let mut state = self.state.lock().await;

        let now = now_i64();
        if let Some(credential) = state.as_ref() {
            if !credential.is_stale(now, self.policy.stale_after_seconds) {
                debug!(age = credential.age(now), "using cached access token");
                return Ok(credential.clone());
            }
            info!(age = credential.age(now), "access token is stale, refreshing");
        } else {
            info!(app_id = %self.identity.app_id, "no access token cached yet, fetching");
        }

        let metrics = get_metrics().await;
        let start = get_instant();
        let refreshed = self
            .retry
            .run_with_retry(|attempt| self.refresh_once(attempt))
            .await;

        match refreshed {
            Ok(credential) => {
                metrics.token_refresh_duration.with_label_values(&["success"]).observe(start.elapsed().as_secs_f64());
                metrics.token_obtained_at_unix.set(credential.obtained_at);
                info!(expires_in = credential.expires_in, "access token refreshed");
                *state = Some(credential.clone());
                Ok(credential)
            }
            Err(err) => {
                metrics.token_refresh_duration.with_label_values(&["failure"]).observe(start.elapsed().as_secs_f64());
                error!(attempts = self.retry.attempts, error = %err, "access token refresh failed");
                match state.as_ref() {
                    Some(previous) if self.policy.serve_stale_on_failure => {
                        warn!(age = previous.age(now), "serving stale access token");
                        Ok(previous.clone())
                    }
                    _ => Err(WeixinError::TokenUnavailable { attempts: self.retry.attempts }),
                }
            }
        }
    }

    /// Cached access token without any refresh
    pub async fn cached(&self) -> Option<Credential> {
        self.state.lock().await.clone()
    }

    /// Forget the cached access token; the next `get_token` fetches a new one
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if state.take().is_some() {
            info!("access token invalidated");
        }
    }

    /// Forget the cached access token only while it is still `rejected`.
    ///
    /// A caller that saw the platform refuse a token must not drop a newer one
    /// another caller refreshed in the meantime.
    pub async fn invalidate_if(&self, rejected: &Credential) {
        let mut state = self.state.lock().await;
        if state.as_ref().is_some_and(|current| current.value == rejected.value) {
            *state = None;
            info!("rejected access token invalidated");
        } else {
            debug!("rejected access token already replaced");
        }
    }

    /// One request against the token endpoint
    async fn refresh_once(&self, attempt: u32) -> Result<Credential> {
        let metrics = get_metrics().await;
        metrics.token_refresh_requests.inc();
        debug!(attempt, "requesting access token");

        let result = async {
            let response = self
                .client
                .get(self.endpoints.token_url(&self.identity))
                .send()
                .await?;
            let token: TokenResponse = typed(read_json(response).await?)?;
            Ok::<_, WeixinError>(Credential::new(token.access_token, token.expires_in, now_i64()))
        }
        .await;

        if let Err(err) = &result {
            metrics.token_refresh_failures.with_label_values(&[failure_reason(err)]).inc();
            warn!(attempt, error = %err, "access token request failed");
        }
        result
    }
}
