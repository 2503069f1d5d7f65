use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tracing::info;

use crate::api::client::WeixinClient;
use crate::config::account::WebhookConfig;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::api_routes;
use crate::utils::constants::HEALTH_PATH;
use crate::webhook::routes::WebhookState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub webhook_state: WebhookState,
    pub client: WeixinClient,
}

impl AppState {
    pub fn new(
        metrics: &Metrics,
        client: WeixinClient,
        token: impl Into<String>,
        webhook: &WebhookConfig,
    ) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            webhook_state: WebhookState::new(token, webhook),
            client,
        }
    }
}

/// Every route the agent serves: health, metrics, webhook and optionally the json api
pub fn app(state: AppState, settings_config: &SettingsConfig, webhook: &WebhookConfig) -> Router {
    let mut router = Router::new()
        .route(HEALTH_PATH, get(health))
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.webhook_state.router());

    if webhook.expose_api {
        router = router.merge(api_routes::router());
    }
    router.with_state(state)
}

/// Serve until Ctrl-C
pub async fn start(
    settings_config: &SettingsConfig,
    webhook: &WebhookConfig,
    client: WeixinClient,
    token: String,
) -> Result<()> {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, client, token, webhook);
    let app = app(state, settings_config, webhook);

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);

    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;
    metrics.up.set(0);

    info!("server stopped");
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
