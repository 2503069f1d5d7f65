// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use axum::{http::StatusCode, routing::get, Json};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::api::client::WeixinClient;
use crate::api::endpoints::Endpoints;
use crate::cache::token_cache::TokenCache;
use crate::config::account::AppIdentity;
use crate::config::settings::TokenCacheConfig;
use crate::resilience::retry::RetrySettings;
use crate::utils::constants::TOKEN_PATH;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn test_identity() -> AppIdentity {
    AppIdentity::new("wx-test", "secret-test")
}

/// Token endpoint that answers with an upstream error for the first `fail_first`
/// calls, then hands out `token-<n>`; returns the router and the call counter.
pub fn token_server(fail_first: usize) -> (Router, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();
    let router = Router::new().route(TOKEN_PATH, get(move || {
        let c = counter_clone.clone();
        async move {
            let n = c.fetch_add(1, Ordering::SeqCst);
            if n < fail_first {
                (StatusCode::OK, Json(json!({"errcode": -1, "errmsg": "system error"})))
            } else {
                (StatusCode::OK, Json(json!({"access_token": format!("token-{}", n + 1), "expires_in": 7200})))
            }
        }
    }));
    (router, counter)
}

pub fn build_token_cache(api_base: &str, policy: TokenCacheConfig) -> TokenCache {
    let endpoints = Arc::new(Endpoints::new(api_base, api_base).expect("endpoints"));
    TokenCache::new(
        build_reqwest_client(),
        endpoints,
        test_identity(),
        policy,
        RetrySettings::default(),
    )
}

pub fn build_weixin_client(api_base: &str, open_base: &str) -> WeixinClient {
    let client = build_reqwest_client();
    let endpoints = Arc::new(Endpoints::new(api_base, open_base).expect("endpoints"));
    let cache = Arc::new(TokenCache::new(
        client.clone(),
        endpoints.clone(),
        test_identity(),
        TokenCacheConfig::default(),
        RetrySettings::default(),
    ));
    WeixinClient::new(client, endpoints, cache)
}
