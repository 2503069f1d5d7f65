use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::WeixinError;
use crate::server::server::AppState;

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

/// Json lookups over the platform api, mounted when `webhook.expose_api` is set
pub fn router() -> Router<AppState> {
    info!("served api paths: /users/{{openid}}, /oauth/callback");
    Router::new()
        .route("/users/{openid}", get(get_user))
        .route("/oauth/callback", get(oauth_callback))
}

async fn get_user(State(state): State<AppState>, Path(openid): Path<String>) -> Response {
    match state.client.user_info(&openid).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => error_response(err),
    }
}

/// Redirect target of the authorization page
async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        // the user declined the consent page
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing code" }))).into_response();
    };
    info!(state = params.state.as_deref().unwrap_or("-"), "oauth callback");

    match state.client.oauth2_user_info(&code).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: WeixinError) -> Response {
    let status = match &err {
        WeixinError::TokenUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        WeixinError::Upstream { .. } | WeixinError::Transport(_) | WeixinError::InvalidResponse(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(error = %err, status = status.as_u16(), "api request failed");

    let body = match &err {
        WeixinError::Upstream { errcode, errmsg } => json!({ "error": err.to_string(), "errcode": errcode, "errmsg": errmsg }),
        _ => json!({ "error": err.to_string() }),
    };
    (status, Json(body)).into_response()
}
