use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::account::WebhookConfig;
use crate::message::inbound::decode_bytes;
use crate::message::reply::TextReply;
use crate::observability::metrics::get_metrics;
use crate::server::server::AppState;
use crate::webhook::signature::{handshake, Handshake, SignatureParams, REJECTION};

/// Body that tells the platform the message was handled and needs no reply
pub static NO_REPLY: &str = "success";

static HANDSHAKE_KIND: &str = "handshake";
static MESSAGE_KIND: &str = "message";

#[derive(Clone)]
pub struct WebhookState {
    token: Arc<String>,
    path: String,
    auto_reply_text: Option<Arc<String>>,
}

impl WebhookState {
    pub fn new(token: impl Into<String>, config: &WebhookConfig) -> Self {
        Self {
            token: Arc::new(token.into()),
            path: config.path.clone(),
            auto_reply_text: config.auto_reply_text.clone().map(Arc::new),
        }
    }

    pub fn router(&self) -> Router<AppState> {
        info!("served webhook path: {}", &self.path);
        Router::new().route(&self.path, get(verify_server).post(receive_message))
    }
}

/// GET sent by the platform when the server url is registered
async fn verify_server(
    State(state): State<AppState>,
    Query(params): Query<SignatureParams>,
) -> Response {
    let metrics = get_metrics().await;

    match handshake(&state.webhook_state.token, &params) {
        Handshake::Accepted(echostr) => {
            info!(timestamp = %params.timestamp, "webhook handshake accepted");
            metrics.webhook_requests.with_label_values(&[HANDSHAKE_KIND, "accepted"]).inc();
            (StatusCode::OK, echostr).into_response()
        }
        Handshake::Rejected => {
            warn!(timestamp = %params.timestamp, nonce = %params.nonce, "webhook handshake rejected");
            metrics.webhook_requests.with_label_values(&[HANDSHAKE_KIND, "rejected"]).inc();
            (StatusCode::FORBIDDEN, REJECTION).into_response()
        }
    }
}

/// POST carrying an inbound message
async fn receive_message(
    State(state): State<AppState>,
    Query(params): Query<SignatureParams>,
    body: Bytes,
) -> Response {
    let metrics = get_metrics().await;
    let webhook = &state.webhook_state;

    if !params.is_signed_by(&webhook.token) {
        warn!(timestamp = %params.timestamp, "inbound message with a bad signature");
        metrics.webhook_requests.with_label_values(&[MESSAGE_KIND, "rejected"]).inc();
        return (StatusCode::FORBIDDEN, REJECTION).into_response();
    }

    let message = match decode_bytes(&body) {
        Ok(message) => message,
        Err(err) => {
            metrics.message_decode_failures.inc();
            metrics.webhook_requests.with_label_values(&[MESSAGE_KIND, "malformed"]).inc();
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    info!(
        msg_type = message.msg_type.as_deref().unwrap_or("-"),
        event = message.event.as_deref().unwrap_or("-"),
        from = message.from_user_name.as_deref().unwrap_or("-"),
        "inbound message"
    );

    let reply = match &webhook.auto_reply_text {
        Some(text) if message.from_user_name.is_some() => TextReply::to(&message, text.as_str()),
        _ => {
            metrics.webhook_requests.with_label_values(&[MESSAGE_KIND, "accepted"]).inc();
            return (StatusCode::OK, NO_REPLY).into_response();
        }
    };
    debug!(to = %reply.to_user, "sending passive reply");
    metrics.webhook_requests.with_label_values(&[MESSAGE_KIND, "replied"]).inc();

    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/xml; charset=utf-8")],
        reply.to_xml(),
    )
        .into_response()
}
