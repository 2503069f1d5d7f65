//! The platform reports failures in-band: a reply carrying an `errcode`
//! field is an error, a reply without one is a success. That rule is applied
//! here once and turned into a typed `Result`.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, WeixinError};

/// Read the body regardless of status and check it for an in-band error
pub async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;
    parse_reply(status, &body)
}

pub fn parse_reply(status: StatusCode, body: &str) -> Result<Value> {
    let json: Value = serde_json::from_str(body).map_err(|e| {
        WeixinError::InvalidResponse(format!("status {}, {}: {}", status, e, body))
    })?;
    check(json)
}

pub fn check(json: Value) -> Result<Value> {
    let errcode = match json.get("errcode") {
        None | Some(Value::Null) => return Ok(json),
        Some(code) => code
            .as_i64()
            .or_else(|| code.as_str().and_then(|s| s.trim().parse().ok()))
            .unwrap_or(-1),
    };

    // some endpoints send `errcode: 0` alongside a successful payload
    if errcode == 0 {
        return Ok(json);
    }

    let errmsg = json
        .get("errmsg")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    Err(WeixinError::Upstream { errcode, errmsg })
}

pub fn typed<T: DeserializeOwned>(json: Value) -> Result<T> {
    let raw = json.to_string();
    serde_json::from_value(json)
        .map_err(|e| WeixinError::InvalidResponse(format!("{}: {}", e, raw)))
}

/// Short label for failure metrics
pub fn failure_reason(err: &WeixinError) -> &'static str {
    match err {
        WeixinError::Transport(_) => "transport",
        WeixinError::Upstream { .. } => "upstream",
        WeixinError::InvalidResponse(_) => "invalid_response",
        WeixinError::MalformedMessage { .. } => "malformed_message",
        WeixinError::TokenUnavailable { .. } => "token_unavailable",
        WeixinError::Config(_) => "config",
    }
}
