use thiserror::Error;

/// Platform error codes meaning the access token is invalid or expired.
const TOKEN_EXPIRED_CODES: [i64; 3] = [40001, 40014, 42001];

#[derive(Debug, Error)]
pub enum WeixinError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The platform answered with an `errcode` field.
    #[error("weixin api error {errcode}: {errmsg}")]
    Upstream { errcode: i64, errmsg: String },

    #[error("unexpected response body: {0}")]
    InvalidResponse(String),

    /// Inbound payload is not well-formed XML; `raw` keeps the payload for diagnostics.
    #[error("malformed inbound message: {reason}")]
    MalformedMessage { reason: String, raw: String },

    #[error("access token unavailable after {attempts} attempts")]
    TokenUnavailable { attempts: u32 },

    #[error("configuration error: {0}")]
    Config(String),
}

impl WeixinError {
    pub fn is_token_expired(&self) -> bool {
        matches!(self, WeixinError::Upstream { errcode, .. } if TOKEN_EXPIRED_CODES.contains(errcode))
    }
}

pub type Result<T, E = WeixinError> = std::result::Result<T, E>;
