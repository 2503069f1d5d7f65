use serde::Deserialize;
use sha1::{Digest, Sha1};

/// Body returned when a handshake signature does not match
pub static REJECTION: &str = "error request! the request is not from weixin server";

/// Query parameters the platform appends to every webhook request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignatureParams {
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub nonce: String,
    /// only present on the verification GET
    pub echostr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// signature matched, carries the challenge to echo back
    Accepted(String),
    Rejected,
}

impl Handshake {
    pub fn body(&self) -> &str {
        match self {
            Handshake::Accepted(echostr) => echostr,
            Handshake::Rejected => REJECTION,
        }
    }
}

/// Lowercase hex sha1 of the sorted, concatenated `token`, `timestamp` and `nonce`
pub fn sign(token: &str, timestamp: &str, nonce: &str) -> String {
    let mut parts = [token, timestamp, nonce];
    parts.sort_unstable();

    let hash = Sha1::digest(parts.concat().as_bytes());
    hex::encode(hash)
}

pub fn verify(token: &str, timestamp: &str, nonce: &str, signature: &str) -> bool {
    sign(token, timestamp, nonce).eq_ignore_ascii_case(signature)
}

impl SignatureParams {
    pub fn is_signed_by(&self, token: &str) -> bool {
        verify(token, &self.timestamp, &self.nonce, &self.signature)
    }
}

/// Answer the verification request sent when the server url is registered
pub fn handshake(token: &str, params: &SignatureParams) -> Handshake {
    if params.is_signed_by(token) {
        Handshake::Accepted(params.echostr.clone().unwrap_or_default())
    } else {
        Handshake::Rejected
    }
}
