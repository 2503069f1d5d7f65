//! # Weixin Agent Library
//!
//! Client for the WeChat Official Account platform: a cached access token
//! with bounded refresh retries, user info and web authorization lookups,
//! inbound push message decoding, passive replies and the webhook handshake.
//!
//! Modules:
//! - `cache`: access token cache
//! - `api`: platform endpoints on top of the cache
//! - `message`: inbound message decoding and reply composition
//! - `webhook`: signature verification and webhook routes
//! - `config`: service configuration loading and validation

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod message;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod utils;
pub mod webhook;

#[cfg(test)]
mod tests;

pub use crate::api::client::WeixinClient;
pub use crate::api::user_info::UserInfo;
pub use crate::cache::credential::Credential;
pub use crate::cache::token_cache::TokenCache;
pub use crate::error::{Result, WeixinError};
pub use crate::message::inbound::{decode, InboundMessage};
pub use crate::message::reply::TextReply;
