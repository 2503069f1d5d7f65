//! Platform api
//!
//! `WeixinClient` owns the http client and the shared access token cache;
//! each endpoint family extends it from its own file.

pub mod client;
pub mod endpoints;
pub mod oauth2;
pub mod response;
pub mod user_info;
