//! Shared constants and invariants

pub const DEFAULT_STALE_AFTER_SECS: u64 = 5000;
/// access tokens are issued for 7200 seconds
pub const MAX_STALE_AFTER_SECS: u64 = 7200;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_REFRESH_ATTEMPTS: u32 = 3;

pub const DEFAULT_API_BASE_URL: &str = "https://api.weixin.qq.com";
pub const DEFAULT_OPEN_BASE_URL: &str = "https://open.weixin.qq.com";

// Platform endpoints, relative to the api / open base urls
pub const TOKEN_PATH: &str = "/cgi-bin/token";
pub const USER_INFO_PATH: &str = "/cgi-bin/user/info";
pub const OAUTH2_AUTHORIZE_PATH: &str = "/connect/oauth2/authorize";
pub const OAUTH2_ACCESS_TOKEN_PATH: &str = "/sns/oauth2/access_token";
pub const OAUTH2_USER_INFO_PATH: &str = "/sns/userinfo";

pub const DEFAULT_LANG: &str = "zh_CN";
pub const HEALTH_PATH: &str = "/health";
