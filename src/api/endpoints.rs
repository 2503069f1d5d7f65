//! Typed url building for the platform endpoints.
//!
//! Every query parameter goes through `Url::query_pairs_mut`, so values are
//! form-encoded and can never collide with each other.

use reqwest::Url;

use crate::config::account::AppIdentity;
use crate::config::settings::HttpConfig;
use crate::error::{Result, WeixinError};
use crate::utils::constants::{
    DEFAULT_LANG, OAUTH2_ACCESS_TOKEN_PATH, OAUTH2_AUTHORIZE_PATH, OAUTH2_USER_INFO_PATH,
    TOKEN_PATH, USER_INFO_PATH,
};

const OAUTH2_FRAGMENT: &str = "wechat_redirect";

#[derive(Debug, Clone)]
pub struct Endpoints {
    api_base: Url,
    open_base: Url,
}

impl Endpoints {
    pub fn new(api_base_url: &str, open_base_url: &str) -> Result<Self> {
        Ok(Self {
            api_base: parse_base(api_base_url)?,
            open_base: parse_base(open_base_url)?,
        })
    }

    pub fn from_config(http: &HttpConfig) -> Result<Self> {
        Self::new(&http.api_base_url, &http.open_base_url)
    }

    pub fn token_url(&self, identity: &AppIdentity) -> Url {
        build(&self.api_base, TOKEN_PATH, &[
            ("grant_type", "client_credential"),
            ("appid", &identity.app_id),
            ("secret", &identity.app_secret),
        ])
    }

    pub fn user_info_url(&self, access_token: &str, openid: &str) -> Url {
        build(&self.api_base, USER_INFO_PATH, &[
            ("access_token", access_token),
            ("openid", openid),
            ("lang", DEFAULT_LANG),
        ])
    }

    pub fn oauth2_authorize_url(&self, app_id: &str, redirect_uri: &str, scope: &str, state: &str) -> Url {
        let mut url = build(&self.open_base, OAUTH2_AUTHORIZE_PATH, &[
            ("appid", app_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope),
            ("state", state),
        ]);
        url.set_fragment(Some(OAUTH2_FRAGMENT));
        url
    }

    pub fn oauth2_access_token_url(&self, identity: &AppIdentity, code: &str) -> Url {
        build(&self.api_base, OAUTH2_ACCESS_TOKEN_PATH, &[
            ("appid", &identity.app_id),
            ("secret", &identity.app_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
        ])
    }

    pub fn oauth2_user_info_url(&self, access_token: &str, openid: &str) -> Url {
        build(&self.api_base, OAUTH2_USER_INFO_PATH, &[
            ("access_token", access_token),
            ("openid", openid),
            ("lang", DEFAULT_LANG),
        ])
    }
}

fn parse_base(value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| WeixinError::Config(format!("invalid base url '{}': {}", value, e)))?;
    if url.cannot_be_a_base() {
        return Err(WeixinError::Config(format!("'{}' cannot be used as a base url", value)));
    }
    Ok(url)
}

/// Append `path` to the base path, keeping any prefix the base carries.
fn build(base: &Url, path: &str, query: &[(&str, &str)]) -> Url {
    let mut url = base.clone();
    let joined = format!("{}{}", base.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    url.set_query(None);
    url.query_pairs_mut().extend_pairs(query);
    url
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::constants::{DEFAULT_API_BASE_URL, DEFAULT_OPEN_BASE_URL};

    fn endpoints() -> Endpoints {
        Endpoints::new(DEFAULT_API_BASE_URL, DEFAULT_OPEN_BASE_URL).unwrap()
    }

    #[test]
    fn token_url_carries_identity_as_query_pairs() {
        let url = endpoints().token_url(&AppIdentity::new("wx1", "s&cret=APPID"));
        assert_eq!(
            url.as_str(),
            "https://api.weixin.qq.com/cgi-bin/token?grant_type=client_credential&appid=wx1&secret=s%26cret%3DAPPID"
        );
    }

    #[test]
    fn authorize_url_encodes_redirect_and_keeps_fragment() {
        let url = endpoints().oauth2_authorize_url("wx1", "https://example.com/cb?a=1", "snsapi_base", "STATE");
        assert_eq!(
            url.as_str(),
            "https://open.weixin.qq.com/connect/oauth2/authorize?appid=wx1&redirect_uri=https%3A%2F%2Fexample.com%2Fcb%3Fa%3D1&response_type=code&scope=snsapi_base&state=STATE#wechat_redirect"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let endpoints = Endpoints::new("http://127.0.0.1:9000/proxy/", DEFAULT_OPEN_BASE_URL).unwrap();
        let url = endpoints.user_info_url("tok", "o1");
        assert_eq!(url.path(), "/proxy/cgi-bin/user/info");
        assert_eq!(url.query(), Some("access_token=tok&openid=o1&lang=zh_CN"));
    }

    #[test]
    fn rejects_invalid_base() {
        assert!(Endpoints::new("not a url", DEFAULT_OPEN_BASE_URL).is_err());
    }
}
