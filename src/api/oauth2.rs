use serde::Deserialize;
use tracing::debug;

use crate::api::client::WeixinClient;
use crate::api::response::typed;
use crate::api::user_info::UserInfo;
use crate::error::Result;
use crate::utils::constants::DEFAULT_LANG;

static OAUTH2_TOKEN_ENDPOINT: &str = "oauth2_access_token";
static OAUTH2_USER_INFO_ENDPOINT: &str = "oauth2_user_info";
static DEFAULT_STATE: &str = "STATE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthScope {
    /// silent redirect, only the openid is available
    Base,
    /// consent page, profile available even for non followers
    UserInfo,
}

impl OAuthScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthScope::Base => "snsapi_base",
            OAuthScope::UserInfo => "snsapi_userinfo",
        }
    }
}

/// Web authorization token; unrelated to the cached access token
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthAccessToken {
    pub access_token: String,
    pub openid: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl WeixinClient {
    /// Authorization page the user is redirected to; `redirect_uri` is passed raw
    pub fn oauth2_url(&self, redirect_uri: &str, scope: OAuthScope, state: &str) -> String {
        self.endpoints
            .oauth2_authorize_url(&self.identity().app_id, redirect_uri, scope.as_str(), state)
            .to_string()
    }

    pub fn oauth2_userinfo_url(&self, redirect_uri: &str) -> String {
        self.oauth2_url(redirect_uri, OAuthScope::UserInfo, DEFAULT_STATE)
    }

    pub fn oauth2_base_url(&self, redirect_uri: &str) -> String {
        self.oauth2_url(redirect_uri, OAuthScope::Base, DEFAULT_STATE)
    }

    /// Trade the `code` from the authorization redirect for a web token
    pub async fn oauth2_exchange_code(&self, code: &str) -> Result<OAuthAccessToken> {
        let url = self.endpoints.oauth2_access_token_url(self.identity(), code);
        let json = self.get_json(OAUTH2_TOKEN_ENDPOINT, url).await?;
        let token: OAuthAccessToken = typed(json)?;
        debug!(openid = %token.openid, scope = ?token.scope, "oauth2 code exchanged");
        Ok(token)
    }

    pub async fn oauth2_open_id(&self, code: &str) -> Result<String> {
        Ok(self.oauth2_exchange_code(code).await?.openid)
    }

    /// Profile of the user behind `code`; carries no subscribe data
    pub async fn oauth2_user_info(&self, code: &str) -> Result<UserInfo> {
        let token = self.oauth2_exchange_code(code).await?;
        let url = self.endpoints.oauth2_user_info_url(&token.access_token, &token.openid);
        let json = self.get_json(OAUTH2_USER_INFO_ENDPOINT, url).await?;
        let mut user: UserInfo = typed(json)?;

        user.subscribe = false;
        user.subscribe_time = None;
        if user.language.is_none() {
            user.language = Some(DEFAULT_LANG.to_owned());
        }
        Ok(user)
    }
}
