use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::client::WeixinClient;
use crate::api::response::typed;
use crate::cache::credential::Credential;
use crate::error::Result;

static USER_INFO_ENDPOINT: &str = "user_info";

/// Follower profile; the profile fields are only filled for subscribed users
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "subscribe_flag")]
    pub subscribe: bool,
    #[serde(default)]
    pub openid: String,
    pub nickname: Option<String>,
    /// 1 male, 2 female, 0 unknown
    pub sex: Option<u8>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    #[serde(rename = "headimgurl")]
    pub head_img_url: Option<String>,
    pub subscribe_time: Option<i64>,
}

impl UserInfo {
    /// Drop profile fields for users that do not follow the account
    pub(crate) fn subscribed_only(self) -> Self {
        if self.subscribe {
            self
        } else {
            Self { subscribe: false, openid: self.openid, ..Self::default() }
        }
    }
}

/// The platform sends `subscribe` as 0/1; older replies quote it
fn subscribe_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => s.trim() == "1",
        _ => false,
    })
}

impl WeixinClient {
    /// Profile of a follower, looked up with the cached access token.
    ///
    /// When the platform rejects the access token it is invalidated and the
    /// lookup is retried once with a fresh one.
    pub async fn user_info(&self, openid: &str) -> Result<UserInfo> {
        let credential = self.cache.get_token().await?;
        match self.fetch_user_info(&credential, openid).await {
            Err(err) if err.is_token_expired() => {
                info!(error = %err, "access token rejected, refreshing and retrying user info");
                self.cache.invalidate_if(&credential).await;
                let credential = self.cache.get_token().await?;
                self.fetch_user_info(&credential, openid).await
            }
            other => other,
        }
    }

    async fn fetch_user_info(&self, credential: &Credential, openid: &str) -> Result<UserInfo> {
        let url = self.endpoints.user_info_url(&credential.value, openid);
        let json = self.get_json(USER_INFO_ENDPOINT, url).await?;
        let user: UserInfo = typed(json)?;
        debug!(openid, subscribe = user.subscribe, "user info received");
        Ok(user.subscribed_only())
    }
}
