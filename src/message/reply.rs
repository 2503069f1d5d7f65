use crate::helpers::time::now_i64;
use crate::message::inbound::InboundMessage;
use crate::message::xml::{cdata_element, plain_element};

/// Passive text reply written into the webhook response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReply {
    pub to_user: String,
    pub from_user: String,
    pub create_time: i64,
    pub content: String,
}

impl TextReply {
    /// Answer `message`: the sender becomes the recipient and vice versa
    pub fn to(message: &InboundMessage, content: impl Into<String>) -> Self {
        Self {
            to_user: message.from_user_name.clone().unwrap_or_default(),
            from_user: message.to_user_name.clone().unwrap_or_default(),
            create_time: now_i64(),
            content: content.into(),
        }
    }

    pub fn to_xml(&self) -> String {
        format!(
            "<xml>{}{}{}{}{}</xml>",
            cdata_element("ToUserName", &self.to_user),
            cdata_element("FromUserName", &self.from_user),
            plain_element("CreateTime", &self.create_time.to_string()),
            cdata_element("MsgType", "text"),
            cdata_element("Content", &self.content),
        )
    }
}
