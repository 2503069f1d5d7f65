//! Inbound push messages.
//!
//! The platform pushes every message kind (text, image, voice, link,
//! location, event) with the same flat element layout, so one record with
//! optional fields covers them all; callers branch on `msg_type` / `event`.

use serde::Serialize;
use tracing::{debug, warn};
use xml::reader::{EventReader, ParserConfig, XmlEvent};

use crate::error::{Result, WeixinError};
use crate::message::xml::{cdata_element, plain_element};

/// Recognized elements as sent, first occurrence of each
#[derive(Debug, Default)]
struct RawMessage {
    to_user_name: Option<String>,
    from_user_name: Option<String>,
    create_time: Option<String>,
    msg_type: Option<String>,
    content: Option<String>,
    msg_id: Option<String>,
    description: Option<String>,
    format: Option<String>,
    media_id: Option<String>,
    pic_url: Option<String>,
    thumb_media_id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    event: Option<String>,
    event_key: Option<String>,
    location_x: Option<String>,
    location_y: Option<String>,
    scale: Option<String>,
    label: Option<String>,
}

impl RawMessage {
    fn slot(&mut self, element: &str) -> Option<&mut Option<String>> {
        let slot = match element {
            "ToUserName" => &mut self.to_user_name,
            "FromUserName" => &mut self.from_user_name,
            "CreateTime" => &mut self.create_time,
            "MsgType" => &mut self.msg_type,
            "Content" => &mut self.content,
            "MsgId" => &mut self.msg_id,
            "Description" => &mut self.description,
            "Format" => &mut self.format,
            "MediaId" => &mut self.media_id,
            "PicUrl" => &mut self.pic_url,
            "ThumbMediaId" => &mut self.thumb_media_id,
            "Title" => &mut self.title,
            "Url" => &mut self.url,
            "Event" => &mut self.event,
            "EventKey" => &mut self.event_key,
            "Location_X" => &mut self.location_x,
            "Location_Y" => &mut self.location_y,
            "Scale" => &mut self.scale,
            "Label" => &mut self.label,
            _ => return None,
        };
        Some(slot)
    }

    /// Walk the whole document: children of the root are fields, their direct
    /// text is the value. Anything after the root element is an error.
    fn parse(raw: &str) -> std::result::Result<Self, String> {
        let config = ParserConfig::new()
            .trim_whitespace(false)
            .whitespace_to_characters(true)
            .cdata_to_characters(true)
            .coalesce_characters(true)
            .ignore_comments(true);
        let reader = EventReader::new_with_config(raw.as_bytes(), config);

        let mut message = RawMessage::default();
        let mut depth = 0usize;
        let mut root_closed = false;
        // element name and text collected so far, for a field being read
        let mut current: Option<(String, String)> = None;

        for event in reader {
            match event.map_err(|e| e.to_string())? {
                XmlEvent::StartElement { name, .. } => {
                    if root_closed {
                        return Err(format!("second root element <{}>", name.local_name));
                    }
                    depth += 1;
                    if depth == 2 {
                        current = Some((name.local_name, String::new()));
                    }
                }
                XmlEvent::Characters(text) | XmlEvent::Whitespace(text) => {
                    if depth == 0 && !text.trim().is_empty() {
                        return Err("text outside the root element".to_string());
                    }
                    if depth == 2 {
                        if let Some((_, value)) = current.as_mut() {
                            value.push_str(&text);
                        }
                    }
                }
                XmlEvent::EndElement { .. } => {
                    if depth == 2 {
                        if let Some((element, value)) = current.take() {
                            if let Some(slot) = message.slot(&element) {
                                if slot.is_none() {
                                    *slot = Some(value);
                                }
                            }
                        }
                    }
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        root_closed = true;
                    }
                }
                XmlEvent::EndDocument => break,
                _ => {}
            }
        }

        if !root_closed {
            return Err("no root element".to_string());
        }
        Ok(message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InboundMessage {
    /// official account id the message was sent to
    pub to_user_name: Option<String>,
    /// sender openid
    pub from_user_name: Option<String>,
    pub create_time: Option<i64>,
    pub msg_type: Option<String>,
    pub content: Option<String>,
    pub msg_id: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    pub media_id: Option<String>,
    pub pic_url: Option<String>,
    pub thumb_media_id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub event: Option<String>,
    pub event_key: Option<String>,
    pub location_x: Option<String>,
    pub location_y: Option<String>,
    pub scale: Option<String>,
    pub label: Option<String>,
    /// payload exactly as received
    #[serde(skip)]
    pub raw: Option<String>,
}

/// Decode a pushed payload.
///
/// `None` and `""` give an empty record; a payload that is not well-formed
/// XML is an error and never yields a partial record.
pub fn decode(raw: Option<&str>) -> Result<InboundMessage> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            debug!("empty inbound payload");
            return Ok(InboundMessage::default());
        }
    };

    let parsed = RawMessage::parse(raw).map_err(|reason| {
        warn!(error = %reason, payload = raw, "inbound payload is not well-formed xml");
        WeixinError::MalformedMessage { reason, raw: raw.to_owned() }
    })?;

    let mut message = InboundMessage::from(parsed);
    message.raw = Some(raw.to_owned());
    Ok(message)
}

/// Decode an http request body
pub fn decode_bytes(body: &[u8]) -> Result<InboundMessage> {
    let body = String::from_utf8_lossy(body);
    decode(Some(body.as_ref()))
}

impl From<RawMessage> for InboundMessage {
    fn from(raw: RawMessage) -> Self {
        Self {
            to_user_name: raw.to_user_name,
            from_user_name: raw.from_user_name,
            create_time: raw.create_time.map(|t| t.trim().parse().unwrap_or(0)),
            msg_type: raw.msg_type,
            content: raw.content,
            msg_id: raw.msg_id,
            description: raw.description,
            format: raw.format,
            media_id: raw.media_id,
            pic_url: raw.pic_url,
            thumb_media_id: raw.thumb_media_id,
            title: raw.title,
            url: raw.url,
            event: raw.event,
            event_key: raw.event_key,
            location_x: raw.location_x,
            location_y: raw.location_y,
            scale: raw.scale,
            label: raw.label,
            raw: None,
        }
    }
}

impl InboundMessage {
    /// True when nothing was received
    pub fn is_empty(&self) -> bool {
        *self == InboundMessage::default()
    }

    pub fn is_event(&self) -> bool {
        self.msg_type.as_deref() == Some("event")
    }

    /// Serialize the populated fields back into the push layout
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<xml>");
        let text_fields = [
            ("ToUserName", &self.to_user_name),
            ("FromUserName", &self.from_user_name),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value {
                xml.push_str(&cdata_element(name, value));
            }
        }
        if let Some(create_time) = self.create_time {
            xml.push_str(&plain_element("CreateTime", &create_time.to_string()));
        }
        let text_fields = [
            ("MsgType", &self.msg_type),
            ("Content", &self.content),
            ("Description", &self.description),
            ("Format", &self.format),
            ("MediaId", &self.media_id),
            ("PicUrl", &self.pic_url),
            ("ThumbMediaId", &self.thumb_media_id),
            ("Title", &self.title),
            ("Url", &self.url),
            ("Event", &self.event),
            ("EventKey", &self.event_key),
            ("Label", &self.label),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value {
                xml.push_str(&cdata_element(name, value));
            }
        }
        let plain_fields = [
            ("MsgId", &self.msg_id),
            ("Location_X", &self.location_x),
            ("Location_Y", &self.location_y),
            ("Scale", &self.scale),
        ];
        for (name, value) in plain_fields {
            if let Some(value) = value {
                xml.push_str(&plain_element(name, value));
            }
        }
        xml.push_str("</xml>");
        xml
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TEXT_MESSAGE: &str = "<xml><ToUserName><![CDATA[gh_1]]></ToUserName><FromUserName><![CDATA[u1]]></FromUserName><CreateTime>1000</CreateTime><MsgType><![CDATA[text]]></MsgType><Content><![CDATA[hi]]></Content><MsgId>42</MsgId></xml>";

    #[test]
    fn empty_input_gives_empty_record() {
        let from_none = decode(None).unwrap();
        let from_empty = decode(Some("")).unwrap();

        assert!(from_none.is_empty());
        assert!(from_empty.is_empty());
        assert_eq!(from_none.raw, None);
    }

    #[test]
    fn text_message_populates_exactly_its_fields() {
        let message = decode(Some(TEXT_MESSAGE)).unwrap();

        let expected = InboundMessage {
            to_user_name: Some("gh_1".into()),
            from_user_name: Some("u1".into()),
            create_time: Some(1000),
            msg_type: Some("text".into()),
            content: Some("hi".into()),
            msg_id: Some("42".into()),
            raw: Some(TEXT_MESSAGE.into()),
            ..InboundMessage::default()
        };
        assert_eq!(message, expected);
        assert!(!message.is_event());
    }

    #[test]
    fn non_numeric_create_time_defaults_to_zero() {
        let message = decode(Some("<xml><CreateTime>soon</CreateTime></xml>")).unwrap();
        assert_eq!(message.create_time, Some(0));
    }

    #[test]
    fn event_and_link_fields() {
        let raw = "<xml>\
            <ToUserName><![CDATA[gh_1]]></ToUserName>\
            <FromUserName><![CDATA[u1]]></FromUserName>\
            <CreateTime>1509453449</CreateTime>\
            <MsgType><![CDATA[event]]></MsgType>\
            <Event><![CDATA[subscribe]]></Event>\
            <EventKey><![CDATA[qrscene_7]]></EventKey>\
            </xml>";
        let message = decode(Some(raw)).unwrap();
        assert!(message.is_event());
        assert_eq!(message.event.as_deref(), Some("subscribe"));
        assert_eq!(message.event_key.as_deref(), Some("qrscene_7"));
        assert_eq!(message.content, None);

        let raw = "<xml><MsgType><![CDATA[link]]></MsgType><Title><![CDATA[Docs]]></Title>\
            <Description><![CDATA[Read me]]></Description><Url><![CDATA[https://example.com/a?b=1]]></Url>\
            <MsgId>7</MsgId></xml>";
        let message = decode(Some(raw)).unwrap();
        assert_eq!(message.title.as_deref(), Some("Docs"));
        assert_eq!(message.description.as_deref(), Some("Read me"));
        assert_eq!(message.url.as_deref(), Some("https://example.com/a?b=1"));
    }

    #[test]
    fn image_message_fields() {
        let raw = "<xml><MsgType><![CDATA[image]]></MsgType><PicUrl><![CDATA[http://mmbiz.qpic.cn/x]]></PicUrl>\
            <MediaId><![CDATA[media_1]]></MediaId><MsgId>8</MsgId></xml>";
        let message = decode(Some(raw)).unwrap();
        assert_eq!(message.pic_url.as_deref(), Some("http://mmbiz.qpic.cn/x"));
        assert_eq!(message.media_id.as_deref(), Some("media_1"));
        assert_eq!(message.thumb_media_id, None);
    }

    #[test]
    fn malformed_markup_is_an_error() {
        let raw = "<xml><ToUserName><![CDATA[gh_1]]></ToUserName><Content>hi</xml>";
        match decode(Some(raw)) {
            Err(WeixinError::MalformedMessage { raw: kept, .. }) => assert_eq!(kept, raw),
            other => panic!("expected malformed message, got {other:?}"),
        }
    }

    #[test]
    fn bytes_are_decoded_like_text() {
        let message = decode_bytes(TEXT_MESSAGE.as_bytes()).unwrap();
        assert_eq!(message.content.as_deref(), Some("hi"));
    }

    #[test]
    fn reserialized_message_decodes_to_same_fields() {
        let message = decode(Some(TEXT_MESSAGE)).unwrap();
        let again = decode(Some(message.to_xml().as_str())).unwrap();

        assert_eq!(InboundMessage { raw: None, ..again }, InboundMessage { raw: None, ..message });
    }

    #[test]
    fn cdata_whitespace_is_kept() {
        let message = decode(Some("<xml><Content><![CDATA[  hi  ]]></Content></xml>")).unwrap();
        assert_eq!(message.content.as_deref(), Some("  hi  "));

        let message = decode(Some("<xml><Content>   </Content><Label></Label></xml>")).unwrap();
        assert_eq!(message.content.as_deref(), Some("   "));
        assert_eq!(message.label.as_deref(), Some(""));
    }

    #[test]
    fn entities_are_resolved() {
        let message = decode(Some("<xml><Content> a &amp; b &lt;c&gt; </Content></xml>")).unwrap();
        assert_eq!(message.content.as_deref(), Some(" a & b <c> "));
    }

    #[test]
    fn data_after_root_is_an_error() {
        for raw in [
            "<xml><Content>a</Content></xml><oops",
            "<xml><Content>a</Content></xml><xml><Content>b</Content></xml>",
            "<xml><Content>a</Content></xml>tail",
        ] {
            match decode(Some(raw)) {
                Err(WeixinError::MalformedMessage { raw: kept, .. }) => assert_eq!(kept, raw),
                other => panic!("expected malformed message for {raw}, got {other:?}"),
            }
        }

        let message = decode(Some("<xml><Content>a</Content></xml>\n")).unwrap();
        assert_eq!(message.content.as_deref(), Some("a"));
    }

    #[test]
    fn first_occurrence_wins() {
        let message = decode(Some("<xml><Content>a</Content><Content>b</Content></xml>")).unwrap();
        assert_eq!(message.content.as_deref(), Some("a"));
    }

    #[test]
    fn nested_markup_keeps_direct_text() {
        let raw = "<xml><Content>a<b>x</b>c</Content><Unknown><MsgId>9</MsgId></Unknown></xml>";
        let message = decode(Some(raw)).unwrap();
        assert_eq!(message.content.as_deref(), Some("ac"));
        assert_eq!(message.msg_id, None);
    }

    #[test]
    fn reserialized_special_text_survives() {
        let message = InboundMessage {
            from_user_name: Some("u1".into()),
            content: Some("  a & b ]]> <c>  ".into()),
            msg_id: Some("1 & 2".into()),
            label: Some(" ".into()),
            ..InboundMessage::default()
        };
        let again = decode(Some(message.to_xml().as_str())).unwrap();

        assert_eq!(InboundMessage { raw: None, ..again }, message);
    }
}
