/*
 * wire_message.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::json;
use serde_json::Value;
use strum_macros::Display;
use strum_macros::EnumString;

use crate::error::Error;
use crate::wire::header::JupyterHeader;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::ProtocolMessage;

/// The kernel channel a message travels on. Requests from the frontend go out
/// on the shell channel; comm replies and status updates come back on IOPub.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Shell,
    IOPub,
    Control,
    Stdin,
}

/// Represents an untyped Jupyter message delivered over the wire, in the JSON
/// framing used by the Jupyter server's kernel channels. A WireMessage can
/// represent any kind of Jupyter message; typically its header will be
/// examined and it will be converted into a typed JupyterMessage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// The header for this message
    pub header: JupyterHeader,

    /// The header of the message from which this message originated, if any.
    /// If none, it's serialized as an empty dict as required by the Jupyter
    /// protocol.
    #[serde(
        serialize_with = "serialize_none_as_empty_dict",
        deserialize_with = "deserialize_empty_dict_as_none",
        default
    )]
    pub parent_header: Option<JupyterHeader>,

    /// Additional metadata, if any
    #[serde(default)]
    pub metadata: Value,

    /// The body (payload) of the message
    pub content: Value,

    /// The channel the message was sent or received on
    pub channel: Channel,
}

impl WireMessage {
    /// Return the Jupyter type of the message.
    pub fn message_type(&self) -> String {
        self.header.msg_type.clone()
    }

    /// ID of the message this one replies to, if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_header.as_ref().map(|parent| parent.msg_id.as_str())
    }

    /// Parse a message from its JSON frame.
    pub fn from_json(frame: &str) -> Result<Self, Error> {
        let value: Value = match serde_json::from_str(frame) {
            Ok(value) => value,
            Err(err) => {
                return Err(Error::InvalidMessage(
                    String::from("frame"),
                    Value::String(String::from(frame)),
                    err,
                ))
            },
        };
        match serde_json::from_value(value.clone()) {
            Ok(msg) => Ok(msg),
            Err(err) => Err(Error::InvalidMessage(String::from("frame"), value, err)),
        }
    }

    /// Serialize this message into its JSON frame.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(Error::CannotSerialize)
    }

    /// Short description of the message for logging, e.g.
    /// `comm_msg/inspect` or `status/idle`.
    pub fn describe(&self) -> String {
        match self.header.msg_type.as_str() {
            "comm_msg" => {
                if let Some(Value::String(method)) = self
                    .content
                    .get("data")
                    .and_then(|data| data.get("method"))
                {
                    return format!("comm_msg/{method}");
                }
            },
            "status" => {
                if let Some(Value::String(state)) = self.content.get("execution_state") {
                    return format!("status/{state}");
                }
            },
            _ => {},
        }
        self.header.msg_type.clone()
    }
}

fn serialize_none_as_empty_dict<S>(
    parent: &Option<JupyterHeader>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match parent {
        Some(header) => header.serialize(serializer),
        None => json!({}).serialize(serializer),
    }
}

fn deserialize_empty_dict_as_none<'de, D>(deserializer: D) -> Result<Option<JupyterHeader>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl<T> TryFrom<&JupyterMessage<T>> for WireMessage
where
    T: ProtocolMessage,
{
    type Error = crate::error::Error;

    /// Create a WireMessage from a JupyterMessage
    fn try_from(msg: &JupyterMessage<T>) -> Result<Self, Error> {
        let content = match serde_json::to_value(msg.content.clone()) {
            Ok(val) => val,
            Err(err) => return Err(Error::CannotSerialize(err)),
        };
        Ok(Self {
            header: msg.header.clone(),
            parent_header: msg.parent_header.clone(),
            metadata: json!({}),
            content,
            channel: msg.channel,
        })
    }
}

impl<T> TryFrom<&WireMessage> for JupyterMessage<T>
where
    T: DeserializeOwned,
{
    type Error = crate::error::Error;

    /// Converts a WireMessage into a typed JupyterMessage by coercing its
    /// content into the expected structure.
    fn try_from(msg: &WireMessage) -> Result<Self, Error> {
        let content = match serde_json::from_value(msg.content.clone()) {
            Ok(val) => val,
            Err(err) => {
                return Err(Error::InvalidMessage(
                    msg.header.msg_type.clone(),
                    msg.content.clone(),
                    err,
                ))
            },
        };
        Ok(JupyterMessage {
            header: msg.header.clone(),
            parent_header: msg.parent_header.clone(),
            content,
            channel: msg.channel,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_orphan_parent_is_empty_dict() {
        let header = JupyterHeader::create(
            String::from("status"),
            String::from("session"),
            String::from("user"),
        );
        let msg = WireMessage {
            header,
            parent_header: None,
            metadata: json!({}),
            content: json!({"execution_state": "idle"}),
            channel: Channel::IOPub,
        };

        let frame = msg.to_json().unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["parent_header"], json!({}));
        assert_eq!(value["channel"], json!("iopub"));

        let parsed = WireMessage::from_json(&frame).unwrap();
        assert!(parsed.parent_header.is_none());
        assert_eq!(parsed.describe(), "status/idle");
    }

    #[test]
    fn test_parent_header_is_parsed() {
        let parent = JupyterHeader::create(
            String::from("comm_msg"),
            String::from("session"),
            String::from("client"),
        );
        let frame = json!({
            "header": JupyterHeader::create(
                String::from("comm_msg"),
                String::from("session"),
                String::from("kernel"),
            ),
            "parent_header": parent,
            "content": {"comm_id": "abc", "data": {"result": null}},
            "channel": "iopub",
        })
        .to_string();

        let msg = WireMessage::from_json(&frame).unwrap();
        assert_eq!(msg.parent_id(), Some(parent.msg_id.as_str()));
        assert_eq!(msg.metadata, Value::Null);
    }

    #[test]
    fn test_invalid_frame() {
        let err = WireMessage::from_json("{\"header\": 1").unwrap_err();
        assert!(matches!(err, Error::InvalidMessage(..)));
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(Channel::IOPub.to_string(), "iopub");
        assert_eq!(Channel::from_str("shell").unwrap(), Channel::Shell);
    }
}
