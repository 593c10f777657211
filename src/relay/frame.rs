//! Engine.IO v4 and Socket.IO v5 text framing.
//!
//! An Engine.IO packet is one websocket text frame whose first char is the
//! packet type. Socket.IO packets travel inside Engine.IO `message` packets:
//!
//! ```text
//! <type>[<attachments>-][<namespace>,][<ack id>][<json>]
//! ```

use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_NAMESPACE: &str = "/";

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("unknown packet type {0:?}")]
    UnknownType(char),
    #[error("binary packets are not supported")]
    Binary,
    #[error("bad JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parameters the relay announces in its `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Handshake {
    pub sid: String,
    #[serde(rename = "pingInterval", default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(rename = "pingTimeout", default = "default_ping_timeout")]
    pub ping_timeout: u64,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(rename = "maxPayload", default)]
    pub max_payload: Option<u64>,
}

const fn default_ping_interval() -> u64 {
    25_000
}

const fn default_ping_timeout() -> u64 {
    20_000
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    /// Parse one websocket text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] for empty frames, unknown type chars or a
    /// malformed handshake.
    pub fn decode(frame: &str) -> Result<Self, FrameError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(FrameError::Empty)?;
        let body = chars.as_str();
        Ok(match kind {
            '0' => Self::Open(serde_json::from_str(body)?),
            '1' => Self::Close,
            '2' => Self::Ping(body.to_string()),
            '3' => Self::Pong(body.to_string()),
            '4' => Self::Message(body.to_string()),
            '5' => Self::Upgrade,
            '6' => Self::Noop,
            other => return Err(FrameError::UnknownType(other)),
        })
    }

    /// Client-side encoding. The relay never expects `open` from us, so it
    /// encodes as a bare type char.
    pub fn encode(&self) -> String {
        match self {
            Self::Open(_) => "0".to_string(),
            Self::Close => "1".to_string(),
            Self::Ping(body) => format!("2{body}"),
            Self::Pong(body) => format!("3{body}"),
            Self::Message(body) => format!("4{body}"),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketPacket {
    Connect {
        nsp: String,
        data: Option<Value>,
    },
    Disconnect {
        nsp: String,
    },
    Event {
        nsp: String,
        id: Option<u64>,
        data: Value,
    },
    Ack {
        nsp: String,
        id: u64,
        data: Value,
    },
    ConnectError {
        nsp: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Connect request for the default namespace.
    pub fn connect() -> Self {
        Self::Connect {
            nsp: DEFAULT_NAMESPACE.to_string(),
            data: None,
        }
    }

    /// An event on the default namespace: `[name, payload]`.
    pub fn event(name: &str, payload: Value) -> Self {
        Self::Event {
            nsp: DEFAULT_NAMESPACE.to_string(),
            id: None,
            data: Value::Array(vec![Value::String(name.to_string()), payload]),
        }
    }

    /// Event name and first argument, when this is an event.
    pub fn as_event(&self) -> Option<(&str, Option<&Value>)> {
        let Self::Event { data, .. } = self else {
            return None;
        };
        let args = data.as_array()?;
        let name = args.first()?.as_str()?;
        Some((name, args.get(1)))
    }

    /// Parse the body of an Engine.IO message packet.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] for empty bodies, unknown types, binary
    /// packets and bad JSON.
    pub fn decode(body: &str) -> Result<Self, FrameError> {
        let mut chars = body.chars();
        let kind = chars.next().ok_or(FrameError::Empty)?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(FrameError::Binary);
        }

        let nsp = if rest.starts_with('/') {
            let end = rest.find(',').unwrap_or(rest.len());
            let nsp = rest[..end].to_string();
            rest = rest.get(end + 1..).unwrap_or("");
            nsp
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let id = if digits > 0 {
            rest[..digits].parse::<u64>().ok()
        } else {
            None
        };
        rest = &rest[digits..];

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(rest)?)
        };

        Ok(match kind {
            '0' => Self::Connect { nsp, data },
            '1' => Self::Disconnect { nsp },
            '2' => Self::Event {
                nsp,
                id,
                data: data.unwrap_or(Value::Null),
            },
            '3' => Self::Ack {
                nsp,
                id: id.unwrap_or(0),
                data: data.unwrap_or(Value::Null),
            },
            '4' => Self::ConnectError { nsp, data },
            other => return Err(FrameError::UnknownType(other)),
        })
    }

    pub fn encode(&self) -> String {
        let (kind, nsp, id, data) = match self {
            Self::Connect { nsp, data } => ('0', nsp, None, data.as_ref()),
            Self::Disconnect { nsp } => ('1', nsp, None, None),
            Self::Event { nsp, id, data } => ('2', nsp, *id, Some(data)),
            Self::Ack { nsp, id, data } => ('3', nsp, Some(*id), Some(data)),
            Self::ConnectError { nsp, data } => ('4', nsp, None, data.as_ref()),
        };
        let mut out = String::new();
        out.push(kind);
        if nsp != DEFAULT_NAMESPACE {
            out.push_str(nsp);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&data.to_string());
        }
        out
    }

    /// Wrap for the websocket: an Engine.IO message frame.
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open_handshake() {
        let frame = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":5000,"maxPayload":1000000}"#;
        let EnginePacket::Open(handshake) = EnginePacket::decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(handshake.sid, "lv_VI97HAXpY6yYWAAAC");
        assert_eq!(handshake.ping_timeout, 5000);
        assert_eq!(handshake.max_payload, Some(1_000_000));
    }

    #[test]
    fn test_ping_is_answered_with_matching_pong() {
        let EnginePacket::Ping(body) = EnginePacket::decode("2heartbeat").unwrap() else {
            panic!("expected ping");
        };
        assert_eq!(EnginePacket::Pong(body).encode(), "3heartbeat");
    }

    #[test]
    fn test_decode_rejects_unknown_engine_type() {
        assert!(matches!(
            EnginePacket::decode("9"),
            Err(FrameError::UnknownType('9'))
        ));
        assert!(matches!(EnginePacket::decode(""), Err(FrameError::Empty)));
    }

    #[test]
    fn test_connect_reply_carries_sid() {
        let packet = SocketPacket::decode(r#"0{"sid":"abc123"}"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Connect {
                nsp: "/".to_string(),
                data: Some(json!({ "sid": "abc123" })),
            }
        );
        assert_eq!(SocketPacket::connect().to_frame(), "40");
    }

    #[test]
    fn test_event_with_namespace_and_ack_id() {
        let packet = SocketPacket::decode(r#"2/admin,12["update",{"from":"x"}]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                nsp: "/admin".to_string(),
                id: Some(12),
                data: json!(["update", { "from": "x" }]),
            }
        );
        assert_eq!(packet.encode(), r#"2/admin,12["update",{"from":"x"}]"#);
    }

    #[test]
    fn test_event_encoding_on_default_namespace() {
        let packet = SocketPacket::event("update", json!({ "target": "abc", "data": "hi" }));
        let frame = packet.to_frame();
        assert!(frame.starts_with(r#"42["update","#));
        let (name, payload) = packet.as_event().unwrap();
        assert_eq!(name, "update");
        assert_eq!(payload, Some(&json!({ "target": "abc", "data": "hi" })));
    }

    #[test]
    fn test_binary_packets_are_refused() {
        assert!(matches!(
            SocketPacket::decode(r#"51-["upload",{"_placeholder":true,"num":0}]"#),
            Err(FrameError::Binary)
        ));
    }

    #[test]
    fn test_disconnect_without_payload() {
        assert_eq!(
            SocketPacket::decode("1").unwrap(),
            SocketPacket::Disconnect {
                nsp: "/".to_string()
            }
        );
    }
}
