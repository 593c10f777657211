use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::frame::SocketPacket;

/// The only application event the relay forwards.
pub const UPDATE_EVENT: &str = "update";

/// Sent to the relay, which forwards it to the connection named by `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundUpdate {
    pub target: String,
    pub data: Value,
}

/// Delivered by the relay; `from` is the sender's session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundUpdate {
    pub from: String,
    pub data: Value,
}

impl OutboundUpdate {
    pub fn new(target: impl Into<String>, data: Value) -> Self {
        Self {
            target: target.into(),
            data,
        }
    }

    pub fn to_packet(&self) -> SocketPacket {
        SocketPacket::event(
            UPDATE_EVENT,
            serde_json::json!({ "target": self.target, "data": self.data }),
        )
    }
}

/// Build the websocket text frame for an outbound update.
pub fn encode_update(update: &OutboundUpdate) -> String {
    update.to_packet().to_frame()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_update_frame() {
        let update = OutboundUpdate::new("abc123", json!("hello"));
        let frame = encode_update(&update);
        assert!(frame.starts_with(r#"42["update","#));
        let packet = SocketPacket::decode(&frame[1..]).unwrap();
        let (name, payload) = packet.as_event().unwrap();
        assert_eq!(name, UPDATE_EVENT);
        assert_eq!(payload, Some(&json!({ "target": "abc123", "data": "hello" })));
    }

    #[test]
    fn test_inbound_update_needs_sender() {
        let ok: InboundUpdate =
            serde_json::from_value(json!({ "from": "peer", "data": "x" })).unwrap();
        assert_eq!(ok.from, "peer");
        assert!(serde_json::from_value::<InboundUpdate>(json!({ "data": "x" })).is_err());
    }
}
