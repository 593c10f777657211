//! Connection to the realtime relay that forwards `update` events between
//! paired devices.
//!
//! - [`frame`]: Engine.IO / Socket.IO text framing
//! - [`message`]: the `update` payloads
//! - [`client`]: the background websocket client and the [`RelayLink`] seam

pub mod client;
pub mod frame;
pub mod message;

pub use client::{
    DEFAULT_RECONNECT_DELAY, DEFAULT_RELAY_URL, RelayClient, RelayConfig, RelayError, RelayEvent,
    RelayLink, socket_endpoint,
};
pub use frame::{EnginePacket, FrameError, Handshake, SocketPacket};
pub use message::{InboundUpdate, OutboundUpdate, UPDATE_EVENT, encode_update};
