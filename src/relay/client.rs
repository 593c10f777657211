//! Threaded websocket client for the relay.
//!
//! The socket lives on a worker thread. The app talks to it through two mpsc
//! channels: commands in, [`RelayEvent`]s out. Polling never blocks.

use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::Value;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message as WsMessage, WebSocket};
use url::Url;

use super::frame::{EnginePacket, FrameError, Handshake, SocketPacket};
use super::message::{InboundUpdate, OutboundUpdate, UPDATE_EVENT, encode_update};

/// Relay used when none is configured.
pub const DEFAULT_RELAY_URL: &str = "https://note-mirror.herokuapp.com/";

/// Wait between a drop and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

const READ_TIMEOUT: Duration = Duration::from_millis(50);
const OPEN_TIMEOUT: Duration = Duration::from_secs(20);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("unsupported relay scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("websocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),
    #[error("bad frame from relay: {0}")]
    Frame(#[from] FrameError),
    #[error("relay refused the connection: {0}")]
    Refused(String),
    #[error("relay closed the connection")]
    Closed,
    #[error("no heartbeat from relay for {0:?}")]
    HeartbeatTimeout(Duration),
}

impl From<tungstenite::Error> for RelayError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

/// What the transport reports to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Connected { session_id: String },
    Disconnected { reason: String },
    Update(InboundUpdate),
    /// A connection attempt failed; retried after the reconnect delay.
    Unreachable(String),
    /// An `update` event whose payload is not `{from, data}`.
    Rejected(String),
}

/// The app's view of the transport.
pub trait RelayLink {
    /// Fire and forget. Dropped when no connection is up.
    fn send_update(&mut self, update: OutboundUpdate);
    fn poll_event(&mut self) -> Option<RelayEvent>;
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub url: Url,
    pub reconnect_delay: Duration,
}

impl RelayConfig {
    pub const fn new(url: Url) -> Self {
        Self {
            url,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// Websocket endpoint for an http(s) or ws(s) relay URL.
///
/// # Errors
///
/// Returns [`RelayError::UnsupportedScheme`] for anything else.
pub fn socket_endpoint(relay: &Url) -> Result<Url, RelayError> {
    let scheme = match relay.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(RelayError::UnsupportedScheme(other.to_string())),
    };
    let mut endpoint = relay.clone();
    endpoint
        .set_scheme(scheme)
        .map_err(|()| RelayError::UnsupportedScheme(relay.scheme().to_string()))?;
    endpoint.set_path("/socket.io/");
    endpoint.set_query(Some("EIO=4&transport=websocket"));
    endpoint.set_fragment(None);
    Ok(endpoint)
}

enum Command {
    Send(OutboundUpdate),
    Shutdown,
}

enum SessionEnd {
    Shutdown,
    Lost(String),
}

/// Handle to the worker thread. Dropping it stops the worker.
pub struct RelayClient {
    commands: Sender<Command>,
    events: Receiver<RelayEvent>,
    _worker: JoinHandle<()>,
}

impl RelayClient {
    /// Start connecting in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be turned into a websocket endpoint
    /// or the worker thread cannot be spawned.
    pub fn spawn(config: RelayConfig) -> anyhow::Result<Self> {
        let endpoint = socket_endpoint(&config.url)?;
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let delay = config.reconnect_delay;
        let worker = thread::Builder::new()
            .name("relay".to_string())
            .spawn(move || run_worker(&endpoint, delay, &command_rx, &event_tx))?;
        Ok(Self {
            commands: command_tx,
            events: event_rx,
            _worker: worker,
        })
    }
}

impl RelayLink for RelayClient {
    fn send_update(&mut self, update: OutboundUpdate) {
        if self.commands.send(Command::Send(update)).is_err() {
            tracing::debug!("relay worker gone, update dropped");
        }
    }

    fn poll_event(&mut self) -> Option<RelayEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

impl std::fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient").finish_non_exhaustive()
    }
}

fn run_worker(
    endpoint: &Url,
    delay: Duration,
    commands: &Receiver<Command>,
    events: &Sender<RelayEvent>,
) {
    // Only the first failure of a streak is reported.
    let mut report_failure = true;
    loop {
        match open_session(endpoint) {
            Ok((mut socket, handshake, session_id)) => {
                report_failure = true;
                tracing::info!(%session_id, "connected to relay");
                if events
                    .send(RelayEvent::Connected {
                        session_id: session_id.clone(),
                    })
                    .is_err()
                {
                    return;
                }
                match run_session(&mut socket, &handshake, commands, events) {
                    SessionEnd::Shutdown => {
                        let _ = socket.close(None);
                        let _ = socket.flush();
                        return;
                    }
                    SessionEnd::Lost(reason) => {
                        tracing::info!(%session_id, %reason, "relay connection lost");
                        if events.send(RelayEvent::Disconnected { reason }).is_err() {
                            return;
                        }
                    }
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "relay connection attempt failed");
                if report_failure {
                    report_failure = false;
                    if events.send(RelayEvent::Unreachable(err.to_string())).is_err() {
                        return;
                    }
                }
            }
        }

        if wait_before_reconnect(delay, commands) {
            return;
        }
    }
}

/// Sleep out the reconnect delay. Returns true when asked to shut down.
fn wait_before_reconnect(delay: Duration, commands: &Receiver<Command>) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }
        match commands.recv_timeout(remaining) {
            Ok(Command::Send(update)) => {
                tracing::debug!(peer = %update.target, "not connected, update dropped");
            }
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => return true,
            Err(RecvTimeoutError::Timeout) => return false,
        }
    }
}

fn open_session(endpoint: &Url) -> Result<(Socket, Handshake, String), RelayError> {
    let (mut socket, _response) = tungstenite::connect(endpoint.as_str())?;
    set_read_timeout(&socket, READ_TIMEOUT);

    let deadline = Instant::now() + OPEN_TIMEOUT;
    let handshake = loop {
        if Instant::now() > deadline {
            return Err(RelayError::HeartbeatTimeout(OPEN_TIMEOUT));
        }
        let Some(frame) = read_text(&mut socket)? else {
            continue;
        };
        match EnginePacket::decode(&frame)? {
            EnginePacket::Open(handshake) => break handshake,
            other => tracing::debug!(?other, "ignoring packet before open"),
        }
    };

    socket.send(WsMessage::Text(SocketPacket::connect().to_frame()))?;

    let deadline = Instant::now() + Duration::from_millis(handshake.ping_timeout);
    loop {
        if Instant::now() > deadline {
            return Err(RelayError::HeartbeatTimeout(Duration::from_millis(
                handshake.ping_timeout,
            )));
        }
        let Some(frame) = read_text(&mut socket)? else {
            continue;
        };
        match EnginePacket::decode(&frame)? {
            EnginePacket::Message(body) => match SocketPacket::decode(&body)? {
                SocketPacket::Connect { data, .. } => {
                    let sid = data
                        .as_ref()
                        .and_then(|d| d.get("sid"))
                        .and_then(Value::as_str)
                        .map_or_else(|| handshake.sid.clone(), str::to_string);
                    return Ok((socket, handshake, sid));
                }
                SocketPacket::ConnectError { data, .. } => {
                    return Err(RelayError::Refused(
                        data.map_or_else(|| "no reason given".to_string(), |d| d.to_string()),
                    ));
                }
                other => tracing::debug!(?other, "ignoring packet before connect"),
            },
            EnginePacket::Ping(body) => {
                socket.send(WsMessage::Text(EnginePacket::Pong(body).encode()))?;
            }
            EnginePacket::Close => return Err(RelayError::Closed),
            _ => {}
        }
    }
}

fn run_session(
    socket: &mut Socket,
    handshake: &Handshake,
    commands: &Receiver<Command>,
    events: &Sender<RelayEvent>,
) -> SessionEnd {
    let heartbeat = Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);
    let mut last_heard = Instant::now();
    loop {
        loop {
            match commands.try_recv() {
                Ok(Command::Send(update)) => {
                    let frame = encode_update(&update);
                    if let Err(err) = socket.send(WsMessage::Text(frame)) {
                        return SessionEnd::Lost(RelayError::from(err).to_string());
                    }
                    tracing::trace!(peer = %update.target, "update sent");
                }
                Ok(Command::Shutdown) | Err(TryRecvError::Disconnected) => {
                    return SessionEnd::Shutdown;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        match read_text(socket) {
            Ok(Some(frame)) => {
                last_heard = Instant::now();
                match handle_frame(socket, &frame, events) {
                    Ok(true) => {}
                    Ok(false) => return SessionEnd::Shutdown,
                    Err(err) => return SessionEnd::Lost(err.to_string()),
                }
            }
            Ok(None) => {
                if last_heard.elapsed() > heartbeat {
                    return SessionEnd::Lost(RelayError::HeartbeatTimeout(heartbeat).to_string());
                }
            }
            Err(err) => return SessionEnd::Lost(err.to_string()),
        }
    }
}

/// Returns `Ok(false)` when the app side has gone away.
fn handle_frame(
    socket: &mut Socket,
    frame: &str,
    events: &Sender<RelayEvent>,
) -> Result<bool, RelayError> {
    let packet = match EnginePacket::decode(frame) {
        Ok(packet) => packet,
        Err(err) => {
            tracing::warn!(error = %err, "skipping undecodable frame");
            return Ok(true);
        }
    };
    match packet {
        EnginePacket::Ping(body) => {
            socket.send(WsMessage::Text(EnginePacket::Pong(body).encode()))?;
        }
        EnginePacket::Close => return Err(RelayError::Closed),
        EnginePacket::Message(body) => {
            let packet = match SocketPacket::decode(&body) {
                Ok(packet) => packet,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping undecodable socket packet");
                    return Ok(true);
                }
            };
            if let SocketPacket::Disconnect { .. } = packet {
                return Err(RelayError::Closed);
            }
            if let Some(event) = inbound_event(&packet) {
                return Ok(events.send(event).is_ok());
            }
        }
        _ => {}
    }
    Ok(true)
}

fn inbound_event(packet: &SocketPacket) -> Option<RelayEvent> {
    let (name, payload) = packet.as_event()?;
    if name != UPDATE_EVENT {
        tracing::debug!(event = name, "ignoring unknown relay event");
        return None;
    }
    let payload = payload.cloned().unwrap_or(Value::Null);
    Some(match serde_json::from_value::<InboundUpdate>(payload) {
        Ok(update) => RelayEvent::Update(update),
        Err(err) => RelayEvent::Rejected(format!("malformed update: {err}")),
    })
}

/// One text frame, or `None` when the read timed out.
fn read_text(socket: &mut Socket) -> Result<Option<String>, RelayError> {
    match socket.read() {
        Ok(WsMessage::Text(text)) => Ok(Some(text)),
        Ok(WsMessage::Close(_)) => Err(RelayError::Closed),
        Ok(_) => Ok(None),
        Err(tungstenite::Error::Io(err))
            if matches!(
                err.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ) =>
        {
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn set_read_timeout(socket: &Socket, timeout: Duration) {
    let stream = match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream,
        MaybeTlsStream::Rustls(stream) => stream.get_ref(),
        _ => return,
    };
    if let Err(err) = stream.set_read_timeout(Some(timeout)) {
        tracing::warn!(error = %err, "could not set relay read timeout");
    }
}
