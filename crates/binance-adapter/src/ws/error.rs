/*
[INPUT]:  Dial, handshake, transport, keepalive and decode failures
[OUTPUT]: WsError taxonomy surfaced through serve() and on_error callbacks
[POS]:    WebSocket layer - error types for the streaming core
[UPDATE]: When adding new failure sources to the connection lifecycle
*/

use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors produced by the streaming core.
///
/// Handshake-class errors are returned synchronously from `serve`. Transport
/// errors reach `on_error` at most once per subscription. Decode errors are
/// per-message and never end a subscription.
#[derive(Error, Debug)]
pub enum WsError {
    /// The execution context was already cancelled when `serve` was called
    #[error("context cancelled before connect")]
    Cancelled,

    /// The endpoint could not be parsed or has no streams
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// TCP dial (direct or through a proxy) failed
    #[error("dial {addr} failed: {source}")]
    Dial {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP CONNECT proxy refused the tunnel
    #[error("proxy refused tunnel to {addr}: {status}")]
    Proxy { addr: String, status: String },

    /// WebSocket upgrade failed
    #[error("handshake with {endpoint} failed: {source}")]
    Handshake {
        endpoint: String,
        #[source]
        source: tungstenite::Error,
    },

    /// Dial + upgrade did not finish within the handshake timeout
    #[error("handshake with {endpoint} timed out after {timeout:?}")]
    HandshakeTimeout { endpoint: String, timeout: Duration },

    /// Receiving the next frame failed
    #[error("read failed: {0}")]
    Read(#[source] tungstenite::Error),

    /// Peer sent a close frame or the stream ended
    #[error("connection closed by peer (code {code:?}): {reason}")]
    ClosedByPeer { code: Option<u16>, reason: String },

    /// No pong arrived within the keepalive window
    #[error("keepalive timeout: no pong for {elapsed:?}")]
    KeepAliveTimeout { elapsed: Duration },

    /// Writing a ping probe failed or exceeded its deadline
    #[error("keepalive ping failed: {0}")]
    PingFailed(String),

    /// Writing to the connection failed
    #[error("write failed: {0}")]
    Write(String),

    /// Connection already closed locally
    #[error("connection closed")]
    ConnectionClosed,

    /// Payload did not match the expected event shape
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl WsError {
    /// Per-message decode failure; the subscription keeps running
    pub fn is_decode(&self) -> bool {
        matches!(self, WsError::Decode(_))
    }

    /// Failure that ends a live subscription
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            WsError::Read(_)
                | WsError::ClosedByPeer { .. }
                | WsError::KeepAliveTimeout { .. }
                | WsError::PingFailed(_)
        )
    }

    /// Failure returned synchronously by `serve` before anything was started
    pub fn is_handshake(&self) -> bool {
        matches!(
            self,
            WsError::Cancelled
                | WsError::InvalidEndpoint(_)
                | WsError::Dial { .. }
                | WsError::Proxy { .. }
                | WsError::Handshake { .. }
                | WsError::HandshakeTimeout { .. }
        )
    }
}
