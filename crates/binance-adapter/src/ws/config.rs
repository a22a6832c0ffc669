/*
[INPUT]:  Endpoint URI, priming messages, keepalive and handshake policy
[OUTPUT]: WsConfig / KeepAlive / ServeOptions consumed by serve()
[POS]:    WebSocket layer - per-subscription connection configuration
[UPDATE]: When changing connection defaults or adding serve options
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::dial::{Dialer, DirectDialer};
use super::error::WsError;

/// Upper bound for dial + WebSocket upgrade
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(45);
/// Largest inbound message accepted from the peer
pub const READ_LIMIT: usize = 655_350;
/// Liveness window; probes go out at half this interval
pub const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);
/// Deadline for a single outbound write (probes, priming, close)
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Target address and priming messages for one subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsConfig {
    pub endpoint: String,
    /// Raw text frames sent right after the handshake (e.g. SUBSCRIBE RPCs)
    pub send_after_connect: Vec<String>,
}

impl WsConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            send_after_connect: Vec::new(),
        }
    }

    /// Single raw stream: `{base}/{stream}`
    pub fn stream(base: &str, stream: &str) -> Self {
        Self::new(format!("{}/{}", base.trim_end_matches('/'), stream))
    }

    /// Combined streams: `base` followed by the stream names joined with `/`
    pub fn combined<I, S>(base: &str, streams: I) -> Result<Self, WsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = streams
            .into_iter()
            .map(|stream| stream.as_ref().to_string())
            .collect();
        if names.is_empty() {
            return Err(WsError::InvalidEndpoint(format!(
                "{base}: combined stream needs at least one stream"
            )));
        }
        Ok(Self::new(format!("{base}{}", names.join("/"))))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.send_after_connect.push(message.into());
        self
    }
}

/// Liveness checking policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    pub enabled: bool,
    pub timeout: Duration,
}

impl KeepAlive {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Interval between ping probes
    pub fn probe_interval(&self) -> Duration {
        self.timeout / 2
    }
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: KEEPALIVE_TIMEOUT,
        }
    }
}

/// Connection policy passed to every `serve` call
#[derive(Clone)]
pub struct ServeOptions {
    pub handshake_timeout: Duration,
    pub read_limit: usize,
    pub write_timeout: Duration,
    pub keepalive: KeepAlive,
    pub dialer: Arc<dyn Dialer>,
}

impl ServeOptions {
    pub fn with_keepalive(mut self, keepalive: KeepAlive) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = dialer;
        self
    }
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            handshake_timeout: HANDSHAKE_TIMEOUT,
            read_limit: READ_LIMIT,
            write_timeout: WRITE_TIMEOUT,
            keepalive: KeepAlive::default(),
            dialer: Arc::new(DirectDialer),
        }
    }
}

impl fmt::Debug for ServeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServeOptions")
            .field("handshake_timeout", &self.handshake_timeout)
            .field("read_limit", &self.read_limit)
            .field("write_timeout", &self.write_timeout)
            .field("keepalive", &self.keepalive)
            .finish_non_exhaustive()
    }
}
