/*
[INPUT]:  Write half of an upgraded WebSocket stream and close requests from any task
[OUTPUT]: ConnectionHandle with idempotent close and deadline-bounded writes
[POS]:    WebSocket layer - shared connection state for read loop, keepalive and stop
[UPDATE]: When changing close semantics or adding new close causes
*/

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures_util::SinkExt;
use futures_util::stream::SplitSink;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::WsError;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;

/// Why a connection was closed locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Caller requested a stop
    Stopped,
    /// Execution context was cancelled
    Cancelled,
    /// Keepalive saw no pong inside its window
    KeepAliveTimeout { elapsed: Duration },
    /// Keepalive could not write a probe
    PingFailed(String),
    /// Read loop ended after a transport error it already reported
    Finished,
}

impl CloseReason {
    /// Caller-initiated closes never reach the error callback
    pub fn is_cooperative(&self) -> bool {
        matches!(self, CloseReason::Stopped | CloseReason::Cancelled)
    }

    /// Error the read loop reports for this close, if any
    pub(crate) fn to_error(&self) -> Option<WsError> {
        match self {
            CloseReason::KeepAliveTimeout { elapsed } => {
                Some(WsError::KeepAliveTimeout { elapsed: *elapsed })
            }
            CloseReason::PingFailed(message) => Some(WsError::PingFailed(message.clone())),
            CloseReason::Stopped | CloseReason::Cancelled | CloseReason::Finished => None,
        }
    }
}

/// Close flag shared by every task touching one connection.
///
/// The first `close` wins and records its reason; later calls only return
/// `false`. Safe to call concurrently from any number of tasks.
#[derive(Debug, Default)]
pub struct CloseSignal {
    token: CancellationToken,
    reason: OnceLock<CloseReason>,
}

impl CloseSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for the call that actually closed the connection
    pub fn close(&self, reason: CloseReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        self.token.cancel();
        first
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<&CloseReason> {
        self.reason.get()
    }

    /// Resolves once any task has closed the connection
    pub async fn closed(&self) {
        self.token.cancelled().await;
    }
}

/// Write side of a live connection plus its close signal
pub(crate) struct ConnectionHandle {
    signal: Arc<CloseSignal>,
    sink: Mutex<Option<WsSink>>,
    write_timeout: Duration,
}

impl ConnectionHandle {
    pub(crate) fn new(sink: WsSink, write_timeout: Duration) -> Self {
        Self {
            signal: Arc::new(CloseSignal::new()),
            sink: Mutex::new(Some(sink)),
            write_timeout,
        }
    }

    pub(crate) fn signal(&self) -> &Arc<CloseSignal> {
        &self.signal
    }

    pub(crate) fn close(&self, reason: CloseReason) -> bool {
        self.signal.close(reason)
    }

    /// Writes one frame, bounded by the write deadline
    pub(crate) async fn send(&self, message: Message) -> Result<(), WsError> {
        if self.signal.is_closed() {
            return Err(WsError::ConnectionClosed);
        }
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(WsError::ConnectionClosed)?;
        match timeout(self.write_timeout, sink.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(WsError::Write(err.to_string())),
            Err(_) => Err(WsError::Write(format!(
                "write deadline {:?} exceeded",
                self.write_timeout
            ))),
        }
    }

    /// Sends a best-effort close frame and releases the write half
    pub(crate) async fn shutdown(&self) {
        let sink = self.sink.lock().await.take();
        if let Some(mut sink) = sink {
            match timeout(self.write_timeout, sink.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => debug!(error = %err, "ws close frame not delivered"),
                Err(_) => debug!("ws close frame timed out"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_close_wins() {
        let signal = CloseSignal::new();
        assert!(!signal.is_closed());
        assert!(signal.reason().is_none());

        assert!(signal.close(CloseReason::Stopped));
        assert!(!signal.close(CloseReason::PingFailed("broken pipe".to_string())));
        assert!(!signal.close(CloseReason::Finished));

        assert!(signal.is_closed());
        assert_eq!(signal.reason(), Some(&CloseReason::Stopped));
    }

    #[tokio::test]
    async fn test_concurrent_close_is_idempotent() {
        let signal = Arc::new(CloseSignal::new());
        let mut tasks = Vec::new();
        for i in 0..8 {
            let signal = Arc::clone(&signal);
            tasks.push(tokio::spawn(async move {
                let reason = if i % 2 == 0 {
                    CloseReason::Stopped
                } else {
                    CloseReason::KeepAliveTimeout {
                        elapsed: Duration::from_secs(61),
                    }
                };
                signal.close(reason)
            }));
        }

        let mut winners = 0;
        for task in tasks {
            if task.await.expect("close task") {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        signal.closed().await;
        assert!(signal.reason().is_some());
    }

    #[test]
    fn test_cooperative_reasons_have_no_error() {
        assert!(CloseReason::Stopped.is_cooperative());
        assert!(CloseReason::Cancelled.is_cooperative());
        assert!(CloseReason::Stopped.to_error().is_none());
        assert!(CloseReason::Finished.to_error().is_none());

        let timeout = CloseReason::KeepAliveTimeout {
            elapsed: Duration::from_secs(90),
        };
        assert!(!timeout.is_cooperative());
        assert!(matches!(
            timeout.to_error(),
            Some(WsError::KeepAliveTimeout { .. })
        ));
    }
}
