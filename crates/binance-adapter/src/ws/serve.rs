/*
[INPUT]:  Cancellation context, WsConfig, ServeOptions and a MessageHandler
[OUTPUT]: Running subscription (read loop + keepalive + priming sender) and its lifecycle signals
[POS]:    WebSocket layer - connection supervisor
[UPDATE]: When changing handshake, read loop or shutdown semantics
*/

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::SplitStream;
use tokio::sync::watch;
use tokio::time::{Instant, timeout};
use tokio_tungstenite::client_async_tls_with_config;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use super::config::{ServeOptions, WsConfig};
use super::connection::{CloseReason, CloseSignal, ConnectionHandle, WsStream};
use super::error::WsError;
use super::handler::MessageHandler;
use super::keepalive;

/// Fires exactly once, when the read loop has exited for any reason
#[derive(Debug, Clone)]
pub struct Done {
    token: CancellationToken,
}

impl Done {
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

/// Requests a silent shutdown of one subscription
#[derive(Debug, Clone)]
pub struct StopHandle {
    signal: Arc<CloseSignal>,
}

impl StopHandle {
    /// Closes the connection without reporting an error; repeat calls are no-ops
    pub fn stop(&self) {
        if self.signal.close(CloseReason::Stopped) {
            debug!("ws stop requested");
        }
    }
}

/// Lifecycle signals of a running subscription
#[derive(Debug)]
pub struct Subscription {
    endpoint: String,
    done: Done,
    stop: StopHandle,
}

impl Subscription {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn done(&self) -> Done {
        self.done.clone()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_done(&self) -> bool {
        self.done.is_done()
    }

    pub async fn wait(&self) {
        self.done.wait().await;
    }
}

/// Connects to `config.endpoint` and pumps its frames into `handler`.
///
/// Dial and handshake failures are returned here and start nothing. On
/// success the read loop, the keepalive monitor (when enabled) and the
/// priming sender run in the background and this returns at once.
///
/// Cancelling `ctx` or calling `stop` ends the subscription without an
/// `on_error` call. Peer and network failures, keepalive timeouts included,
/// reach `on_error` exactly once before `Done` fires.
pub async fn serve<H: MessageHandler>(
    ctx: &CancellationToken,
    config: WsConfig,
    options: &ServeOptions,
    handler: H,
) -> Result<Subscription, WsError> {
    if ctx.is_cancelled() {
        return Err(WsError::Cancelled);
    }

    let handshake = timeout(options.handshake_timeout, connect(&config.endpoint, options));
    let stream = tokio::select! {
        _ = ctx.cancelled() => return Err(WsError::Cancelled),
        result = handshake => match result {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                warn!(endpoint = %config.endpoint, error = %err, "ws handshake failed");
                return Err(err);
            }
            Err(_) => {
                warn!(endpoint = %config.endpoint, "ws handshake timed out");
                return Err(WsError::HandshakeTimeout {
                    endpoint: config.endpoint,
                    timeout: options.handshake_timeout,
                });
            }
        },
    };
    info!(endpoint = %config.endpoint, "ws connected");

    let (sink, read) = stream.split();
    let conn = Arc::new(ConnectionHandle::new(sink, options.write_timeout));
    let done = CancellationToken::new();
    let (pong_tx, pong_rx) = watch::channel(Instant::now());

    if options.keepalive.enabled {
        tokio::spawn(keepalive::monitor(
            ctx.clone(),
            Arc::clone(&conn),
            options.keepalive,
            pong_rx,
        ));
    }

    if !config.send_after_connect.is_empty() {
        tokio::spawn(send_after_connect(
            Arc::clone(&conn),
            config.send_after_connect,
            config.endpoint.clone(),
        ));
    }

    let subscription = Subscription {
        endpoint: config.endpoint.clone(),
        done: Done {
            token: done.clone(),
        },
        stop: StopHandle {
            signal: Arc::clone(conn.signal()),
        },
    };

    tokio::spawn(read_loop(
        ctx.clone(),
        conn,
        read,
        handler,
        pong_tx,
        done,
        config.endpoint,
    ));

    Ok(subscription)
}

async fn connect(endpoint: &str, options: &ServeOptions) -> Result<WsStream, WsError> {
    let url = Url::parse(endpoint)
        .map_err(|err| WsError::InvalidEndpoint(format!("{endpoint}: {err}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| WsError::InvalidEndpoint(format!("{endpoint}: missing host")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| WsError::InvalidEndpoint(format!("{endpoint}: missing port")))?;

    let tcp = options.dialer.dial(host, port).await?;
    let ws_config = WebSocketConfig::default().max_message_size(Some(options.read_limit));
    let (stream, _response) = client_async_tls_with_config(endpoint, tcp, Some(ws_config), None)
        .await
        .map_err(|source| WsError::Handshake {
            endpoint: endpoint.to_string(),
            source,
        })?;
    Ok(stream)
}

async fn send_after_connect(conn: Arc<ConnectionHandle>, messages: Vec<String>, endpoint: String) {
    for message in messages {
        if let Err(err) = conn.send(Message::text(message)).await {
            error!(endpoint = %endpoint, error = %err, "ws priming message not sent");
        }
    }
}

async fn read_loop<H: MessageHandler>(
    ctx: CancellationToken,
    conn: Arc<ConnectionHandle>,
    mut read: SplitStream<WsStream>,
    mut handler: H,
    pong_tx: watch::Sender<Instant>,
    done: CancellationToken,
    endpoint: String,
) {
    let transport_error = loop {
        tokio::select! {
            biased;
            _ = conn.signal().closed() => break None,
            _ = ctx.cancelled() => {
                conn.close(CloseReason::Cancelled);
                break None;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => handler.on_message(text.as_bytes()),
                Some(Ok(Message::Binary(bytes))) => handler.on_message(&bytes),
                Some(Ok(Message::Pong(_))) => {
                    debug!(endpoint = %endpoint, "pong");
                    pong_tx.send_replace(Instant::now());
                }
                // tungstenite queues the pong reply for peer pings itself
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    break Some(WsError::ClosedByPeer {
                        code: frame.as_ref().map(|frame| u16::from(frame.code)),
                        reason: frame.map(|frame| frame.reason.as_str().to_string()).unwrap_or_default(),
                    });
                }
                Some(Err(err)) => break Some(WsError::Read(err)),
                None => {
                    break Some(WsError::ClosedByPeer {
                        code: None,
                        reason: "stream ended".to_string(),
                    });
                }
            },
        }
    };

    let error = match transport_error {
        Some(err) => {
            conn.close(CloseReason::Finished);
            let cooperative = conn
                .signal()
                .reason()
                .is_some_and(CloseReason::is_cooperative);
            (!cooperative).then_some(err)
        }
        None => conn.signal().reason().and_then(CloseReason::to_error),
    };

    conn.shutdown().await;
    drop(read);

    match error {
        Some(err) => {
            warn!(endpoint = %endpoint, error = %err, "ws read loop exited");
            handler.on_error(err);
        }
        None => {
            debug!(endpoint = %endpoint, reason = ?conn.signal().reason(), "ws subscription closed");
        }
    }

    done.cancel();
}
