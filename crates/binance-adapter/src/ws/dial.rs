/*
[INPUT]:  Target host/port and optional HTTP proxy address
[OUTPUT]: Connected TcpStream ready for the WebSocket handshake
[POS]:    WebSocket layer - pluggable dial strategy
[UPDATE]: When adding new proxy kinds or socket options
*/

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::error::WsError;

const PROXY_RESPONSE_LIMIT: usize = 8 * 1024;

/// Opens the raw TCP stream a subscription runs over
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, host: &str, port: u16) -> Result<TcpStream, WsError>;
}

/// Connects straight to the target
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDialer;

#[async_trait]
impl Dialer for DirectDialer {
    async fn dial(&self, host: &str, port: u16) -> Result<TcpStream, WsError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| WsError::Dial {
                addr: format!("{host}:{port}"),
                source,
            })?;
        let _ = stream.set_nodelay(true);
        Ok(stream)
    }
}

/// Tunnels through an HTTP proxy with `CONNECT`
#[derive(Debug, Clone)]
pub struct HttpProxyDialer {
    proxy_host: String,
    proxy_port: u16,
}

impl HttpProxyDialer {
    pub fn new(proxy_host: impl Into<String>, proxy_port: u16) -> Self {
        Self {
            proxy_host: proxy_host.into(),
            proxy_port,
        }
    }
}

#[async_trait]
impl Dialer for HttpProxyDialer {
    async fn dial(&self, host: &str, port: u16) -> Result<TcpStream, WsError> {
        let target = format!("{host}:{port}");
        let mut stream = DirectDialer.dial(&self.proxy_host, self.proxy_port).await?;

        let request = format!("CONNECT {target} HTTP/1.1\r\nHost: {target}\r\n\r\n");
        stream
            .write_all(request.as_bytes())
            .await
            .map_err(|source| WsError::Dial {
                addr: target.clone(),
                source,
            })?;

        let head = read_response_head(&mut stream)
            .await
            .map_err(|source| WsError::Dial {
                addr: target.clone(),
                source,
            })?;
        let status_line = head.lines().next().unwrap_or_default().to_string();
        let accepted = status_line
            .split_whitespace()
            .nth(1)
            .is_some_and(|code| code == "200");
        if !accepted {
            return Err(WsError::Proxy {
                addr: target,
                status: status_line,
            });
        }

        debug!(proxy = %self.proxy_host, target = %target, "proxy tunnel established");
        Ok(stream)
    }
}

// Reads byte by byte so nothing past the header block is consumed.
async fn read_response_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut head = Vec::with_capacity(128);
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= PROXY_RESPONSE_LIMIT {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "proxy response header too large",
            ));
        }
        head.push(stream.read_u8().await?);
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}
