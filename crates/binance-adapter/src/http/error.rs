/*
[INPUT]:  Error sources (HTTP, API, serialization, WebSocket)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::ApiErrorBody;
use crate::ws::WsError;

/// Main error type for the Binance adapter
#[derive(Error, Debug)]
pub enum BinanceError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with HTTP >= 400
    #[error("API error (status {status}, code {code}): {msg}")]
    Api { status: u16, code: i64, msg: String },

    /// API answered 200 with `success: false`
    #[error("request unsuccessful: {0}")]
    Unsuccessful(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Streaming connection error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

impl BinanceError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            BinanceError::Http(err) => err.is_timeout() || err.is_connect(),
            BinanceError::Api { status, .. } => *status == 429 || *status >= 500,
            BinanceError::WebSocket(err) => {
                err.is_transport()
                    || matches!(
                        err,
                        WsError::Dial { .. }
                            | WsError::Handshake { .. }
                            | WsError::HandshakeTimeout { .. }
                    )
            }
            _ => false,
        }
    }

    /// Get retry delay in seconds (if retryable)
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            // 418 is an IP ban that follows ignored 429s; back off hard
            BinanceError::Api { status: 418, .. } => Some(120),
            BinanceError::Api { status: 429, .. } => Some(60),
            err if err.is_retryable() => Some(1),
            _ => None,
        }
    }

    /// Builds an API error from the status and the `{code, msg}` body.
    ///
    /// Bodies that are not JSON keep the status with code 0 and the raw text.
    pub fn api_error(status: StatusCode, body: &[u8]) -> Self {
        let parsed = serde_json::from_slice::<ApiErrorBody>(body).unwrap_or_else(|_| ApiErrorBody {
            code: 0,
            msg: String::from_utf8_lossy(body).into_owned(),
        });
        BinanceError::Api {
            status: status.as_u16(),
            code: parsed.code,
            msg: parsed.msg,
        }
    }
}

/// Result type alias for Binance operations
pub type Result<T> = std::result::Result<T, BinanceError>;
