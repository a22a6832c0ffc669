/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Binance adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod futures;
pub mod http;
pub mod spot;
pub mod types;
pub mod ws;

// Re-export commonly used types from http
pub use http::{BinanceClient, BinanceError, ClientConfig, Request, Result};

// Re-export shared types
pub use types::*;

// Re-export the streaming core
pub use ws::{
    Done, EventHandler, KeepAlive, MessageHandler, ServeOptions, StopHandle, StreamItem,
    Subscription, WsConfig, WsError, channel, handler_fn, serve,
};

pub use futures::FuturesStreams;
pub use spot::SpotStreams;

pub use tokio_util::sync::CancellationToken;
