/*
[INPUT]:  Stream endpoints, connection policy and caller handlers
[OUTPUT]: Long-lived streaming subscriptions with typed event dispatch
[POS]:    WebSocket layer - streaming core
[UPDATE]: When changing connection lifecycle or adding message shapes
*/

pub mod config;
pub mod connection;
pub mod dial;
pub mod dispatch;
pub mod error;
pub mod handler;
pub(crate) mod keepalive;
pub mod message;
pub mod serve;

pub use config::{KeepAlive, ServeOptions, WsConfig};
pub use connection::{CloseReason, CloseSignal};
pub use dial::{Dialer, DirectDialer, HttpProxyDialer};
pub use dispatch::{
    Combined, CombinedEnvelope, Enveloped, Flat, Raw, WithSymbol, decode_combined,
    symbol_from_stream,
};
pub use error::WsError;
pub use handler::{
    ChannelHandler, EventHandler, FnHandler, MessageHandler, StreamItem, channel, handler_fn,
};
pub use message::{RpcMethod, WsRpc};
pub use serve::{Done, StopHandle, Subscription, serve};
