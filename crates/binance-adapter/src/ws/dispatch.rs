/*
[INPUT]:  Raw frame bytes from the read loop
[OUTPUT]: Typed events (flat or combined-stream envelope) handed to an EventHandler
[POS]:    WebSocket layer - per-subscription decode/dispatch wrappers
[UPDATE]: When adding new message shapes
*/

use std::borrow::Cow;
use std::marker::PhantomData;

use serde::Deserialize;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::value::RawValue;
use tracing::debug;

use super::error::WsError;
use super::handler::{EventHandler, MessageHandler};

/// Events whose symbol can be restored from the stream they arrived on
pub trait WithSymbol {
    fn set_symbol(&mut self, symbol: String);
}

/// `{"stream": ..., "data": ...}` with `data` left undecoded
#[derive(Debug, Deserialize)]
pub struct CombinedEnvelope<'a> {
    #[serde(borrow)]
    pub stream: Cow<'a, str>,
    #[serde(borrow)]
    pub data: &'a RawValue,
}

/// `btcusdt@depth@100ms` -> `BTCUSDT`
pub fn symbol_from_stream(stream: &str) -> String {
    stream
        .split_once('@')
        .map_or(stream, |(symbol, _)| symbol)
        .to_uppercase()
}

/// Two-stage decode of a combined-stream frame
pub fn decode_combined<T>(message: &[u8]) -> Result<T, WsError>
where
    T: DeserializeOwned + WithSymbol,
{
    let envelope: CombinedEnvelope<'_> = serde_json::from_slice(message)?;
    let mut event: T = serde_json::from_str(envelope.data.get())?;
    event.set_symbol(symbol_from_stream(&envelope.stream));
    Ok(event)
}

type Stamp<T> = (String, fn(&mut T, String));

/// Decodes each frame as one `T`
pub struct Flat<T, H> {
    handler: H,
    stamp: Option<Stamp<T>>,
    _event: PhantomData<fn() -> T>,
}

impl<T, H> Flat<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            stamp: None,
            _event: PhantomData,
        }
    }
}

impl<T: WithSymbol, H> Flat<T, H> {
    /// Stamps `symbol` onto every event; for payloads that omit it
    pub fn with_symbol(handler: H, symbol: impl Into<String>) -> Self {
        Self {
            handler,
            stamp: Some((
                symbol.into().to_uppercase(),
                T::set_symbol as fn(&mut T, String),
            )),
            _event: PhantomData,
        }
    }
}

impl<T, H> MessageHandler for Flat<T, H>
where
    T: DeserializeOwned + Send + 'static,
    H: EventHandler<T>,
{
    fn on_message(&mut self, message: &[u8]) {
        match serde_json::from_slice::<T>(message) {
            Ok(mut event) => {
                if let Some((symbol, set_symbol)) = &self.stamp {
                    set_symbol(&mut event, symbol.clone());
                }
                self.handler.on_event(event);
            }
            Err(err) => self.handler.on_error(WsError::Decode(err)),
        }
    }

    fn on_error(&mut self, err: WsError) {
        self.handler.on_error(err);
    }
}

/// Decodes combined-stream envelopes into `T`, symbol taken from the stream name
pub struct Combined<T, H> {
    handler: H,
    _event: PhantomData<fn() -> T>,
}

impl<T, H> Combined<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _event: PhantomData,
        }
    }
}

impl<T, H> MessageHandler for Combined<T, H>
where
    T: DeserializeOwned + WithSymbol + Send + 'static,
    H: EventHandler<T>,
{
    fn on_message(&mut self, message: &[u8]) {
        match decode_combined::<T>(message) {
            Ok(event) => self.handler.on_event(event),
            Err(err) => self.handler.on_error(err),
        }
    }

    fn on_error(&mut self, err: WsError) {
        self.handler.on_error(err);
    }
}

/// Frame on an RPC-subscribed connection: a stream envelope or an RPC reply
#[derive(Debug, Deserialize)]
struct RpcFrame<'a> {
    #[serde(borrow, default)]
    data: Option<&'a RawValue>,
    #[serde(borrow, default)]
    error: Option<&'a RawValue>,
    #[serde(default)]
    id: Option<u64>,
}

/// Decodes the `data` of combined-stream envelopes as-is.
///
/// For connections subscribed through `WsRpc`: replies to the RPC are
/// skipped, RPC errors are reported through `on_error`.
pub struct Enveloped<T, H> {
    handler: H,
    _event: PhantomData<fn() -> T>,
}

impl<T, H> Enveloped<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _event: PhantomData,
        }
    }
}

impl<T, H> MessageHandler for Enveloped<T, H>
where
    T: DeserializeOwned + Send + 'static,
    H: EventHandler<T>,
{
    fn on_message(&mut self, message: &[u8]) {
        let frame: RpcFrame<'_> = match serde_json::from_slice(message) {
            Ok(frame) => frame,
            Err(err) => return self.handler.on_error(WsError::Decode(err)),
        };

        match frame {
            RpcFrame {
                data: Some(data), ..
            } => match serde_json::from_str::<T>(data.get()) {
                Ok(event) => self.handler.on_event(event),
                Err(err) => self.handler.on_error(WsError::Decode(err)),
            },
            RpcFrame {
                error: Some(error),
                id,
                ..
            } => self.handler.on_error(WsError::Decode(serde_json::Error::custom(
                format!("rpc {id:?} rejected: {}", error.get()),
            ))),
            RpcFrame { id: Some(id), .. } => debug!(id, "rpc acknowledged"),
            RpcFrame { .. } => self.handler.on_error(WsError::Decode(
                serde_json::Error::custom("frame has neither data nor rpc id"),
            )),
        }
    }

    fn on_error(&mut self, err: WsError) {
        self.handler.on_error(err);
    }
}

/// Passes frames through undecoded
pub struct Raw<H> {
    handler: H,
}

impl<H> Raw<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

impl<H: EventHandler<Vec<u8>>> MessageHandler for Raw<H> {
    fn on_message(&mut self, message: &[u8]) {
        self.handler.on_event(message.to_vec());
    }

    fn on_error(&mut self, err: WsError) {
        self.handler.on_error(err);
    }
}
