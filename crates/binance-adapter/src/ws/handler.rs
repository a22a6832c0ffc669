/*
[INPUT]:  Raw frames and typed events produced by a subscription
[OUTPUT]: Caller callbacks, closure adapters and an ordered channel adapter
[POS]:    WebSocket layer - message and event sink abstractions
[UPDATE]: When changing how subscriptions deliver events to callers
*/

use tokio::sync::mpsc;

use super::error::WsError;

/// Receives every data frame of one connection, in wire order.
///
/// `on_error` is called from `on_message` wrappers for per-message decode
/// failures, and at most once by the read loop for the terminal transport
/// error. Neither method is called after the subscription's `Done` fires.
pub trait MessageHandler: Send + 'static {
    fn on_message(&mut self, message: &[u8]);
    fn on_error(&mut self, err: WsError);
}

/// Typed counterpart of [`MessageHandler`] used behind the decode wrappers
pub trait EventHandler<T>: Send + 'static {
    fn on_event(&mut self, event: T);
    fn on_error(&mut self, err: WsError);
}

/// Callback pair built from two closures
pub struct FnHandler<F, E> {
    on_event: F,
    on_error: E,
}

/// Wraps an event closure and an error closure into a handler
pub fn handler_fn<F, E>(on_event: F, on_error: E) -> FnHandler<F, E>
where
    E: FnMut(WsError) + Send + 'static,
{
    FnHandler { on_event, on_error }
}

impl<T, F, E> EventHandler<T> for FnHandler<F, E>
where
    F: FnMut(T) + Send + 'static,
    E: FnMut(WsError) + Send + 'static,
{
    fn on_event(&mut self, event: T) {
        (self.on_event)(event);
    }

    fn on_error(&mut self, err: WsError) {
        (self.on_error)(err);
    }
}

impl<F, E> MessageHandler for FnHandler<F, E>
where
    F: FnMut(&[u8]) + Send + 'static,
    E: FnMut(WsError) + Send + 'static,
{
    fn on_message(&mut self, message: &[u8]) {
        (self.on_event)(message);
    }

    fn on_error(&mut self, err: WsError) {
        (self.on_error)(err);
    }
}

/// One entry of a subscription's ordered output queue
#[derive(Debug)]
pub enum StreamItem<T> {
    Event(T),
    /// Frame that did not decode; the subscription keeps running
    DecodeError(WsError),
    /// Terminal transport error; nothing follows it
    Closed(WsError),
}

impl<T> StreamItem<T> {
    pub fn into_event(self) -> Option<T> {
        match self {
            StreamItem::Event(event) => Some(event),
            StreamItem::DecodeError(_) | StreamItem::Closed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamItem::Closed(_))
    }
}

/// Pushes events and errors onto one unbounded queue
#[derive(Debug)]
pub struct ChannelHandler<T> {
    tx: mpsc::UnboundedSender<StreamItem<T>>,
}

/// Creates a handler whose output can be drained from the returned receiver.
///
/// The queue is unbounded because callbacks run on the read loop and must not
/// block it; the receiver sees items in exactly the order they happened.
pub fn channel<T>() -> (ChannelHandler<T>, mpsc::UnboundedReceiver<StreamItem<T>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelHandler { tx }, rx)
}

impl<T: Send + 'static> EventHandler<T> for ChannelHandler<T> {
    fn on_event(&mut self, event: T) {
        let _ = self.tx.send(StreamItem::Event(event));
    }

    fn on_error(&mut self, err: WsError) {
        let item = if err.is_decode() {
            StreamItem::DecodeError(err)
        } else {
            StreamItem::Closed(err)
        };
        let _ = self.tx.send(item);
    }
}

impl MessageHandler for ChannelHandler<Vec<u8>> {
    fn on_message(&mut self, message: &[u8]) {
        let _ = self.tx.send(StreamItem::Event(message.to_vec()));
    }

    fn on_error(&mut self, err: WsError) {
        EventHandler::on_error(self, err);
    }
}
