/*
[INPUT]:  USD-M futures stream names and payloads
[OUTPUT]: FuturesStreams catalogue and typed futures events
[POS]:    Futures layer - module wiring
[UPDATE]: When futures modules or exports change
*/

pub mod events;
pub mod streams;

pub use events::*;
pub use streams::{ContinuousKlineArgs, DepthSpeed, FuturesStreams, MarkPriceRate};
