/*
[INPUT]:  Spot stream names and payloads
[OUTPUT]: SpotStreams catalogue and typed spot events
[POS]:    Spot layer - module wiring
[UPDATE]: When spot modules or exports change
*/

pub mod events;
pub mod streams;

pub use events::*;
pub use streams::{DepthLevels, SpotStreams, UpdateSpeed};
