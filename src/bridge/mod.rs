//! Adapters between push-based streams and pull-based cells.
//!
//! [`from_stream`] feeds a stream's items into a cell; [`to_stream`] turns
//! a cell's accepted writes into a stream. Neither direction spawns tasks:
//! the returned [`StreamBridge`] future is driven by whatever executor the
//! caller already has.

mod stream;

pub use stream::{from_stream, from_stream_with_initial, to_stream, SignalStream, StreamBridge};
