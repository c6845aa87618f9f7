//! Fine-grained reactive primitives.
//!
//! This module provides the core building blocks for reactive programming:
//! - Signals: reactive cells with equality-gated change notification
//! - Memos: lazily recomputed derived values
//! - Effects: side effects that react to changes

mod effect;
mod memo;
mod signal;

pub use effect::{create_effect, Effect};
pub use memo::{create_memo, Memo};
pub use signal::{
    create_signal, create_signal_with_equals, ReadSignal, Signal, WatchGuard, WriteSignal,
};
