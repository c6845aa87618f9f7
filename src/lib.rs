//! # Tripwire
//!
//! A fine-grained reactive state management library for Rust.
//!
//! Tripwire models state as a graph of reactive cells. Reads register
//! dependencies, writes notify dependents, and notification is gated by a
//! configurable change comparison: a write that leaves a value "equal"
//! reaches nobody. Mutating the interior of a value you read earlier
//! notifies nobody either; only the write operations do.
//!
//! ## Signals (low-level primitives)
//!
//! - [`Signal<T>`] - writable reactive cells with equality-gated notification
//! - [`Memo<T>`] - lazily recomputed derived values
//! - [`Effect`] - side effects that re-run when their dependencies change
//! - [`batch`] - coalesce effect runs across several writes
//! - [`untrack`] - read cells without subscribing to them
//!
//! ## Wiring
//!
//! - [`Output<T>`] - push-based event emitters
//! - [`bind()`] / [`bind_readonly()`] - mirror one cell into another
//! - [`bridge`] - adapters between async streams and cells
//!
//! ## Store (high-level state management)
//!
//! - [`Store<T>`] - thread-safe state container with change detection and
//!   middleware hooks

pub mod bind;
pub mod bridge;
pub mod error;
pub mod output;
pub mod runtime;
pub mod signal;
pub mod store;

// Re-export main types for convenience
pub use bind::{bind, bind_readonly, Binding};
pub use error::Error;
pub use output::{Output, OutputSubscription};
pub use runtime::{batch, untrack};
pub use signal::{
    create_effect, create_memo, create_signal, create_signal_with_equals, Effect, Memo,
    ReadSignal, Signal, WatchGuard, WriteSignal,
};
pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        // Basic smoke test
        let (signal, set_signal) = create_signal(0);
        assert_eq!(signal.get(), 0);
        set_signal.set(42);
        assert_eq!(signal.get(), 42);
    }
}
