//! High-level state management with stores.
//!
//! Stores provide a convenient abstraction for managing complex application
//! state with change detection, subscriptions, and middleware hooks.

mod store;

pub use store::Store;
