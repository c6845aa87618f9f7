//! Push-based event emitters.
//!
//! Outputs surface discrete events from reactive code to the outside world,
//! complementing the pull-based cells in [`signal`](crate::signal).

mod output;

pub use output::{Output, OutputStream, OutputSubscription};
