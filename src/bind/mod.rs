//! One- and two-way bindings between cells.

mod bind;

pub use bind::{bind, bind_readonly, Binding};
