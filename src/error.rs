use thiserror::Error as ThisError;

/// Errors reported by the reactive graph.
///
/// Most of the API is deliberately infallible: a write gated out by the
/// change comparison is correct behavior, not an error. The variants here
/// cover the two cases that genuinely cannot be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// A derived value was read while its own recomputation was in
    /// progress somewhere up the call stack.
    #[error("reactive cycle detected while recomputing node {0}")]
    Cycle(usize),

    /// Both endpoints of a binding refer to the same cell.
    #[error("cannot bind a cell to itself")]
    SelfBind,
}
