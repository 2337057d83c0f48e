//! Engine error types.
//!
//! Expected user-driven misses (unknown line name, unknown marker id)
//! are not errors; operations signal them with `Option` or `bool`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Input violates the engine contract, e.g. a fragment with fewer
    /// than two points. Nothing is partially written.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Internal invariant failure, e.g. diverged key sets across the
    /// coords/poi/markers maps. A bug, not a recoverable condition;
    /// the operation aborts instead of persisting a corrupt dataset.
    #[error("dataset consistency violation: {0}")]
    Consistency(String),
}
