//! Runtime errors
//!
//! Errors surfaced to whoever drives the trampoline. Every variant is a
//! misuse of the runtime surface; nothing is caught or retried internally,
//! and a panic inside a computation body is not caught at all.

use thiserror::Error;

use super::arena::TaskId;

/// Errors produced by the runtime surface.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// The id names no live computation record.
    #[error("unknown task: {id}")]
    UnknownTask { id: TaskId },

    /// The computation already ran to completion and cannot be resumed.
    #[error("{id} has already completed")]
    TaskCompleted { id: TaskId },

    /// No yielded or returned value is available in the task's slot.
    #[error("{id} has no value to take")]
    NoValue { id: TaskId },
}
