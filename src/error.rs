use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

use crate::thread::{HandleState, ThreadId};

/// Errors reported by thread handles.
#[derive(Debug, Error)]
pub enum ThreadError {
    /// `join`, `detach` or `assign` attempted on a handle in the wrong state.
    #[error("cannot {op} a thread handle in state {state:?}")]
    InvalidState {
        op: &'static str,
        state: HandleState,
    },
    /// The OS refused to create another thread.
    #[error("failed to spawn thread: {0}")]
    ResourceExhausted(#[source] std::io::Error),
    /// The thread's function panicked. The handle is finished regardless.
    #[error("thread {id} panicked: {message}")]
    Panicked { id: ThreadId, message: String },
}

impl ThreadError {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadError::InvalidState { .. } => "Thread handle is not joinable",
            ThreadError::ResourceExhausted(_) => "Unable to create a new thread",
            ThreadError::Panicked { .. } => "Thread terminated by a panic",
        }
    }

    /// True for errors caused by misuse of the handle rather than by the
    /// thread or the platform.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, ThreadError::InvalidState { .. })
    }
}

pub type ThreadResult<T> = Result<T, ThreadError>;

/// Returned by [`SafeStack::try_push`](crate::SafeStack::try_push) when
/// storage for the new element could not be allocated.
///
/// The rejected value is handed back and the stack is left unchanged.
pub struct TryPushError<T> {
    value: T,
    source: TryReserveError,
}

impl<T> TryPushError<T> {
    pub(crate) fn new(value: T, source: TryReserveError) -> Self {
        Self { value, source }
    }

    /// Recover the value that could not be pushed.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> fmt::Debug for TryPushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryPushError")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for TryPushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stack storage exhausted: {}", self.source)
    }
}

impl<T> std::error::Error for TryPushError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
