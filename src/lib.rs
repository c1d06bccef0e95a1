//! Owning thread handles, scope-bound join guards and a thread-safe stack.
//!
//! - [`ThreadHandle`] owns at most one OS thread and is move-only.
//! - [`JoinGuard`] joins a borrowed handle on every scope exit path.
//! - [`SafeStack`] is a LIFO container whose push and pop operations are
//!   single atomic calls, including a blocking [`SafeStack::wait_and_pop`].

pub mod error;
pub mod stack;
pub mod thread;

pub use error::{ThreadError, ThreadResult, TryPushError};
pub use stack::SafeStack;
pub use thread::{HandleState, JoinGuard, ThreadBuilder, ThreadHandle, ThreadId};
