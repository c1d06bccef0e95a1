//! Owning thread handles with RAII join guarantees.
//!
//! A [`ThreadHandle`] owns at most one OS thread. Ownership moves but never
//! copies, so a given thread is joined or detached exactly once. Pair every
//! handle with an explicit `join()`/`detach()` or with a [`JoinGuard`];
//! dropping a handle that still owns a running thread aborts the process.

use core::fmt;
use portable_atomic::{AtomicU64, Ordering};

macro_rules! thread_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "thread-debug")]
        tracing::trace!($($arg)*);
    };
}
pub(crate) use thread_trace;

pub mod builder;
pub mod guard;
pub mod handle;

pub use builder::ThreadBuilder;
pub use guard::JoinGuard;
pub use handle::ThreadHandle;

/// Identifier of the thread owned by a [`ThreadHandle`].
///
/// Identifiers are allocated from a process-wide counter and never reused.
/// [`ThreadId::NULL`] is reported by handles that own nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ThreadId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl ThreadId {
    /// The identifier of "no thread".
    pub const NULL: ThreadId = ThreadId(0);

    pub(crate) fn allocate() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a [`ThreadHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Default-constructed or moved-from; owns nothing.
    Empty,
    /// Owns a thread that has not been joined or detached.
    Joinable,
    /// Joined or detached.
    Finished,
}

/// Kernel thread id of the calling thread, for log correlation.
#[cfg(target_os = "linux")]
pub(crate) fn native_id() -> i64 {
    // SAFETY: gettid takes no arguments and cannot fail.
    unsafe { libc::syscall(libc::SYS_gettid) as i64 }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn native_id() -> i64 {
    0
}
