//! The move-only owning thread handle.

use std::any::Any;
use std::mem;
use std::thread::JoinHandle;

use super::{HandleState, JoinGuard, ThreadBuilder, ThreadId};
use crate::error::{ThreadError, ThreadResult};

/// A thread that has been spawned but not yet joined or detached.
pub(crate) struct Live {
    pub(crate) id: ThreadId,
    pub(crate) name: Option<String>,
    pub(crate) inner: JoinHandle<()>,
}

enum Slot {
    Empty,
    Joinable(Live),
    Finished,
}

/// Exclusive owner of at most one OS thread.
///
/// A handle is `Empty` when default-constructed or moved-from, `Joinable`
/// while it owns a thread, and `Finished` after [`join`](Self::join) or
/// [`detach`](Self::detach). The handle is not `Clone`, so two handles can
/// never refer to the same thread.
///
/// # Aborts
///
/// Dropping a handle that is still joinable aborts the process. That thread
/// would otherwise keep running with no owner. Wrap handles in a
/// [`JoinGuard`] when the enclosing scope can exit early.
///
/// Handles cannot be copied:
///
/// ```compile_fail
/// use guarded_threads::ThreadHandle;
///
/// let original = ThreadHandle::new();
/// let copy = original.clone();
/// ```
pub struct ThreadHandle {
    slot: Slot,
}

impl ThreadHandle {
    /// Create an empty handle that owns no thread.
    pub const fn new() -> Self {
        Self { slot: Slot::Empty }
    }

    /// Start a new thread running `f` with default settings.
    pub fn spawn<F>(f: F) -> ThreadResult<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        ThreadBuilder::new().spawn(f)
    }

    /// Start a new thread running `f(arg)`.
    ///
    /// `arg` is moved into the thread. Share data by passing an `Arc`.
    pub fn spawn_with<A, F>(arg: A, f: F) -> ThreadResult<Self>
    where
        A: Send + 'static,
        F: FnOnce(A) + Send + 'static,
    {
        ThreadBuilder::new().spawn_with(arg, f)
    }

    pub(crate) fn from_live(live: Live) -> Self {
        Self {
            slot: Slot::Joinable(live),
        }
    }

    pub fn state(&self) -> HandleState {
        match self.slot {
            Slot::Empty => HandleState::Empty,
            Slot::Joinable(_) => HandleState::Joinable,
            Slot::Finished => HandleState::Finished,
        }
    }

    /// True iff the handle owns a thread that is neither joined nor detached.
    pub fn joinable(&self) -> bool {
        matches!(self.slot, Slot::Joinable(_))
    }

    /// The owned thread's identifier, or [`ThreadId::NULL`] when not joinable.
    pub fn id(&self) -> ThreadId {
        match &self.slot {
            Slot::Joinable(live) => live.id,
            _ => ThreadId::NULL,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.slot {
            Slot::Joinable(live) => live.name.as_deref(),
            _ => None,
        }
    }

    /// Whether the owned thread has returned, so that `join` would not block.
    pub fn is_finished(&self) -> bool {
        match &self.slot {
            Slot::Joinable(live) => live.inner.is_finished(),
            _ => false,
        }
    }

    /// Block until the owned thread completes.
    ///
    /// The handle is `Finished` afterwards even if the thread panicked; the
    /// panic is reported as [`ThreadError::Panicked`].
    pub fn join(&mut self) -> ThreadResult<()> {
        let live = self.release("join")?;
        tracing::debug!(thread_id = %live.id, "joining thread");

        match live.inner.join() {
            Ok(()) => {
                thread_trace!(thread_id = %live.id, "thread joined");
                Ok(())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(thread_id = %live.id, %message, "joined thread had panicked");
                Err(ThreadError::Panicked {
                    id: live.id,
                    message,
                })
            }
        }
    }

    /// Let the owned thread run to completion on its own.
    pub fn detach(&mut self) -> ThreadResult<()> {
        let live = self.release("detach")?;
        tracing::debug!(thread_id = %live.id, "detaching thread");
        // Dropping a std join handle detaches the thread.
        drop(live.inner);
        Ok(())
    }

    /// Move the owned thread out, leaving this handle `Empty`.
    pub fn take(&mut self) -> ThreadHandle {
        mem::take(self)
    }

    /// Replace this handle's contents with a new thread running `f`.
    ///
    /// Fails with [`ThreadError::InvalidState`] if the handle is joinable;
    /// `f` is not started in that case.
    pub fn assign<F>(&mut self, f: F) -> ThreadResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.check_replaceable("assign")?;
        let mut fresh = ThreadHandle::spawn(f)?;
        self.slot = mem::replace(&mut fresh.slot, Slot::Empty);
        Ok(())
    }

    /// Move `other`'s thread into this handle, leaving `other` empty.
    ///
    /// If this handle is joinable, nothing moves and `other` is returned.
    pub fn assign_handle(&mut self, mut other: ThreadHandle) -> Result<(), ThreadHandle> {
        if self.joinable() {
            return Err(other);
        }
        self.slot = mem::replace(&mut other.slot, Slot::Empty);
        Ok(())
    }

    /// Bind a [`JoinGuard`] to this handle.
    pub fn guard(&mut self) -> JoinGuard<'_> {
        JoinGuard::new(self)
    }

    fn check_replaceable(&self, op: &'static str) -> ThreadResult<()> {
        if self.joinable() {
            return Err(ThreadError::InvalidState {
                op,
                state: self.state(),
            });
        }
        Ok(())
    }

    fn release(&mut self, op: &'static str) -> ThreadResult<Live> {
        match mem::replace(&mut self.slot, Slot::Finished) {
            Slot::Joinable(live) => Ok(live),
            other => {
                let state = match other {
                    Slot::Empty => HandleState::Empty,
                    _ => HandleState::Finished,
                };
                self.slot = other;
                Err(ThreadError::InvalidState { op, state })
            }
        }
    }
}

impl Default for ThreadHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ThreadHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadHandle")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("name", &self.name())
            .finish()
    }
}

impl Drop for ThreadHandle {
    fn drop(&mut self) {
        if let Slot::Joinable(live) = &self.slot {
            tracing::error!(
                thread_id = %live.id,
                name = ?live.name,
                "thread handle dropped while joinable; aborting"
            );
            std::process::abort();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("<non-string panic payload>")
    }
}
