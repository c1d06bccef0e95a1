//! Thread builder for configuring thread creation.

use std::thread;

use super::handle::Live;
use super::{native_id, ThreadHandle, ThreadId};
use crate::error::{ThreadError, ThreadResult};

/// Builder for configuring and creating new threads.
///
/// This provides a convenient interface for setting thread parameters
/// before spawning, similar to std::thread::Builder.
#[derive(Debug, Clone, Default)]
pub struct ThreadBuilder {
    /// Thread name (for debugging)
    name: Option<String>,
    /// Requested stack size in bytes; platform default when unset
    stack_size: Option<usize>,
}

impl ThreadBuilder {
    /// Smallest stack a builder will request from the platform.
    pub const MIN_STACK_SIZE: usize = 16 * 1024;

    /// Create a new thread builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name for debugging purposes.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the stack size in bytes.
    ///
    /// Requests below [`MIN_STACK_SIZE`](Self::MIN_STACK_SIZE) are rounded up.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size.max(Self::MIN_STACK_SIZE));
        self
    }

    /// Spawn a new thread running `f`.
    ///
    /// The thread starts immediately. Fails with
    /// [`ThreadError::ResourceExhausted`] if the OS refuses to create it.
    pub fn spawn<F>(self, f: F) -> ThreadResult<ThreadHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.spawn_with((), move |()| f())
    }

    /// Spawn a new thread running `f(arg)`, moving `arg` into the thread.
    pub fn spawn_with<A, F>(self, arg: A, f: F) -> ThreadResult<ThreadHandle>
    where
        A: Send + 'static,
        F: FnOnce(A) + Send + 'static,
    {
        let id = ThreadId::allocate();

        let mut std_builder = thread::Builder::new();
        if let Some(name) = &self.name {
            std_builder = std_builder.name(name.clone());
        }
        if let Some(size) = self.stack_size {
            std_builder = std_builder.stack_size(size);
        }

        let inner = std_builder
            .spawn(move || {
                thread_trace!(thread_id = %id, native_id = native_id(), "thread started");
                f(arg);
                thread_trace!(thread_id = %id, "thread function returned");
            })
            .map_err(|err| {
                tracing::error!(thread_id = %id, error = %err, "OS refused to spawn thread");
                ThreadError::ResourceExhausted(err)
            })?;

        tracing::debug!(
            thread_id = %id,
            name = ?self.name,
            spawner = native_id(),
            "spawned thread"
        );

        Ok(ThreadHandle::from_live(Live {
            id,
            name: self.name,
            inner,
        }))
    }
}
