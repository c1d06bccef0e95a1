//! Thread-safe LIFO stack.
//!
//! Every operation runs under one lock and returns its result directly, so a
//! caller never sequences "check empty" and "pop" as two separate calls.
//! Blocked poppers park outside the lock and are woken one per pushed value.
//! Caller code never runs under the lock, with one exception: `T::clone` in
//! [`SafeStack::top_copy`]. A clone that re-enters the same stack panics
//! instead of spinning on the lock forever.

use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::thread::{self, Thread};

use spin::mutex::{SpinMutex, SpinMutexGuard};
use spin::relax::Yield;

use crate::error::TryPushError;
use crate::thread::thread_trace;

struct Inner<T> {
    /// Bottom at index 0, top at the end.
    items: Vec<T>,
    /// Threads parked in `wait_and_pop`, oldest first.
    waiters: VecDeque<Thread>,
}

thread_local! {
    /// Address of the stack whose `top_copy` is cloning on this thread, or 0.
    static CLONING: Cell<usize> = const { Cell::new(0) };
}

/// Marks the current thread as cloning inside `top_copy` until dropped.
struct CloneMark {
    previous: usize,
}

impl CloneMark {
    fn enter(stack: usize) -> Self {
        Self {
            previous: CLONING.with(|c| c.replace(stack)),
        }
    }
}

impl Drop for CloneMark {
    fn drop(&mut self) {
        CLONING.with(|c| c.set(self.previous));
    }
}

impl<T> Inner<T> {
    fn register(&mut self, me: &Thread) {
        if !self.waiters.iter().any(|t| t.id() == me.id()) {
            self.waiters.push_back(me.clone());
        }
    }

    fn unregister(&mut self, me: &Thread) {
        self.waiters.retain(|t| t.id() != me.id());
    }
}

/// A last-in-first-out stack that may be shared between threads.
///
/// Share it by reference (scoped threads) or through an `Arc`. Operations
/// are linearizable: the contents always equal some serial history of the
/// pushes and pops performed so far.
pub struct SafeStack<T> {
    inner: SpinMutex<Inner<T>, Yield>,
}

impl<T> SafeStack<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty stack with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SpinMutex::new(Inner {
                items: Vec::with_capacity(capacity),
                waiters: VecDeque::new(),
            }),
        }
    }

    fn addr(&self) -> usize {
        self as *const Self as usize
    }

    fn lock(&self) -> SpinMutexGuard<'_, Inner<T>> {
        if CLONING.with(Cell::get) == self.addr() {
            panic!("SafeStack accessed from T::clone inside its own top_copy");
        }
        self.inner.lock()
    }

    /// Push `value` onto the top, waking one blocked popper if any.
    ///
    /// # Aborts
    ///
    /// Allocation failure aborts the process, like `Vec::push`. Use
    /// [`try_push`](Self::try_push) to observe it instead.
    pub fn push(&self, value: T) {
        let waiter = {
            let mut inner = self.lock();
            inner.items.push(value);
            thread_trace!(len = inner.items.len(), "push");
            inner.waiters.pop_front()
        };
        if let Some(waiter) = waiter {
            waiter.unpark();
        }
    }

    /// Push `value`, reporting allocation failure instead of aborting.
    ///
    /// On failure the value is returned inside the error and the stack is
    /// unchanged.
    pub fn try_push(&self, value: T) -> Result<(), TryPushError<T>> {
        let waiter = {
            let mut inner = self.lock();
            if let Err(err) = inner.items.try_reserve(1) {
                tracing::error!(error = %err, "stack push failed to allocate");
                return Err(TryPushError::new(value, err));
            }
            inner.items.push(value);
            inner.waiters.pop_front()
        };
        if let Some(waiter) = waiter {
            waiter.unpark();
        }
        Ok(())
    }

    /// Remove and return the top element, or `None` if the stack is empty.
    ///
    /// Never blocks beyond the brief lock acquisition.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().items.pop()
    }

    /// Block until the stack is non-empty, then remove and return the top.
    ///
    /// There is no timeout: a caller blocks until some thread pushes. Which
    /// of several blocked callers receives a given value is unspecified.
    pub fn wait_and_pop(&self) -> T {
        let me = thread::current();
        let mut registered = false;
        loop {
            {
                let mut inner = self.lock();
                if let Some(value) = inner.items.pop() {
                    if registered {
                        inner.unregister(&me);
                    }
                    return value;
                }
                inner.register(&me);
                registered = true;
                thread_trace!(waiters = inner.waiters.len(), "wait_and_pop parking");
            }
            thread::park();
        }
    }

    /// Clone of the current top element, without removing it.
    ///
    /// Diagnostic only: another thread may pop that element right after this
    /// returns.
    ///
    /// # Panics
    ///
    /// `T::clone` runs while the lock is held, so it must not use this
    /// stack. If it does, the call panics; the lock is released and the
    /// stack is left unchanged.
    pub fn top_copy(&self) -> Option<T>
    where
        T: Clone,
    {
        let inner = self.lock();
        let _mark = CloneMark::enter(self.addr());
        inner.items.last().cloned()
    }

    /// Number of elements at the moment of the call. Diagnostic only.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether the stack was empty at the moment of the call. Diagnostic only.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Number of threads registered as blocked in `wait_and_pop`.
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Push every value of `iter` in order under a single lock acquisition.
    ///
    /// The iterator is drained before the lock is taken, so it may use this
    /// stack, and a panicking iterator pushes nothing. The last value yielded
    /// ends up on top.
    pub fn extend_from<I>(&self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut batch: Vec<T> = iter.into_iter().collect();
        if batch.is_empty() {
            return;
        }
        let woken: Vec<Thread> = {
            let mut inner = self.lock();
            let pushed = batch.len();
            inner.items.append(&mut batch);
            let wake = pushed.min(inner.waiters.len());
            inner.waiters.drain(..wake).collect()
        };
        for waiter in woken {
            waiter.unpark();
        }
    }

    /// Consume the stack, returning its elements bottom to top.
    pub fn into_vec(self) -> Vec<T> {
        self.inner.into_inner().items
    }
}

impl<T> Default for SafeStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<T> for SafeStack<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.extend_from(iter);
    }
}

impl<T> FromIterator<T> for SafeStack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            inner: SpinMutex::new(Inner {
                items: iter.into_iter().collect(),
                waiters: VecDeque::new(),
            }),
        }
    }
}

impl<T> fmt::Debug for SafeStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeStack")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
