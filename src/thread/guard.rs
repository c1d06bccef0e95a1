//! Scope-bound join guard.

use super::{ThreadHandle, ThreadId};
use crate::error::ThreadResult;

/// Joins a borrowed [`ThreadHandle`] when the enclosing scope exits.
///
/// The guard runs on every exit path: normal return, early `?` return and
/// unwinding from a panic. Because it holds a mutable borrow, it cannot
/// outlive the handle and nothing else can join or detach the handle while
/// the guard is bound.
///
/// ```
/// use guarded_threads::{JoinGuard, ThreadHandle};
///
/// let mut worker = ThreadHandle::spawn(|| { /* background work */ }).unwrap();
/// let _guard = JoinGuard::new(&mut worker);
/// // fallible work here; the worker is joined however the scope ends
/// ```
pub struct JoinGuard<'a> {
    handle: &'a mut ThreadHandle,
}

impl<'a> JoinGuard<'a> {
    pub fn new(handle: &'a mut ThreadHandle) -> Self {
        Self { handle }
    }

    pub fn joinable(&self) -> bool {
        self.handle.joinable()
    }

    pub fn id(&self) -> ThreadId {
        self.handle.id()
    }

    /// Join now and report the outcome, instead of waiting for scope exit.
    pub fn join(self) -> ThreadResult<()> {
        // The drop that follows finds the handle finished and does nothing.
        self.handle.join()
    }
}

impl Drop for JoinGuard<'_> {
    fn drop(&mut self) {
        if !self.handle.joinable() {
            return;
        }
        if let Err(err) = self.handle.join() {
            tracing::warn!(error = %err, "guarded thread did not finish cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::HandleState;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug)]
    struct WorkFailed;

    fn slow_flag_setter(done: Arc<AtomicBool>) -> ThreadHandle {
        ThreadHandle::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            done.store(true, Ordering::SeqCst);
        })
        .unwrap()
    }

    #[test]
    fn test_guard_joins_on_scope_exit() {
        let done = Arc::new(AtomicBool::new(false));
        let mut handle = slow_flag_setter(done.clone());
        {
            let guard = JoinGuard::new(&mut handle);
            assert!(guard.joinable());
        }
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(handle.state(), HandleState::Finished);
    }

    #[test]
    fn test_guard_joins_on_early_error_return() {
        let done = Arc::new(AtomicBool::new(false));
        let mut handle = slow_flag_setter(done.clone());

        fn fallible(handle: &mut ThreadHandle) -> Result<(), WorkFailed> {
            let _guard = handle.guard();
            let retries: u32 = "not a number".parse().map_err(|_| WorkFailed)?;
            assert!(retries > 0);
            Ok(())
        }

        assert!(fallible(&mut handle).is_err());
        // The error reached us only after the guard had joined.
        assert!(done.load(Ordering::SeqCst));
        assert!(!handle.joinable());
    }

    #[test]
    fn test_guard_joins_during_unwind() {
        let done = Arc::new(AtomicBool::new(false));
        let mut handle = slow_flag_setter(done.clone());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = JoinGuard::new(&mut handle);
            panic!("scope failed");
        }));

        assert!(result.is_err());
        assert!(done.load(Ordering::SeqCst));
        assert!(!handle.joinable());
    }

    #[test]
    fn test_explicit_join_through_guard() {
        let mut handle = ThreadHandle::spawn(|| {}).unwrap();
        let guard = handle.guard();
        assert!(!guard.id().is_null());
        guard.join().unwrap();
        assert_eq!(handle.state(), HandleState::Finished);
    }

    #[test]
    fn test_guard_on_detached_handle_is_noop() {
        let mut handle = ThreadHandle::spawn(|| {}).unwrap();
        handle.detach().unwrap();
        let guard = JoinGuard::new(&mut handle);
        assert!(!guard.joinable());
    }

    #[test]
    fn test_guard_swallows_thread_panic() {
        let mut handle = ThreadHandle::spawn(|| panic!("boom")).unwrap();
        {
            let _guard = handle.guard();
        }
        assert_eq!(handle.state(), HandleState::Finished);
    }
}
