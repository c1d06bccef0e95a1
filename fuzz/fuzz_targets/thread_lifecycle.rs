#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use guarded_threads::{HandleState, JoinGuard, ThreadBuilder, ThreadHandle};
use libfuzzer_sys::fuzz_target;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const MAX_HANDLES: usize = 8;

#[derive(Debug, Arbitrary)]
enum HandleOperation {
    Spawn { slot: u8, work: u16, named: bool },
    Join(u8),
    Detach(u8),
    Take { from: u8, to: u8 },
    Assign { slot: u8, work: u16 },
    Guard(u8),
    Query(u8),
}

fn busy(counter: &AtomicU64, work: u16) {
    let mut sum = 0u64;
    for i in 0..u64::from(work) {
        sum = sum.wrapping_add(i);
    }
    counter.fetch_add(sum % 7 + 1, Ordering::Relaxed);
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let counter = Arc::new(AtomicU64::new(0));
    let mut handles: Vec<ThreadHandle> = (0..MAX_HANDLES).map(|_| ThreadHandle::new()).collect();

    for _ in 0..32 {
        let Ok(op) = HandleOperation::arbitrary(&mut u) else {
            break;
        };
        match op {
            HandleOperation::Spawn { slot, work, named } => {
                let h = &mut handles[slot as usize % MAX_HANDLES];
                if h.joinable() {
                    continue;
                }
                let counter = counter.clone();
                let mut builder = ThreadBuilder::new();
                if named {
                    builder = builder.name("fuzz");
                }
                if let Ok(fresh) = builder.spawn(move || busy(&counter, work)) {
                    assert!(h.assign_handle(fresh).is_ok());
                }
            }
            HandleOperation::Join(slot) => {
                let h = &mut handles[slot as usize % MAX_HANDLES];
                let was_joinable = h.joinable();
                assert_eq!(h.join().is_ok(), was_joinable);
                assert!(!h.joinable());
            }
            HandleOperation::Detach(slot) => {
                let h = &mut handles[slot as usize % MAX_HANDLES];
                let was_joinable = h.joinable();
                assert_eq!(h.detach().is_ok(), was_joinable);
                assert!(!h.joinable());
            }
            HandleOperation::Take { from, to } => {
                let (from, to) = (from as usize % MAX_HANDLES, to as usize % MAX_HANDLES);
                if from == to || handles[to].joinable() {
                    continue;
                }
                let moved = handles[from].take();
                assert_eq!(handles[from].state(), HandleState::Empty);
                assert!(handles[to].assign_handle(moved).is_ok());
            }
            HandleOperation::Assign { slot, work } => {
                let h = &mut handles[slot as usize % MAX_HANDLES];
                let was_joinable = h.joinable();
                let counter = counter.clone();
                let result = h.assign(move || busy(&counter, work));
                if was_joinable {
                    assert!(result.unwrap_err().is_invalid_state());
                }
            }
            HandleOperation::Guard(slot) => {
                let h = &mut handles[slot as usize % MAX_HANDLES];
                {
                    let _guard = JoinGuard::new(h);
                }
                assert!(!h.joinable());
            }
            HandleOperation::Query(slot) => {
                let h = &handles[slot as usize % MAX_HANDLES];
                assert_eq!(h.joinable(), !h.id().is_null());
            }
        }
    }

    for h in &mut handles {
        if h.joinable() {
            h.join().unwrap();
        }
    }
});
