#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use guarded_threads::SafeStack;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum StackOperation {
    Push(u32),
    TryPush(u32),
    TryPop,
    WaitAndPop,
    TopCopy,
    Extend(Vec<u32>),
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let stack = SafeStack::new();
    let mut model: Vec<u32> = Vec::new();

    for _ in 0..256 {
        let Ok(op) = StackOperation::arbitrary(&mut u) else {
            break;
        };
        match op {
            StackOperation::Push(v) => {
                stack.push(v);
                model.push(v);
            }
            StackOperation::TryPush(v) => {
                if stack.try_push(v).is_ok() {
                    model.push(v);
                }
            }
            StackOperation::TryPop => assert_eq!(stack.try_pop(), model.pop()),
            StackOperation::WaitAndPop => {
                // Only when it cannot block on a single thread.
                if let Some(expected) = model.pop() {
                    assert_eq!(stack.wait_and_pop(), expected);
                }
            }
            StackOperation::TopCopy => assert_eq!(stack.top_copy(), model.last().copied()),
            StackOperation::Extend(values) => {
                model.extend_from_slice(&values);
                stack.extend_from(values);
            }
        }
        assert_eq!(stack.len(), model.len());
    }

    assert_eq!(stack.into_vec(), model);
});
