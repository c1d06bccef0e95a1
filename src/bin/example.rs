//! Producer-consumer example using owning handles and a shared stack.
//!
//! Producers push numbered work items, consumers block in `wait_and_pop`
//! until work arrives. Each consumer stops when it pops a zero. The zeros are
//! pushed once every producer is joined and the queue has drained, and they
//! are pushed on the error path too, so no handle is ever dropped joinable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use guarded_threads::{JoinGuard, SafeStack, ThreadBuilder, ThreadHandle, ThreadResult};

const PRODUCERS: u64 = 3;
const CONSUMERS: usize = 2;
const ITEMS_PER_PRODUCER: u64 = 10;
const STOP: u64 = 0;

/// Per-thread context passed into each producer explicitly.
struct ProducerContext {
    index: u64,
    queue: Arc<SafeStack<u64>>,
}

fn start_consumers(
    consumers: &mut [ThreadHandle],
    queue: &Arc<SafeStack<u64>>,
    consumed_sum: &Arc<AtomicU64>,
) -> ThreadResult<()> {
    for (c, slot) in consumers.iter_mut().enumerate() {
        let queue = queue.clone();
        let consumed_sum = consumed_sum.clone();
        let handle = ThreadBuilder::new()
            .name(format!("consumer-{}", c))
            .spawn(move || loop {
                let item = queue.wait_and_pop();
                if item == STOP {
                    break;
                }
                consumed_sum.fetch_add(item, Ordering::Relaxed);
            })?;
        *slot = handle;
    }
    Ok(())
}

fn start_producers(producers: &mut [ThreadHandle], queue: &Arc<SafeStack<u64>>) -> ThreadResult<()> {
    for (index, slot) in (0..).zip(producers.iter_mut()) {
        let ctx = ProducerContext {
            index,
            queue: queue.clone(),
        };
        *slot = ThreadHandle::spawn_with(ctx, |ctx| {
            for i in 1..=ITEMS_PER_PRODUCER {
                ctx.queue.push(ctx.index * 100 + i);
            }
        })?;
    }
    Ok(())
}

/// Join every joinable handle, returning the first failure.
fn join_all(handles: &mut [ThreadHandle], role: &str) -> ThreadResult<()> {
    let mut first = Ok(());
    for handle in handles.iter_mut().filter(|h| h.joinable()) {
        let id = handle.id();
        match JoinGuard::new(handle).join() {
            Ok(()) => println!("{} {} finished", role, id),
            Err(err) => {
                println!("{} {} failed: {}", role, id, err);
                if first.is_ok() {
                    first = Err(err);
                }
            }
        }
    }
    first
}

fn main() -> ThreadResult<()> {
    println!("=== guarded-threads producer/consumer example ===");

    let queue = Arc::new(SafeStack::new());
    let consumed_sum = Arc::new(AtomicU64::new(0));

    // Every slot starts empty, so an early failure leaves nothing abandoned.
    let mut consumers: Vec<ThreadHandle> = (0..CONSUMERS).map(|_| ThreadHandle::new()).collect();
    let mut producers: Vec<ThreadHandle> = (0..PRODUCERS).map(|_| ThreadHandle::new()).collect();

    let started = start_consumers(&mut consumers, &queue, &consumed_sum)
        .and_then(|()| start_producers(&mut producers, &queue));
    let produced = join_all(&mut producers, "producer");

    // STOP goes on top of the stack, so wait for the backlog to drain first.
    // After the producers are joined the queue only shrinks.
    if started.is_ok() && produced.is_ok() {
        while !queue.is_empty() {
            std::thread::yield_now();
        }
    }
    for _ in 0..CONSUMERS {
        queue.push(STOP);
    }
    let consumed = join_all(&mut consumers, "consumer");

    started.and(produced).and(consumed)?;

    let expected: u64 = (0..PRODUCERS)
        .flat_map(|p| (1..=ITEMS_PER_PRODUCER).map(move |i| p * 100 + i))
        .sum();
    println!(
        "consumed sum {} (expected {}), {} items left",
        consumed_sum.load(Ordering::Relaxed),
        expected,
        queue.len()
    );
    Ok(())
}
