use std::sync::Arc;
use std::time::Instant;

use guarded_threads::{SafeStack, ThreadBuilder, ThreadHandle};

const SPAWNS: u32 = 200;
const OPS: u32 = 100_000;
const CONTENDERS: u32 = 4;

fn main() {
    println!("\n=== guarded-threads - Performance Benchmarks ===\n");

    // Benchmark 1: Thread creation and join
    println!("Benchmark 1: Spawn + Join");
    println!("-------------------------");

    let start = Instant::now();
    for _ in 0..SPAWNS {
        let mut handle = ThreadHandle::spawn(|| {}).unwrap();
        handle.join().unwrap();
    }
    let elapsed = start.elapsed();
    println!("Spawned and joined {} threads in: {:?}", SPAWNS, elapsed);
    println!("Average per thread: {:?}", elapsed / SPAWNS);

    // Benchmark 2: Uncontended stack operations
    println!("\nBenchmark 2: Uncontended push/try_pop");
    println!("--------------------------------------");

    let stack = SafeStack::with_capacity(OPS as usize);
    let start = Instant::now();
    for i in 0..OPS {
        stack.push(i);
    }
    while stack.try_pop().is_some() {}
    let elapsed = start.elapsed();
    println!("{} push + pop pairs in: {:?}", OPS, elapsed);
    println!(
        "Pairs per second: {:.0}",
        OPS as f64 / elapsed.as_secs_f64()
    );

    // Benchmark 3: Contended producer/consumer
    println!("\nBenchmark 3: Contended wait_and_pop");
    println!("-----------------------------------");

    let stack = Arc::new(SafeStack::new());
    let per_thread = OPS / CONTENDERS;
    let start = Instant::now();

    let mut handles = Vec::new();
    for i in 0..CONTENDERS {
        let consumer = stack.clone();
        handles.push(
            ThreadBuilder::new()
                .name(format!("bench-consumer-{}", i))
                .spawn(move || {
                    for _ in 0..per_thread {
                        consumer.wait_and_pop();
                    }
                })
                .unwrap(),
        );
        let producer = stack.clone();
        handles.push(
            ThreadBuilder::new()
                .name(format!("bench-producer-{}", i))
                .spawn(move || {
                    for v in 0..per_thread {
                        producer.push(v);
                    }
                })
                .unwrap(),
        );
    }
    for handle in &mut handles {
        handle.join().unwrap();
    }
    let elapsed = start.elapsed();
    println!(
        "{} threads moved {} items in: {:?}",
        CONTENDERS * 2,
        per_thread * CONTENDERS,
        elapsed
    );

    // Benchmark 4: Memory footprint
    println!("\nBenchmark 4: Memory Usage");
    println!("-------------------------");
    println!(
        "ThreadHandle size: {} bytes",
        std::mem::size_of::<ThreadHandle>()
    );
    println!(
        "SafeStack<u64> size: {} bytes",
        std::mem::size_of::<SafeStack<u64>>()
    );

    println!("\n=== Benchmarks Complete ===\n");
}
