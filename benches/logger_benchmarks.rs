//! Criterion benchmarks for console_logger

use console_logger::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;

fn memory_logger(dispatcher: impl Dispatcher + 'static) -> Logger {
    Logger::builder()
        .name("bench")
        .level(LogLevel::Trace)
        .date_format("")
        .sink(MemorySink::new())
        .dispatcher(dispatcher)
        .sync_mode()
        .build()
        .expect("Failed to build logger")
}

// ============================================================================
// AsyncWriter Benchmarks
// ============================================================================

fn bench_async_writer(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_writer");
    group.throughput(Throughput::Elements(1));

    for capacity in [1usize, 100, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("write", capacity),
            &capacity,
            |b, &capacity| {
                let writer = AsyncWriter::new(SharedSink::new(MemorySink::new()), capacity)
                    .expect("Failed to start writer");
                b.iter(|| writer.write(black_box(b"benchmark payload\n")));
                writer.close();
            },
        );
    }

    group.bench_function("direct_sink_write", |b| {
        let sink = SharedSink::new(MemorySink::new());
        b.iter(|| sink.write_all(black_box(b"benchmark payload\n")));
    });

    group.finish();
}

// ============================================================================
// Logging Performance Benchmarks
// ============================================================================

fn bench_sync_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_logging");
    group.throughput(Throughput::Elements(1));

    let logger = memory_logger(DefaultDispatcher::new());
    group.bench_function("text", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    let logger = memory_logger(JsonDispatcher::new());
    group.bench_function("json", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    let logger = memory_logger(DefaultDispatcher::new());
    logger
        .set_date_format(console_logger::DEFAULT_DATE_FORMAT)
        .expect("valid date format");
    group.bench_function("text_with_date", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    group.finish();
}

fn bench_async_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_logging");
    group.throughput(Throughput::Elements(1));

    let logger = memory_logger(DefaultDispatcher::new());
    logger.set_async(10_000).expect("Failed to start async output");

    group.bench_function("text", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    group.bench_function("formatted", |b| {
        b.iter(|| console_logger::info!(logger, "User {} performed {}", black_box(42), "login"));
    });

    group.finish();
    logger.set_sync().expect("Failed to drain async output");
}

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let logger = memory_logger(DefaultDispatcher::new());
    logger.set_level(LogLevel::Error);

    group.bench_function("filtered_out", |b| {
        b.iter(|| logger.debug(black_box("Debug message")));
    });

    group.bench_function("is_enabled", |b| {
        b.iter(|| black_box(logger.is_debug_enabled()));
    });

    group.finish();
}

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements((threads * 100) as u64));
        group.bench_with_input(
            BenchmarkId::new("async_100_per_thread", threads),
            &threads,
            |b, &threads| {
                let logger = Arc::new(memory_logger(DefaultDispatcher::new()));
                logger.set_async(1000).expect("Failed to start async output");

                b.iter(|| {
                    let handles: Vec<_> = (0..threads)
                        .map(|t| {
                            let logger = Arc::clone(&logger);
                            thread::spawn(move || {
                                for i in 0..100 {
                                    console_logger::info!(logger, "thread {} message {}", t, i);
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().expect("logging thread panicked");
                    }
                });

                logger.set_sync().expect("Failed to drain async output");
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_async_writer,
    bench_sync_logging,
    bench_async_logging,
    bench_level_filtering,
    bench_concurrent_logging
);

criterion_main!(benches);
