//! Performance benchmarks for APDU command dispatch.
//!
//! The terminal protocol gives the phone on the order of tens of
//! milliseconds to answer each command before the reader aborts the
//! transaction. These benchmarks document that dispatch (selection read,
//! cache lookup, response assembly) sits in the microsecond range and
//! leaves the entire budget to the radio stack.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench dispatch_bench
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use ghostcard_core::{CardId, CardUid};
use ghostcard_engine::{ApduDispatcher, CardCache, SelectionHandle, usage_channel};
use ghostcard_storage::{CardRecord, SelectionSnapshot};
use std::hint::black_box;

fn bench_engine() -> ApduDispatcher<CardCache> {
    let mut record = CardRecord::scanned(CardUid::from_hex("04A1B2C3").unwrap())
        .with_ats(vec![0x75, 0x77])
        .with_historical_bytes(vec![0x80, 0x4F, 0x0C, 0xA0, 0x00, 0x00, 0x03, 0x06]);
    record.id = 1;

    let cache = CardCache::new();
    cache.insert(record);

    let selection =
        SelectionHandle::with_snapshot(SelectionSnapshot::armed(CardId::new(1).unwrap()));
    let (usage_tx, usage_rx) = usage_channel();
    // Keep the channel open for the benchmark's lifetime
    std::mem::forget(usage_rx);

    ApduDispatcher::new(selection, cache, usage_tx)
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_select");
    group.throughput(Throughput::Elements(1));

    let engine = bench_engine();
    let frame = [
        0x00, 0xA4, 0x04, 0x00, 0x07, 0xF0, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06,
    ];

    group.bench_function("select_with_ats", |b| {
        b.iter(|| black_box(engine.process_command(black_box(&frame))));
    });

    group.finish();
}

fn bench_get_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_get_data");
    group.throughput(Throughput::Elements(1));

    let engine = bench_engine();
    let frame = [0x00, 0xCA, 0x00, 0x00];

    group.bench_function("get_data_uid", |b| {
        b.iter(|| black_box(engine.process_command(black_box(&frame))));
    });

    group.finish();
}

fn bench_read_binary(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_read_binary");
    group.throughput(Throughput::Elements(1));

    let engine = bench_engine();
    let frame = [0x00, 0xB0, 0x00, 0x00, 0x00];

    group.bench_function("read_binary_historical", |b| {
        b.iter(|| black_box(engine.process_command(black_box(&frame))));
    });

    group.finish();
}

fn bench_no_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_no_selection");
    group.throughput(Throughput::Elements(1));

    let cache = CardCache::new();
    let (usage_tx, usage_rx) = usage_channel();
    std::mem::forget(usage_rx);
    let engine = ApduDispatcher::new(SelectionHandle::new(), cache, usage_tx);
    let frame = [0x00, 0xCA, 0x00, 0x00];

    group.bench_function("not_found_short_circuit", |b| {
        b.iter(|| black_box(engine.process_command(black_box(&frame))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_select,
    bench_get_data,
    bench_read_binary,
    bench_no_selection
);
criterion_main!(benches);
