use alloy_primitives::U256;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use transfer_validator::blockchain::{decode_all_transfers, decode_transfer, format_units, TRANSFER_EVENT_SIGNATURE};
use transfer_validator::models::RawLog;

fn create_transfer_log(id: u64) -> RawLog {
    RawLog {
        address: "0xc2132d05d31c914a87c6611c10748aeb04b58e8f".to_string(),
        topics: vec![
            TRANSFER_EVENT_SIGNATURE.to_string(),
            format!("0x{:064x}", id),
            "0x000000000000000000000000f977814e90da44bfa03b6295a0616a897441acec".to_string(),
        ],
        data: format!("0x{:064x}", (id as u128 + 1) * 1_000_000_000_000_000_000),
        block_number: 1000 + id,
        transaction_hash: format!("0x{:064x}", id),
        log_index: id as u32,
    }
}

fn create_approval_log(id: u64) -> RawLog {
    let mut log = create_transfer_log(id);
    log.topics[0] = "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925".to_string();
    log
}

fn bench_decode_transfer(c: &mut Criterion) {
    let transfer = create_transfer_log(1);
    let approval = create_approval_log(1);

    let mut group = c.benchmark_group("decode_transfer");
    group.bench_function("transfer_event", |b| b.iter(|| decode_transfer(black_box(&transfer))));
    group.bench_function("non_transfer_event", |b| b.iter(|| decode_transfer(black_box(&approval))));
    group.finish();
}

fn bench_decode_receipt(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_all_transfers");

    for size in [1u64, 10, 100, 500].iter() {
        // Every third log is not a transfer
        let logs: Vec<RawLog> = (0..*size)
            .map(|i| if i % 3 == 2 { create_approval_log(i) } else { create_transfer_log(i) })
            .collect();

        group.bench_with_input(BenchmarkId::new("receipt_logs", size), &logs, |b, logs| {
            b.iter(|| decode_all_transfers(black_box(logs)));
        });
    }

    group.finish();
}

fn bench_format_units(c: &mut Criterion) {
    let whole = U256::from(1_000_000_000_000_000_000u128);
    let fractional = U256::from(1_234_567_890_123_456_789u128);

    let mut group = c.benchmark_group("format_units");
    group.bench_function("whole_18", |b| b.iter(|| format_units(black_box(whole), 18)));
    group.bench_function("fractional_18", |b| b.iter(|| format_units(black_box(fractional), 18)));
    group.bench_function("max_6", |b| b.iter(|| format_units(black_box(U256::MAX), 6)));
    group.finish();
}

criterion_group!(benches, bench_decode_transfer, bench_decode_receipt, bench_format_units);
criterion_main!(benches);
