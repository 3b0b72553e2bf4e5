use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ldc_common::prelude::*;
use ldc_state::{Account, AccountLedger, StakeAccountInfo, StakeConfig};
use std::hint::black_box;
use std::str::FromStr;

const NOW: Timestamp = 1_700_000_000;

fn staker(i: usize) -> Address {
    let mut bytes = [0u8; 20];
    bytes[..8].copy_from_slice(&(i as u64 + 1).to_be_bytes());
    Address::new(bytes)
}

// Pool with `holders` entries and some undistributed surplus
fn create_pool(holders: usize) -> Account {
    let pool = Account::new(StakeSymbol::from_str("#BENCH").unwrap().address());
    pool.init_ledger(AccountLedger::default()).unwrap();

    let cfg = StakeConfig {
        token: TokenSymbol::NATIVE,
        stake_type: 0,
        lock_time: 0,
        withdraw_fee: 1_000,
        min_amount: ldc(1),
        max_amount: ldc(1_000_000_000),
    };
    let keepers = StakeAccountInfo {
        threshold: 1,
        keepers: vec![staker(0)],
        ..Default::default()
    };
    pool.create_stake(&staker(0), &ldc(1_000), &ldc(1_000), &keepers, &cfg, NOW)
        .unwrap();
    pool.add(&TokenSymbol::NATIVE, &ldc(1_000)).unwrap();
    pool.lock_pledge(&ldc(1_000)).unwrap();

    for i in 1..holders {
        let amount = ldc(10 + i as u64);
        pool.take_stake(&TokenSymbol::NATIVE, &staker(i), &amount, 0)
            .unwrap();
        pool.add(&TokenSymbol::NATIVE, &amount).unwrap();
    }
    pool.add(&TokenSymbol::NATIVE, &ldc(7)).unwrap();
    pool
}

fn bench_get_stake_amount(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_stake_amount");
    for holders in [10, 100, 1_000] {
        let pool = create_pool(holders);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(holders), &pool, |b, pool| {
            b.iter(|| pool.get_stake_amount(&TokenSymbol::NATIVE, black_box(&staker(holders / 2))))
        });
    }
    group.finish();
}

fn bench_take_stake(c: &mut Criterion) {
    let mut group = c.benchmark_group("take_stake");
    for holders in [10, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(holders), &holders, |b, &holders| {
            b.iter_batched(
                || create_pool(holders),
                |pool| {
                    pool.take_stake(&TokenSymbol::NATIVE, &staker(holders + 1), &ldc(5), 0)
                        .unwrap();
                    pool
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_get_stake_amount, bench_take_stake);
criterion_main!(benches);
