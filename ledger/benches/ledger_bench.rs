// Ledger benchmarks: point-in-time vote lookups over long checkpoint
// histories and fee-charging transfers.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use govtoken_ledger::{AccountId, Amount, ManualClock, TokenConfig, TokenLedger};

fn ledger_with_history(checkpoints: u64) -> (TokenLedger, AccountId) {
    let clock = Arc::new(ManualClock::new(0));
    let owner = AccountId::from("owner");
    let voter = AccountId::from("voter");
    let config = TokenConfig::new("Governance", "GOV", Amount::from(u64::MAX), owner.clone());
    let mut ledger = TokenLedger::new(config, clock.clone()).expect("valid config");
    for _ in 0..checkpoints {
        clock.advance(10);
        ledger
            .transfer(&owner, &voter, Amount::from(1u64))
            .expect("owner is funded");
    }
    (ledger, voter)
}

fn bench_prior_votes(c: &mut Criterion) {
    let mut group = c.benchmark_group("checkpoints/prior_votes");
    for &size in &[10u64, 1_000, 100_000] {
        let (ledger, voter) = ledger_with_history(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            // Mid-history probe so the binary search runs to the bottom.
            let t = size * 5 + 3;
            b.iter(|| ledger.get_prior_votes(&voter, t));
        });
    }
    group.finish();
}

fn bench_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/transfer");
    group.throughput(Throughput::Elements(1));
    group.bench_function("with_fee", |b| {
        let clock = Arc::new(ManualClock::new(0));
        let owner = AccountId::from("owner");
        let alice = AccountId::from("alice");
        let config = TokenConfig::new("Governance", "GOV", Amount::from(u64::MAX), owner.clone())
            .with_fee(Amount::from(1u64))
            .with_fee_to(AccountId::from("treasury"));
        let mut ledger = TokenLedger::new(config, clock.clone()).expect("valid config");
        b.iter(|| {
            clock.advance(1);
            ledger
                .transfer(&owner, &alice, Amount::from(1u64))
                .expect("owner is funded")
        });
    });
    group.finish();
}

criterion_group!(benches, bench_prior_votes, bench_transfer);
criterion_main!(benches);
