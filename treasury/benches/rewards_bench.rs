use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use commons_ledger::MemoryShareLedger;
use commons_nullables::NullBank;
use commons_treasury::{Call, Pool, PoolConfig, RewardDistributor};
use commons_types::{Address, AssetId, Timestamp};

fn usdc() -> AssetId {
    AssetId::token("usdc")
}

fn pool_with_members(n: usize) -> Pool<MemoryShareLedger, NullBank> {
    let mut bank = NullBank::new().with_funds(&usdc(), &Address::new("sponsor"), u128::MAX / 2);
    let members: Vec<Address> = (0..n).map(|i| Address::new(format!("m{i}"))).collect();
    for member in &members {
        bank.fund(&AssetId::Native, member, 1_000_000);
    }
    let mut pool = Pool::new(
        PoolConfig::new("bench", AssetId::Native),
        Address::new("admin"),
        MemoryShareLedger::new(),
        bank,
    )
    .unwrap();
    let admin = Call::new("admin", Timestamp::EPOCH);
    pool.batch_whitelist(&admin, &members).unwrap();
    for (i, member) in members.iter().enumerate() {
        let call = Call::new(member.clone(), Timestamp::EPOCH).with_value(1_000 + i as u128);
        pool.deposit(&call, 0).unwrap();
    }
    pool
}

fn bench_credit(c: &mut Criterion) {
    let mut group = c.benchmark_group("reward_credit");
    let asset = usdc();
    group.bench_function("credit", |b| {
        let mut rewards = RewardDistributor::new();
        b.iter(|| black_box(rewards.credit(black_box(&asset), black_box(1_000), black_box(1_500))));
    });
    group.finish();
}

fn bench_distribute_and_claim(c: &mut Criterion) {
    let mut group = c.benchmark_group("reward_distribute_claim");

    // Distribution cost must not depend on the number of members.
    for member_count in [10, 100, 1000] {
        let mut pool = pool_with_members(member_count);
        let sponsor = Call::new("sponsor", Timestamp::EPOCH);
        let claimer = Call::new("m0", Timestamp::EPOCH);

        group.bench_with_input(
            BenchmarkId::new("distribute", member_count),
            &member_count,
            |b, _| {
                b.iter(|| black_box(pool.distribute_rewards(&sponsor, &usdc(), black_box(1_000))));
            },
        );
        group.bench_with_input(
            BenchmarkId::new("distribute_then_claim", member_count),
            &member_count,
            |b, _| {
                b.iter(|| {
                    pool.distribute_rewards(&sponsor, &usdc(), 1_000).unwrap();
                    black_box(pool.claim_rewards(&claimer, &usdc()))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_credit, bench_distribute_and_claim);
criterion_main!(benches);
