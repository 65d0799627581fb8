use proptest::prelude::*;

use commons_ledger::{MemoryShareLedger, ShareLedger};
use commons_nullables::NullBank;
use commons_treasury::{Call, NewRequest, Pool, PoolConfig, RequestStatus};
use commons_types::{Address, AssetId, BasisPoints, Timestamp};

type TestPool = Pool<MemoryShareLedger, NullBank>;

const MEMBERS: [&str; 4] = ["m0", "m1", "m2", "m3"];
const VOTING_PERIOD: u64 = 10;

fn usdc() -> AssetId {
    AssetId::token("usdc")
}

fn pool_with(config: PoolConfig) -> TestPool {
    let mut bank = NullBank::new();
    for name in MEMBERS.iter().chain(["sponsor", "r"].iter()) {
        bank.fund(&AssetId::Native, &Address::new(*name), u128::from(u64::MAX));
        bank.fund(&usdc(), &Address::new(*name), u128::from(u64::MAX));
    }
    let mut pool = Pool::new(config, Address::new("admin"), MemoryShareLedger::new(), bank)
        .expect("valid pool");
    let admin = Call::new("admin", Timestamp::EPOCH);
    let members: Vec<Address> = MEMBERS.iter().map(|m| Address::new(*m)).collect();
    pool.batch_whitelist(&admin, &members).expect("whitelist");
    pool
}

fn default_pool() -> TestPool {
    pool_with(PoolConfig::new("prop", AssetId::Native).with_voting_period(VOTING_PERIOD))
}

fn deposit(pool: &mut TestPool, member: usize, amount: u128, now: u64) -> bool {
    let call = Call::new(MEMBERS[member], Timestamp::new(now)).with_value(amount);
    pool.deposit(&call, 0).is_ok()
}

#[derive(Clone, Debug)]
enum Op {
    Deposit(usize, u128),
    Withdraw(usize, u8),
    Request(u128),
    Vote(usize, bool),
    Finalize,
    Execute,
    Tick,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..MEMBERS.len(), 1u128..10_000).prop_map(|(m, a)| Op::Deposit(m, a)),
        (0..MEMBERS.len(), 1u8..=100).prop_map(|(m, pct)| Op::Withdraw(m, pct)),
        (1u128..5_000).prop_map(Op::Request),
        (0..MEMBERS.len(), any::<bool>()).prop_map(|(m, s)| Op::Vote(m, s)),
        Just(Op::Finalize),
        Just(Op::Execute),
        Just(Op::Tick),
    ]
}

proptest! {
    /// With no requests executed, every deposit keeps shares and deposits equal.
    #[test]
    fn share_price_stays_one_to_one(
        deposits in prop::collection::vec((0..MEMBERS.len(), 1u128..1_000_000), 1..30),
    ) {
        let mut pool = default_pool();
        for (member, amount) in deposits {
            prop_assert!(deposit(&mut pool, member, amount, 0));
            prop_assert_eq!(pool.shares().total_supply(), pool.total_deposited());
        }
    }

    /// Each member's shares equal what they put in minus what they took out.
    #[test]
    fn shares_track_net_deposits(
        steps in prop::collection::vec((0..MEMBERS.len(), 1u128..10_000, any::<bool>()), 1..40),
    ) {
        let mut pool = default_pool();
        let mut net = [0u128; MEMBERS.len()];
        for (member, amount, is_deposit) in steps {
            if is_deposit {
                prop_assert!(deposit(&mut pool, member, amount, 0));
                net[member] += amount;
            } else if net[member] > 0 {
                let shares = amount.min(net[member]);
                let call = Call::new(MEMBERS[member], Timestamp::EPOCH);
                prop_assert_eq!(pool.withdraw(&call, shares), Ok(shares));
                net[member] -= shares;
            }
            for (i, name) in MEMBERS.iter().enumerate() {
                prop_assert_eq!(pool.shares().balance_of(&Address::new(*name)), net[i]);
            }
        }
    }

    /// Earmarked funds never exceed the pool, whatever the interleaving.
    #[test]
    fn available_funds_never_negative(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut pool = default_pool();
        let mut now = 0u64;
        let mut latest = None;
        for op in ops {
            match op {
                Op::Deposit(m, amount) => {
                    deposit(&mut pool, m, amount, now);
                }
                Op::Withdraw(m, pct) => {
                    let shares = pool.shares().balance_of(&Address::new(MEMBERS[m])) * u128::from(pct) / 100;
                    let _ = pool.withdraw(&Call::new(MEMBERS[m], Timestamp::new(now)), shares);
                }
                Op::Request(amount) => {
                    let call = Call::new("r", Timestamp::new(now));
                    if let Ok(id) = pool.create_request(&call, NewRequest::grant("p", amount)) {
                        latest = Some(id);
                    }
                }
                Op::Vote(m, support) => {
                    if let Some(id) = latest {
                        let _ = pool.vote(&Call::new(MEMBERS[m], Timestamp::new(now)), id, support);
                    }
                }
                Op::Finalize => {
                    if let Some(id) = latest {
                        let _ = pool.finalize(&Call::new("r", Timestamp::new(now)), id);
                    }
                }
                Op::Execute => {
                    if let Some(id) = latest {
                        let _ = pool.execute(&Call::new("r", Timestamp::new(now)), id);
                    }
                }
                Op::Tick => now += VOTING_PERIOD / 2,
            }
            prop_assert!(pool.total_pending_funding() <= pool.total_deposited());
            prop_assert_eq!(
                pool.available_funds(),
                pool.total_deposited() - pool.total_pending_funding()
            );
        }
    }

    /// Finalize approves iff turnout and yes-share both reach their thresholds
    /// under truncating basis-point division.
    #[test]
    fn finalize_matches_threshold_arithmetic(
        quorum in 0u32..=10_000,
        approval in 1u32..=10_000,
        stakes in prop::collection::vec(10u128..10_000, MEMBERS.len()),
        choices in prop::collection::vec(0u8..3, MEMBERS.len()),
    ) {
        let config = PoolConfig::new("prop", AssetId::Native)
            .with_voting_period(VOTING_PERIOD)
            .with_thresholds(
                BasisPoints::new(quorum).unwrap(),
                BasisPoints::new(approval).unwrap(),
                BasisPoints::MAX,
            );
        let mut pool = pool_with(config);
        for (m, stake) in stakes.iter().enumerate() {
            prop_assert!(deposit(&mut pool, m, *stake, 0));
        }
        let id = pool
            .create_request(&Call::new("r", Timestamp::EPOCH), NewRequest::grant("p", 1))
            .unwrap();

        let (mut yes, mut no) = (0u128, 0u128);
        for (m, choice) in choices.iter().enumerate() {
            let call = Call::new(MEMBERS[m], Timestamp::EPOCH);
            match choice {
                0 => {
                    pool.vote(&call, id, true).unwrap();
                    yes += stakes[m];
                }
                1 => {
                    pool.vote(&call, id, false).unwrap();
                    no += stakes[m];
                }
                _ => {}
            }
        }
        let total: u128 = stakes.iter().sum();
        let cast = yes + no;
        let expected = cast > 0
            && cast * 10_000 / total >= u128::from(quorum)
            && yes * 10_000 / cast >= u128::from(approval);

        let status = pool
            .finalize(&Call::new("r", Timestamp::new(VOTING_PERIOD)), id)
            .unwrap();
        let want = if expected { RequestStatus::Approved } else { RequestStatus::Rejected };
        prop_assert_eq!(status, want);
    }

    /// Distribute then claim loses at most one unit per claimer.
    #[test]
    fn reward_rounding_is_bounded(
        stakes in prop::collection::vec(1u128..1_000_000, MEMBERS.len()),
        rewards in prop::collection::vec(1u128..1_000_000_000, 1..10),
        claim_between in any::<bool>(),
    ) {
        let mut pool = default_pool();
        for (m, stake) in stakes.iter().enumerate() {
            prop_assert!(deposit(&mut pool, m, *stake, 0));
        }

        let sponsor = Call::new("sponsor", Timestamp::EPOCH);
        let mut distributed = 0u128;
        let mut claimed = 0u128;
        for amount in rewards {
            pool.distribute_rewards(&sponsor, &usdc(), amount).unwrap();
            distributed += amount;
            if claim_between {
                for name in MEMBERS {
                    claimed += pool.claim_rewards(&Call::new(name, Timestamp::EPOCH), &usdc()).unwrap();
                }
            }
        }
        for name in MEMBERS {
            claimed += pool.claim_rewards(&Call::new(name, Timestamp::EPOCH), &usdc()).unwrap();
            prop_assert_eq!(pool.pending_rewards(&Address::new(name), &usdc()), 0);
        }

        prop_assert!(claimed <= distributed);
        prop_assert!(distributed - claimed <= MEMBERS.len() as u128);
    }
}
