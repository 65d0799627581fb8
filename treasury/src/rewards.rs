//! Proportional reward distribution.
//!
//! A per-asset accumulator records how much each share has earned since the
//! pool started, scaled by [`REWARD_PRECISION`]. A member's claimable amount
//! is `shares * cumulative / REWARD_PRECISION - debt`, where `debt` is the
//! accrued value at their last claim. Distribution is O(1) in the number of
//! members.

use crate::error::PoolError;
use crate::event::PoolEvent;
use crate::pool::{mul_div, Call, Pool, Tx, Undo};
use commons_ledger::{AssetTransfer, ShareLedger};
use commons_types::{Address, AssetId};
use std::collections::HashMap;
use tracing::info;

/// Fixed-point scale of the cumulative reward per share.
pub const REWARD_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Result of crediting rewards to the accumulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Credit {
    /// Spread over outstanding shares. `amount` includes any escrow folded in.
    Distributed { amount: u128, cumulative_per_share: u128 },
    /// Held until shares exist.
    Escrowed { amount: u128 },
}

/// One asset's accumulator entries, captured before a credit.
#[derive(Clone, Debug)]
pub(crate) struct RewardMark {
    asset: AssetId,
    cumulative: Option<u128>,
    escrow: Option<u128>,
}

#[derive(Clone, Debug, Default)]
pub struct RewardDistributor {
    cumulative: HashMap<AssetId, u128>,
    debt: HashMap<(Address, AssetId), u128>,
    escrow: HashMap<AssetId, u128>,
}

impl RewardDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cumulative_per_share(&self, asset: &AssetId) -> u128 {
        self.cumulative.get(asset).copied().unwrap_or(0)
    }

    pub fn escrowed(&self, asset: &AssetId) -> u128 {
        self.escrow.get(asset).copied().unwrap_or(0)
    }

    pub fn debt(&self, member: &Address, asset: &AssetId) -> u128 {
        self.debt
            .get(&(member.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Lifetime rewards earned by `shares` of `asset`.
    pub fn accrued(&self, shares: u128, asset: &AssetId) -> Option<u128> {
        mul_div(shares, self.cumulative_per_share(asset), REWARD_PRECISION)
    }

    /// What `member` holding `shares` could claim now. Never negative.
    pub fn pending(&self, member: &Address, shares: u128, asset: &AssetId) -> Option<u128> {
        Some(self.accrued(shares, asset)?.saturating_sub(self.debt(member, asset)))
    }

    /// Add `amount` of `asset` to the accumulator, folding in any escrow.
    pub fn credit(
        &mut self,
        asset: &AssetId,
        amount: u128,
        total_shares: u128,
    ) -> Result<Credit, PoolError> {
        let held = self.escrowed(asset);
        let amount = amount.checked_add(held).ok_or(PoolError::Overflow)?;
        if total_shares == 0 {
            self.escrow.insert(asset.clone(), amount);
            return Ok(Credit::Escrowed { amount });
        }
        let increment = mul_div(amount, REWARD_PRECISION, total_shares).ok_or(PoolError::Overflow)?;
        let cumulative = self
            .cumulative_per_share(asset)
            .checked_add(increment)
            .ok_or(PoolError::Overflow)?;
        self.cumulative.insert(asset.clone(), cumulative);
        self.escrow.remove(asset);
        Ok(Credit::Distributed {
            amount,
            cumulative_per_share: cumulative,
        })
    }

    /// Record that `member` has been paid up to `accrued`. Returns the
    /// previous entry.
    pub(crate) fn settle(&mut self, member: &Address, asset: &AssetId, accrued: u128) -> Option<u128> {
        self.debt.insert((member.clone(), asset.clone()), accrued)
    }

    pub(crate) fn restore_debt(&mut self, member: &Address, asset: &AssetId, prior: Option<u128>) {
        let key = (member.clone(), asset.clone());
        match prior {
            Some(debt) => {
                self.debt.insert(key, debt);
            }
            None => {
                self.debt.remove(&key);
            }
        }
    }

    pub(crate) fn mark(&self, asset: &AssetId) -> RewardMark {
        RewardMark {
            asset: asset.clone(),
            cumulative: self.cumulative.get(asset).copied(),
            escrow: self.escrow.get(asset).copied(),
        }
    }

    pub(crate) fn restore(&mut self, mark: RewardMark) {
        match mark.cumulative {
            Some(value) => self.cumulative.insert(mark.asset.clone(), value),
            None => self.cumulative.remove(&mark.asset),
        };
        match mark.escrow {
            Some(value) => self.escrow.insert(mark.asset, value),
            None => self.escrow.remove(&mark.asset),
        };
    }
}

impl<L: ShareLedger, X: AssetTransfer> Pool<L, X> {
    /// Pull `amount` of `asset` from the caller and spread it over all shares.
    ///
    /// Rejected when no shares are outstanding, before any funds move.
    pub fn distribute_rewards(
        &mut self,
        call: &Call,
        asset: &AssetId,
        amount: u128,
    ) -> Result<u128, PoolError> {
        self.transact("distribute_rewards", |pool, tx| {
            if amount == 0 {
                return Err(PoolError::ZeroAmount);
            }
            let total_shares = pool.shares.total_supply();
            if total_shares == 0 {
                return Err(PoolError::NoSharesOutstanding);
            }

            let credit = pool.credit_rewards(tx, asset, amount, total_shares)?;
            let Credit::Distributed {
                amount: credited,
                cumulative_per_share,
            } = credit
            else {
                return Err(PoolError::NoSharesOutstanding);
            };
            tx.emit(PoolEvent::RewardsDistributed {
                asset: asset.clone(),
                amount: credited,
                cumulative_per_share,
            });

            pool.pull(tx, call, asset, amount)?;
            info!(%asset, amount = credited, cumulative_per_share, "rewards distributed");
            Ok(cumulative_per_share)
        })
    }

    /// Pay the caller everything they have accrued in `asset`. Returns the
    /// amount paid, zero if nothing was owed.
    pub fn claim_rewards(&mut self, call: &Call, asset: &AssetId) -> Result<u128, PoolError> {
        self.transact("claim_rewards", |pool, tx| {
            pool.require_active(&call.caller)?;
            let shares = pool.shares.balance_of(&call.caller);
            let accrued = pool
                .state
                .rewards
                .accrued(shares, asset)
                .ok_or(PoolError::Overflow)?;
            let owed = accrued.saturating_sub(pool.state.rewards.debt(&call.caller, asset));
            if owed == 0 {
                return Ok(0);
            }

            pool.settle_rewards(tx, &call.caller, asset, accrued);
            tx.emit(PoolEvent::RewardsClaimed {
                member: call.caller.clone(),
                asset: asset.clone(),
                amount: owed,
            });

            pool.push(asset, &call.caller, owed)?;
            info!(member = %call.caller, %asset, amount = owed, "rewards claimed");
            Ok(owed)
        })
    }

    /// Rewards `member` could claim in `asset` right now.
    pub fn pending_rewards(&self, member: &Address, asset: &AssetId) -> u128 {
        let shares = self.shares.balance_of(member);
        self.state
            .rewards
            .pending(member, shares, asset)
            .unwrap_or(0)
    }

    pub fn reward_escrow(&self, asset: &AssetId) -> u128 {
        self.state.rewards.escrowed(asset)
    }

    pub(crate) fn credit_rewards(
        &mut self,
        tx: &mut Tx,
        asset: &AssetId,
        amount: u128,
        total_shares: u128,
    ) -> Result<Credit, PoolError> {
        tx.record(Undo::Rewards(self.state.rewards.mark(asset)));
        self.state.rewards.credit(asset, amount, total_shares)
    }

    fn settle_rewards(&mut self, tx: &mut Tx, member: &Address, asset: &AssetId, accrued: u128) {
        let prior = self.state.rewards.settle(member, asset, accrued);
        tx.record(Undo::Debt {
            member: member.clone(),
            asset: asset.clone(),
            prior,
        });
    }
}
