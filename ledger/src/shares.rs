//! Non-transferable share ledger.

use crate::error::LedgerError;
use commons_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ledger of non-transferable claim units.
///
/// Shares can only be created by the pool (on deposit) and destroyed by the
/// pool (on withdrawal). Holders cannot move them, so there is no transfer in
/// this interface.
pub trait ShareLedger {
    fn mint(&mut self, holder: &Address, amount: u128) -> Result<(), LedgerError>;

    fn burn(&mut self, holder: &Address, amount: u128) -> Result<(), LedgerError>;

    fn balance_of(&self, holder: &Address) -> u128;

    fn total_supply(&self) -> u128;
}

/// In-memory share ledger.
///
/// Holders whose balance drops to zero are removed, so `holder_count` only
/// counts addresses with a positive balance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryShareLedger {
    balances: HashMap<Address, u128>,
    total_supply: u128,
}

impl MemoryShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of holders with a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Recompute the total from individual balances.
    /// Useful for consistency checks against the incremental `total_supply`.
    pub fn recompute_total(&self) -> u128 {
        self.balances.values().sum()
    }
}

impl ShareLedger for MemoryShareLedger {
    fn mint(&mut self, holder: &Address, amount: u128) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let total = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self.balances.entry(holder.clone()).or_insert(0);
        // Cannot overflow: balance <= total_supply.
        *balance += amount;
        self.total_supply = total;
        Ok(())
    }

    fn burn(&mut self, holder: &Address, amount: u128) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let available = self.balance_of(holder);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: holder.clone(),
                needed: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(holder);
        } else {
            self.balances.insert(holder.clone(), remaining);
        }
        self.total_supply -= amount;
        Ok(())
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> Address {
        Address::new(name)
    }

    #[test]
    fn mint_and_burn_track_supply() {
        let mut ledger = MemoryShareLedger::new();
        ledger.mint(&addr("a"), 500).unwrap();
        ledger.mint(&addr("b"), 1_000).unwrap();
        assert_eq!(ledger.total_supply(), 1_500);

        ledger.burn(&addr("a"), 200).unwrap();
        assert_eq!(ledger.balance_of(&addr("a")), 300);
        assert_eq!(ledger.total_supply(), 1_300);
        assert_eq!(ledger.recompute_total(), ledger.total_supply());
    }

    #[test]
    fn burn_more_than_balance_fails_without_effect() {
        let mut ledger = MemoryShareLedger::new();
        ledger.mint(&addr("a"), 10).unwrap();
        let err = ledger.burn(&addr("a"), 11).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                holder: addr("a"),
                needed: 11,
                available: 10,
            }
        );
        assert_eq!(ledger.balance_of(&addr("a")), 10);
        assert_eq!(ledger.total_supply(), 10);
    }

    #[test]
    fn zero_amounts_rejected() {
        let mut ledger = MemoryShareLedger::new();
        assert_eq!(ledger.mint(&addr("a"), 0), Err(LedgerError::ZeroAmount));
        assert_eq!(ledger.burn(&addr("a"), 0), Err(LedgerError::ZeroAmount));
    }

    #[test]
    fn full_burn_removes_holder() {
        let mut ledger = MemoryShareLedger::new();
        ledger.mint(&addr("a"), 10).unwrap();
        ledger.burn(&addr("a"), 10).unwrap();
        assert_eq!(ledger.holder_count(), 0);
        assert_eq!(ledger.balance_of(&addr("a")), 0);
    }

    #[test]
    fn mint_overflow_rejected() {
        let mut ledger = MemoryShareLedger::new();
        ledger.mint(&addr("a"), u128::MAX).unwrap();
        assert_eq!(ledger.mint(&addr("b"), 1), Err(LedgerError::Overflow));
        assert_eq!(ledger.balance_of(&addr("b")), 0);
    }
}
