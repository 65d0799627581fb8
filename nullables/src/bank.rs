//! Nullable custody: an in-memory bank that records every transfer.

use commons_ledger::{AssetTransfer, LedgerError};
use commons_types::{Address, AssetId};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferDirection {
    /// Holder to custody.
    In,
    /// Custody to holder.
    Out,
}

/// One completed movement of funds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub direction: TransferDirection,
    pub asset: AssetId,
    pub counterparty: Address,
    pub amount: u128,
}

type PushHook = Box<dyn FnMut(&AssetId, &Address, u128) + Send>;

/// A test bank holding balances for external addresses and the pool's custody.
///
/// Native and token assets behave alike: pulling debits the holder's balance,
/// pushing credits it. Failures can be injected for the next pull or push.
#[derive(Default)]
pub struct NullBank {
    balances: HashMap<(AssetId, Address), u128>,
    custody: HashMap<AssetId, u128>,
    transfers: Vec<Transfer>,
    fail_next_pull: Option<String>,
    fail_next_push: Option<String>,
    on_push: Option<PushHook>,
}

impl NullBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `holder` funds out of thin air.
    pub fn fund(&mut self, asset: &AssetId, holder: &Address, amount: u128) {
        let balance = self.balances.entry((asset.clone(), holder.clone())).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Builder form of [`NullBank::fund`].
    pub fn with_funds(mut self, asset: &AssetId, holder: &Address, amount: u128) -> Self {
        self.fund(asset, holder, amount);
        self
    }

    pub fn balance(&self, asset: &AssetId, holder: &Address) -> u128 {
        self.balances
            .get(&(asset.clone(), holder.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// What the pool holds of `asset`.
    pub fn custody(&self, asset: &AssetId) -> u128 {
        self.custody.get(asset).copied().unwrap_or(0)
    }

    /// All completed transfers, oldest first.
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Make the next `pull` fail with `reason`.
    pub fn fail_next_pull(&mut self, reason: impl Into<String>) {
        self.fail_next_pull = Some(reason.into());
    }

    /// Make the next `push` fail with `reason`.
    pub fn fail_next_push(&mut self, reason: impl Into<String>) {
        self.fail_next_push = Some(reason.into());
    }

    /// Run `hook` at the start of every push, before any funds move.
    pub fn on_push(&mut self, hook: PushHook) {
        self.on_push = Some(hook);
    }
}

impl AssetTransfer for NullBank {
    fn pull(&mut self, asset: &AssetId, from: &Address, amount: u128) -> Result<(), LedgerError> {
        if let Some(reason) = self.fail_next_pull.take() {
            return Err(LedgerError::TransferFailed {
                asset: asset.clone(),
                reason,
            });
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let available = self.balance(asset, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: from.clone(),
                needed: amount,
                available,
            });
        }
        let held = self.custody(asset);
        let held = held.checked_add(amount).ok_or(LedgerError::Overflow)?;

        self.balances
            .insert((asset.clone(), from.clone()), available - amount);
        self.custody.insert(asset.clone(), held);
        self.transfers.push(Transfer {
            direction: TransferDirection::In,
            asset: asset.clone(),
            counterparty: from.clone(),
            amount,
        });
        trace!(%asset, %from, amount, "pulled into custody");
        Ok(())
    }

    fn push(&mut self, asset: &AssetId, to: &Address, amount: u128) -> Result<(), LedgerError> {
        if let Some(hook) = self.on_push.as_mut() {
            hook(asset, to, amount);
        }
        if let Some(reason) = self.fail_next_push.take() {
            return Err(LedgerError::TransferFailed {
                asset: asset.clone(),
                reason,
            });
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let held = self.custody(asset);
        if held < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: Address::new("custody"),
                needed: amount,
                available: held,
            });
        }
        self.custody.insert(asset.clone(), held - amount);
        self.fund(asset, to, amount);
        self.transfers.push(Transfer {
            direction: TransferDirection::Out,
            asset: asset.clone(),
            counterparty: to.clone(),
            amount,
        });
        trace!(%asset, %to, amount, "pushed out of custody");
        Ok(())
    }
}

impl fmt::Debug for NullBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullBank")
            .field("balances", &self.balances)
            .field("custody", &self.custody)
            .field("transfers", &self.transfers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new("alice")
    }

    #[test]
    fn pull_and_push_move_between_holder_and_custody() {
        let mut bank = NullBank::new().with_funds(&AssetId::Native, &alice(), 100);
        bank.pull(&AssetId::Native, &alice(), 60).unwrap();
        assert_eq!(bank.balance(&AssetId::Native, &alice()), 40);
        assert_eq!(bank.custody(&AssetId::Native), 60);

        bank.push(&AssetId::Native, &alice(), 10).unwrap();
        assert_eq!(bank.balance(&AssetId::Native, &alice()), 50);
        assert_eq!(bank.custody(&AssetId::Native), 50);
        assert_eq!(bank.transfers().len(), 2);
    }

    #[test]
    fn insufficient_balance_fails_without_effect() {
        let mut bank = NullBank::new().with_funds(&AssetId::Native, &alice(), 5);
        assert!(matches!(
            bank.pull(&AssetId::Native, &alice(), 6),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(bank.balance(&AssetId::Native, &alice()), 5);
        assert!(bank.push(&AssetId::Native, &alice(), 1).is_err());
        assert!(bank.transfers().is_empty());
    }

    #[test]
    fn injected_failure_applies_once() {
        let usdc = AssetId::token("usdc");
        let mut bank = NullBank::new().with_funds(&usdc, &alice(), 10);
        bank.fail_next_pull("frozen");
        assert!(matches!(
            bank.pull(&usdc, &alice(), 1),
            Err(LedgerError::TransferFailed { .. })
        ));
        assert!(bank.pull(&usdc, &alice(), 1).is_ok());
    }

    #[test]
    fn assets_are_kept_apart() {
        let usdc = AssetId::token("usdc");
        let mut bank = NullBank::new().with_funds(&usdc, &alice(), 10);
        assert!(bank.pull(&AssetId::Native, &alice(), 1).is_err());
        assert_eq!(bank.balance(&usdc, &alice()), 10);
    }
}
