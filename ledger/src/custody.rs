//! Asset custody capability.

use crate::error::LedgerError;
use commons_types::{Address, AssetId};

/// Moves assets between the pool's custody and external holders.
///
/// For [`AssetId::Native`], `pull` accepts the value the caller attached to
/// the current call; the pool checks the attached value before calling it.
/// For tokens, `pull` transfers from the holder's balance (the environment is
/// responsible for allowances).
///
/// Implementations must either move the full amount or fail without effect.
pub trait AssetTransfer {
    fn pull(&mut self, asset: &AssetId, from: &Address, amount: u128) -> Result<(), LedgerError>;

    fn push(&mut self, asset: &AssetId, to: &Address, amount: u128) -> Result<(), LedgerError>;
}

impl<T: AssetTransfer + ?Sized> AssetTransfer for Box<T> {
    fn pull(&mut self, asset: &AssetId, from: &Address, amount: u128) -> Result<(), LedgerError> {
        (**self).pull(asset, from, amount)
    }

    fn push(&mut self, asset: &AssetId, to: &Address, amount: u128) -> Result<(), LedgerError> {
        (**self).push(asset, to, amount)
    }
}
