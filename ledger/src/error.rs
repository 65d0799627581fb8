use commons_types::{Address, AssetId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("insufficient balance for {holder}: need {needed}, have {available}")]
    InsufficientBalance {
        holder: Address,
        needed: u128,
        available: u128,
    },

    #[error("arithmetic overflow in ledger")]
    Overflow,

    #[error("transfer of {asset} failed: {reason}")]
    TransferFailed { asset: AssetId, reason: String },
}
