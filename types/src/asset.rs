//! Asset identifiers: the native currency or a token contract.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an asset the pool can hold.
///
/// A pool's reference asset is either the native currency of the execution
/// environment (received as value attached to a call) or a token moved through
/// the token path of the custody capability. Collateral and reward assets use
/// the same identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetId {
    /// The native currency sentinel.
    Native,
    /// A fungible token identified by its contract address.
    Token(Address),
}

impl AssetId {
    pub fn token(address: impl Into<Address>) -> Self {
        Self::Token(address.into())
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Token(address) => write!(f, "token:{}", address),
        }
    }
}
