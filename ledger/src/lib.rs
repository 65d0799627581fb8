//! Capabilities consumed by the pool core.
//!
//! The pool does not own balances of shares or assets directly. It talks to two
//! collaborators through narrow traits:
//! - [`ShareLedger`]: mint, burn, balance and total supply of non-transferable
//!   claim units. There is deliberately no transfer or approve operation.
//! - [`AssetTransfer`]: pull assets into custody and push them out again, for
//!   both the native currency and tokens.
//!
//! [`MemoryShareLedger`] is a complete in-process share ledger.

pub mod custody;
pub mod error;
pub mod shares;

pub use custody::AssetTransfer;
pub use error::LedgerError;
pub use shares::{MemoryShareLedger, ShareLedger};
