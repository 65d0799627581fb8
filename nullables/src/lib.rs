//! Nullable infrastructure for deterministic testing.
//!
//! Collaborators outside the pool (the clock and asset custody) get
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically, including injected failures
//! - Never touch a real chain or wall clock
//!
//! Usage: swap real implementations for nullables in tests and simulations.

pub mod bank;
pub mod clock;

pub use bank::{NullBank, Transfer, TransferDirection};
pub use clock::NullClock;
