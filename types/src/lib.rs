//! Fundamental types for the Commons treasury.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! external identities, asset identifiers, timestamps, and basis-point arithmetic.

pub mod address;
pub mod asset;
pub mod bps;
pub mod error;
pub mod time;

pub use address::Address;
pub use asset::AssetId;
pub use bps::{BasisPoints, BPS_DENOMINATOR};
pub use error::TypesError;
pub use time::Timestamp;
