//! Basis-point percentages with integer-only, truncating arithmetic.
//!
//! Every threshold comparison in the pool (quorum, approval, guardian
//! escalation, request size cap) goes through this type so the results are
//! bit-for-bit reproducible: no floating point, division always rounds down.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 100% expressed in basis points.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// A percentage in basis points (1 bps = 0.01%), always within `0..=10_000`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct BasisPoints(u32);

impl BasisPoints {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(BPS_DENOMINATOR);

    pub fn new(raw: u32) -> Result<Self, TypesError> {
        if raw > BPS_DENOMINATOR {
            return Err(TypesError::InvalidBasisPoints(raw));
        }
        Ok(Self(raw))
    }

    /// Build a constant without the range check. Callers pass literals.
    pub const fn from_raw_unchecked(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `amount × bps / 10_000`, truncating. `None` on overflow.
    pub fn apply(&self, amount: u128) -> Option<u128> {
        amount
            .checked_mul(u128::from(self.0))
            .map(|scaled| scaled / u128::from(BPS_DENOMINATOR))
    }

    /// `part × 10_000 / whole`, truncating.
    ///
    /// Returns `None` when `whole` is zero or the multiplication overflows.
    /// The result is not clamped: a `part` larger than `whole` yields more
    /// than 10_000.
    pub fn ratio(part: u128, whole: u128) -> Option<u128> {
        if whole == 0 {
            return None;
        }
        part.checked_mul(u128::from(BPS_DENOMINATOR))
            .map(|scaled| scaled / whole)
    }

    /// Whether `part / whole` reaches this threshold under truncating division.
    pub fn is_met_by(&self, part: u128, whole: u128) -> bool {
        Self::ratio(part, whole).is_some_and(|have| have >= u128::from(self.0))
    }
}

impl TryFrom<u32> for BasisPoints {
    type Error = TypesError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<BasisPoints> for u32 {
    fn from(bps: BasisPoints) -> Self {
        bps.0
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}
