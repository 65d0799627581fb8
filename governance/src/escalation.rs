//! Guardian escalation: a second gate for large releases.

use crate::error::GovernanceError;
use commons_types::BasisPoints;
use serde::{Deserialize, Serialize};

/// Whether a release may proceed as far as guardians are concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationStatus {
    /// The request is below the escalation floor.
    NotRequired,
    /// The request needed guardian sign-off and has it.
    Satisfied { approvals: u32, required: u32 },
}

/// Detects requests large enough to need guardians and counts their approvals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianEscalation {
    pub threshold: BasisPoints,
}

impl GuardianEscalation {
    pub fn new(threshold: BasisPoints) -> Self {
        Self { threshold }
    }

    /// Smallest amount that needs guardian approval: `threshold` of the pool,
    /// rounded down.
    pub fn escalation_floor(&self, total_pooled: u128) -> Result<u128, GovernanceError> {
        self.threshold
            .apply(total_pooled)
            .ok_or(GovernanceError::Overflow)
    }

    pub fn requires_escalation(
        &self,
        amount: u128,
        total_pooled: u128,
    ) -> Result<bool, GovernanceError> {
        Ok(amount >= self.escalation_floor(total_pooled)?)
    }

    /// Strict majority of the active guardian set: `floor(n / 2) + 1`.
    ///
    /// With no active guardians this is still 1, so an escalated request can
    /// never pass an empty guardian set.
    pub fn required_approvals(active_guardians: u32) -> u32 {
        active_guardians / 2 + 1
    }

    /// Gate a release of `amount` from a pool holding `total_pooled`.
    pub fn authorize(
        &self,
        amount: u128,
        total_pooled: u128,
        approvals: u32,
        active_guardians: u32,
    ) -> Result<EscalationStatus, GovernanceError> {
        if !self.requires_escalation(amount, total_pooled)? {
            return Ok(EscalationStatus::NotRequired);
        }
        let required = Self::required_approvals(active_guardians);
        if approvals < required {
            return Err(GovernanceError::EscalationRequired {
                have: approvals,
                need: required,
            });
        }
        Ok(EscalationStatus::Satisfied {
            approvals,
            required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escalation(bps: u32) -> GuardianEscalation {
        GuardianEscalation::new(BasisPoints::new(bps).unwrap())
    }

    #[test]
    fn threshold_boundary() {
        let e = escalation(2_000);
        assert!(!e.requires_escalation(199, 1_000).unwrap());
        assert!(e.requires_escalation(200, 1_000).unwrap());
        assert!(e.requires_escalation(201, 1_000).unwrap());
    }

    #[test]
    fn strict_majority_rounds_down_then_adds_one() {
        assert_eq!(GuardianEscalation::required_approvals(0), 1);
        assert_eq!(GuardianEscalation::required_approvals(1), 1);
        assert_eq!(GuardianEscalation::required_approvals(2), 2);
        assert_eq!(GuardianEscalation::required_approvals(3), 2);
        assert_eq!(GuardianEscalation::required_approvals(4), 3);
        assert_eq!(GuardianEscalation::required_approvals(5), 3);
    }

    #[test]
    fn authorize_small_request_without_guardians() {
        let e = escalation(2_000);
        assert_eq!(
            e.authorize(199, 1_000, 0, 0).unwrap(),
            EscalationStatus::NotRequired
        );
    }

    #[test]
    fn authorize_large_request_needs_majority() {
        let e = escalation(2_000);
        assert_eq!(
            e.authorize(201, 1_000, 1, 2),
            Err(GovernanceError::EscalationRequired { have: 1, need: 2 })
        );
        assert_eq!(
            e.authorize(201, 1_000, 2, 2).unwrap(),
            EscalationStatus::Satisfied {
                approvals: 2,
                required: 2
            }
        );
    }

    #[test]
    fn empty_guardian_set_blocks_escalated_requests() {
        let e = escalation(2_000);
        assert!(e.authorize(500, 1_000, 0, 0).is_err());
    }
}
