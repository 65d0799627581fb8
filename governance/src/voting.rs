//! Share-weighted voting: quorum and approval arithmetic.

use crate::error::GovernanceError;
use commons_types::BasisPoints;
use serde::{Deserialize, Serialize};

/// Running yes/no totals for one funding request.
///
/// Weights are share balances captured when each vote is cast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub yes: u128,
    pub no: u128,
}

impl VoteTally {
    pub fn new(yes: u128, no: u128) -> Self {
        Self { yes, no }
    }

    /// Add `weight` to one side.
    pub fn record(&mut self, support: bool, weight: u128) -> Result<(), GovernanceError> {
        let (yes, no) = if support {
            (self.yes.checked_add(weight), Some(self.no))
        } else {
            (Some(self.yes), self.no.checked_add(weight))
        };
        let (yes, no) = yes.zip(no).ok_or(GovernanceError::Overflow)?;
        // Keep total() exact.
        yes.checked_add(no).ok_or(GovernanceError::Overflow)?;
        self.yes = yes;
        self.no = no;
        Ok(())
    }

    /// Total weight cast on either side.
    pub fn total(&self) -> u128 {
        self.yes.saturating_add(self.no)
    }
}

/// The outcome of evaluating a closed vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOutcome {
    /// Quorum reached and the yes-share of cast weight met the threshold.
    Approved,
    /// Too little of the outstanding share supply took part.
    QuorumNotMet { have_bps: u128, need_bps: u32 },
    /// Quorum reached, but the yes-side fell short.
    ApprovalNotMet { have_bps: u128, need_bps: u32 },
}

impl VoteOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Evaluates tallies against the pool's quorum and approval thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingEngine {
    pub quorum: BasisPoints,
    pub approval: BasisPoints,
}

impl VotingEngine {
    pub fn new(quorum: BasisPoints, approval: BasisPoints) -> Self {
        Self { quorum, approval }
    }

    /// Turnout as basis points of the total share supply.
    /// Zero when no shares are outstanding.
    pub fn turnout_bps(&self, tally: &VoteTally, total_shares: u128) -> u128 {
        BasisPoints::ratio(tally.total(), total_shares).unwrap_or(0)
    }

    /// Yes-weight as basis points of the weight cast. Zero when nobody voted.
    pub fn approval_bps(&self, tally: &VoteTally) -> u128 {
        BasisPoints::ratio(tally.yes, tally.total()).unwrap_or(0)
    }

    pub fn quorum_met(&self, tally: &VoteTally, total_shares: u128) -> bool {
        total_shares > 0 && self.turnout_bps(tally, total_shares) >= u128::from(self.quorum.raw())
    }

    pub fn approval_met(&self, tally: &VoteTally) -> bool {
        tally.total() > 0 && self.approval_bps(tally) >= u128::from(self.approval.raw())
    }

    /// Decide a closed vote.
    ///
    /// Quorum is checked first; a vote that misses quorum is rejected whatever
    /// its yes-share.
    pub fn evaluate(&self, tally: &VoteTally, total_shares: u128) -> VoteOutcome {
        if !self.quorum_met(tally, total_shares) {
            return VoteOutcome::QuorumNotMet {
                have_bps: self.turnout_bps(tally, total_shares),
                need_bps: self.quorum.raw(),
            };
        }
        if !self.approval_met(tally) {
            return VoteOutcome::ApprovalNotMet {
                have_bps: self.approval_bps(tally),
                need_bps: self.approval.raw(),
            };
        }
        VoteOutcome::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(quorum: u32, approval: u32) -> VotingEngine {
        VotingEngine::new(
            BasisPoints::new(quorum).unwrap(),
            BasisPoints::new(approval).unwrap(),
        )
    }

    #[test]
    fn unanimous_full_turnout_approves() {
        let e = engine(5_000, 6_000);
        let tally = VoteTally::new(1_500, 0);
        assert_eq!(e.evaluate(&tally, 1_500), VoteOutcome::Approved);
    }

    #[test]
    fn quorum_boundary_is_inclusive() {
        let e = engine(5_000, 6_000);
        // exactly 50% turnout
        assert!(e.quorum_met(&VoteTally::new(500, 0), 1_000));
        // 49.99..% truncates to 4999
        assert!(!e.quorum_met(&VoteTally::new(4_999, 0), 10_000));
    }

    #[test]
    fn quorum_failure_wins_over_approval() {
        let e = engine(5_000, 6_000);
        let outcome = e.evaluate(&VoteTally::new(100, 0), 1_000);
        assert_eq!(
            outcome,
            VoteOutcome::QuorumNotMet {
                have_bps: 1_000,
                need_bps: 5_000
            }
        );
        assert!(!outcome.is_approved());
    }

    #[test]
    fn approval_uses_cast_weight_not_supply() {
        let e = engine(5_000, 6_000);
        // 600 of 1000 cast = 60%, turnout 100%
        assert!(e.evaluate(&VoteTally::new(600, 400), 1_000).is_approved());
        // 599 of 1000 cast = 59.9% -> 5990 bps
        assert_eq!(
            e.evaluate(&VoteTally::new(599, 401), 1_000),
            VoteOutcome::ApprovalNotMet {
                have_bps: 5_990,
                need_bps: 6_000
            }
        );
    }

    #[test]
    fn zero_supply_or_zero_votes_never_approve() {
        let e = engine(0, 0);
        assert!(!e.evaluate(&VoteTally::default(), 0).is_approved());
        assert!(!e.evaluate(&VoteTally::default(), 1_000).is_approved());
    }

    #[test]
    fn record_accumulates_and_checks_overflow() {
        let mut tally = VoteTally::default();
        tally.record(true, 10).unwrap();
        tally.record(false, 5).unwrap();
        tally.record(true, 1).unwrap();
        assert_eq!(tally, VoteTally::new(11, 5));
        assert_eq!(tally.total(), 16);

        let mut big = VoteTally::new(u128::MAX, 0);
        assert_eq!(big.record(false, 1), Err(GovernanceError::Overflow));
    }
}
