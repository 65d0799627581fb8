//! Pool errors and their classification.

use crate::request::{RequestId, RequestStatus};
use commons_governance::GovernanceError;
use commons_ledger::LedgerError;
use commons_types::{Address, TypesError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad failure classes callers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The caller lacks the role the operation requires.
    Authorization,
    /// The operation is not valid in the current state.
    StateViolation,
    /// The inputs are unacceptable.
    ValidationFailure,
    /// An internal accounting invariant would break.
    InvariantBreach,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    // ── Authorization ──────────────────────────────────────────────────
    #[error("{0} is not the pool admin")]
    NotAdmin(Address),

    #[error("{0} is not whitelisted")]
    NotWhitelisted(Address),

    #[error("{0} is not an active member")]
    NotActiveMember(Address),

    #[error("{0} is not a guardian")]
    NotGuardian(Address),

    #[error("{caller} is not the requester of request {id}")]
    NotRequester { id: RequestId, caller: Address },

    // ── State violations ───────────────────────────────────────────────
    #[error("pool is closed to deposits")]
    PoolClosed,

    #[error("request {id} is {actual}, expected {expected}")]
    WrongStatus {
        id: RequestId,
        actual: RequestStatus,
        expected: RequestStatus,
    },

    #[error("voting on request {0} has closed")]
    VotingClosed(RequestId),

    #[error("voting on request {0} is still open")]
    VotingStillOpen(RequestId),

    #[error("{voter} has already voted on request {id}")]
    AlreadyVoted { id: RequestId, voter: Address },

    #[error("guardian {guardian} has already approved request {id}")]
    AlreadyApproved { id: RequestId, guardian: Address },

    #[error("{0} is already a guardian")]
    AlreadyGuardian(Address),

    #[error("request {id} term has not elapsed (ends at {ends_at}s)")]
    TermNotElapsed { id: RequestId, ends_at: u64 },

    #[error("request {id} needs guardian escalation: {have} of {need} approvals")]
    EscalationRequired { id: RequestId, have: u32, need: u32 },

    #[error("re-entrant call rejected while another pool operation is in flight")]
    Reentrant,

    #[error("pool state is unavailable: a previous operation panicked")]
    Poisoned,

    // ── Validation failures ────────────────────────────────────────────
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("deposit of {amount} is below the minimum of {minimum}")]
    BelowMinimumDeposit { amount: u128, minimum: u128 },

    #[error("deposit of {0} is too small to mint a share")]
    DepositTooSmall(u128),

    #[error("{kind} requests require collateral")]
    MissingCollateral { kind: crate::request::RequestKind },

    #[error("request of {requested} exceeds the concentration cap of {cap}")]
    ExceedsConcentrationCap { requested: u128, cap: u128 },

    #[error("insufficient available funds: requested {requested}, available {available}")]
    InsufficientAvailableFunds { requested: u128, available: u128 },

    #[error("insufficient shares: requested {requested}, balance {balance}")]
    InsufficientShares { requested: u128, balance: u128 },

    #[error("request {0} not found")]
    RequestNotFound(RequestId),

    #[error("no shares outstanding to receive rewards")]
    NoSharesOutstanding,

    #[error("attached value {attached} does not match expected {expected}")]
    ValueMismatch { attached: u128, expected: u128 },

    #[error("repayment of {amount} exceeds outstanding {outstanding}")]
    OverRepayment { amount: u128, outstanding: u128 },

    #[error("invalid pool configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    // ── Invariant breaches ─────────────────────────────────────────────
    #[error("redemption of {amount} exceeds available funds {available}")]
    RedemptionExceedsAvailable { amount: u128, available: u128 },

    #[error("arithmetic overflow in pool accounting")]
    Overflow,
}

impl PoolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAdmin(_)
            | Self::NotWhitelisted(_)
            | Self::NotActiveMember(_)
            | Self::NotGuardian(_)
            | Self::NotRequester { .. } => ErrorKind::Authorization,

            Self::PoolClosed
            | Self::WrongStatus { .. }
            | Self::VotingClosed(_)
            | Self::VotingStillOpen(_)
            | Self::AlreadyVoted { .. }
            | Self::AlreadyApproved { .. }
            | Self::AlreadyGuardian(_)
            | Self::TermNotElapsed { .. }
            | Self::EscalationRequired { .. }
            | Self::Reentrant
            | Self::Poisoned => ErrorKind::StateViolation,

            Self::Ledger(LedgerError::Overflow)
            | Self::RedemptionExceedsAvailable { .. }
            | Self::Overflow => ErrorKind::InvariantBreach,

            Self::ZeroAmount
            | Self::BelowMinimumDeposit { .. }
            | Self::DepositTooSmall(_)
            | Self::MissingCollateral { .. }
            | Self::ExceedsConcentrationCap { .. }
            | Self::InsufficientAvailableFunds { .. }
            | Self::InsufficientShares { .. }
            | Self::RequestNotFound(_)
            | Self::NoSharesOutstanding
            | Self::ValueMismatch { .. }
            | Self::OverRepayment { .. }
            | Self::Config(_)
            | Self::Types(_)
            | Self::Ledger(_) => ErrorKind::ValidationFailure,
        }
    }

    /// Attach a request id to a governance failure.
    pub(crate) fn from_governance(id: RequestId, err: GovernanceError) -> Self {
        match err {
            GovernanceError::EscalationRequired { have, need } => {
                Self::EscalationRequired { id, have, need }
            }
            GovernanceError::Overflow => Self::Overflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_matches_taxonomy() {
        assert_eq!(
            PoolError::NotAdmin(Address::new("x")).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(PoolError::PoolClosed.kind(), ErrorKind::StateViolation);
        assert_eq!(PoolError::ZeroAmount.kind(), ErrorKind::ValidationFailure);
        assert_eq!(
            PoolError::RedemptionExceedsAvailable {
                amount: 2,
                available: 1
            }
            .kind(),
            ErrorKind::InvariantBreach
        );
    }

    #[test]
    fn ledger_overflow_is_an_invariant_breach() {
        assert_eq!(
            PoolError::from(LedgerError::Overflow).kind(),
            ErrorKind::InvariantBreach
        );
        assert_eq!(
            PoolError::from(LedgerError::ZeroAmount).kind(),
            ErrorKind::ValidationFailure
        );
    }
}
