//! Governance arithmetic for the Commons treasury.
//!
//! Two gates stand between a funding request and the pool's money:
//! 1. **Share-weighted vote**: turnout must reach the quorum (fraction of all
//!    outstanding shares) and the yes-side must reach the approval threshold
//!    (fraction of the weight actually cast).
//! 2. **Guardian escalation**: requests at or above a configured fraction of
//!    the pool additionally need a strict majority of active guardians.
//!
//! Both are pure functions of their inputs. All percentages are basis points
//! with truncating integer division.

pub mod error;
pub mod escalation;
pub mod voting;

pub use error::GovernanceError;
pub use escalation::{EscalationStatus, GuardianEscalation};
pub use voting::{VoteOutcome, VoteTally, VotingEngine};
