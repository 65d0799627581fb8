use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("guardian escalation required: {have} of {need} guardian approvals")]
    EscalationRequired { have: u32, need: u32 },

    #[error("arithmetic overflow in vote accounting")]
    Overflow,
}
