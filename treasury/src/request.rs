//! Funding requests and their lifecycle states.

use commons_governance::VoteTally;
use commons_types::{Address, AssetId, BasisPoints, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential identifier of a funding request within one pool.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Position in the pool's request list. `None` if it cannot be addressed
    /// on this platform.
    pub(crate) fn index(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the requester intends to do with the money.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// A gift. Collateral is optional.
    Grant,
    /// Borrowed funds to be repaid. Collateral is mandatory.
    Loan,
    /// Funds invested for a return. Collateral is mandatory.
    Investment,
}

impl RequestKind {
    pub fn requires_collateral(&self) -> bool {
        !matches!(self, Self::Grant)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Grant => "grant",
            Self::Loan => "loan",
            Self::Investment => "investment",
        };
        f.write_str(s)
    }
}

/// Lifecycle state of a funding request.
///
/// ```text
///            cancel                 reject
///   Voting ─────────► Cancelled    ────────► Rejected
///     │ finalize (approved)
///     ▼
///   Approved ──execute──► Funded ──complete──► Completed
///                           │
///                           └──mark_defaulted──► Defaulted
/// ```
///
/// `Pending` exists for completeness; creation moves straight to `Voting`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Voting,
    Approved,
    Rejected,
    Funded,
    Completed,
    Defaulted,
    Cancelled,
}

impl RequestStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Completed | Self::Defaulted | Self::Cancelled
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Voting => "voting",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Funded => "funded",
            Self::Completed => "completed",
            Self::Defaulted => "defaulted",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Collateral held in custody for the life of a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collateral {
    pub asset: AssetId,
    pub amount: u128,
}

/// Caller-supplied parameters of a new funding request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    pub title: String,
    /// Reference to an off-pool description document.
    #[serde(default)]
    pub description_ref: String,
    pub amount: u128,
    pub kind: RequestKind,
    /// Expected return on top of principal, for loans and investments.
    #[serde(default)]
    pub reward_bps: BasisPoints,
    /// Seconds after funding before the request may be marked defaulted.
    #[serde(default)]
    pub duration_secs: u64,
    /// `None` or a zero amount means no collateral.
    #[serde(default)]
    pub collateral: Option<Collateral>,
}

impl NewRequest {
    pub fn grant(title: impl Into<String>, amount: u128) -> Self {
        Self {
            title: title.into(),
            description_ref: String::new(),
            amount,
            kind: RequestKind::Grant,
            reward_bps: BasisPoints::ZERO,
            duration_secs: 0,
            collateral: None,
        }
    }

    pub fn loan(
        title: impl Into<String>,
        amount: u128,
        reward_bps: BasisPoints,
        duration_secs: u64,
        collateral: Collateral,
    ) -> Self {
        Self {
            title: title.into(),
            description_ref: String::new(),
            amount,
            kind: RequestKind::Loan,
            reward_bps,
            duration_secs,
            collateral: Some(collateral),
        }
    }

    pub fn with_description(mut self, description_ref: impl Into<String>) -> Self {
        self.description_ref = description_ref.into();
        self
    }

    pub fn with_kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_collateral(mut self, collateral: Collateral) -> Self {
        self.collateral = Some(collateral);
        self
    }

    /// Collateral with a non-zero amount, if any.
    pub(crate) fn effective_collateral(&self) -> Option<&Collateral> {
        self.collateral.as_ref().filter(|c| c.amount > 0)
    }
}

/// A funding request as stored by the pool. Never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRequest {
    pub id: RequestId,
    pub requester: Address,
    pub title: String,
    pub description_ref: String,
    pub amount: u128,
    pub kind: RequestKind,
    pub reward_bps: BasisPoints,
    pub duration_secs: u64,
    pub collateral: Option<Collateral>,
    pub status: RequestStatus,
    pub created_at: Timestamp,
    pub voting_ends_at: Timestamp,
    pub tally: VoteTally,
    /// Guardian approvals collected while `Approved`.
    pub guardian_approvals: u32,
    pub funded_at: Option<Timestamp>,
    pub repaid: u128,
}

impl FundingRequest {
    pub(crate) fn open(
        id: RequestId,
        requester: Address,
        params: NewRequest,
        now: Timestamp,
        voting_period_secs: u64,
    ) -> Self {
        let collateral = params.effective_collateral().cloned();
        Self {
            id,
            requester,
            title: params.title,
            description_ref: params.description_ref,
            amount: params.amount,
            kind: params.kind,
            reward_bps: params.reward_bps,
            duration_secs: params.duration_secs,
            collateral,
            status: RequestStatus::Voting,
            created_at: now,
            voting_ends_at: now.saturating_add(voting_period_secs),
            tally: VoteTally::default(),
            guardian_approvals: 0,
            funded_at: None,
            repaid: 0,
        }
    }

    /// Whether votes are still accepted at `now`.
    pub fn voting_open(&self, now: Timestamp) -> bool {
        self.status == RequestStatus::Voting && now < self.voting_ends_at
    }

    /// Principal plus the expected reward.
    pub fn amount_due(&self) -> Option<u128> {
        self.reward_bps
            .apply(self.amount)
            .and_then(|reward| self.amount.checked_add(reward))
    }

    /// When a funded request may be marked defaulted.
    pub fn term_ends_at(&self) -> Option<Timestamp> {
        self.funded_at
            .map(|funded| funded.saturating_add(self.duration_secs))
    }
}
