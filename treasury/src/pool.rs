//! The pool aggregate: state, collaborators and the transaction wrapper every
//! mutating operation runs in.
//!
//! Operations themselves live in [`crate::membership`], [`crate::lifecycle`]
//! and [`crate::rewards`]; this module owns the shared plumbing.

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::event::{EventBus, PoolEvent};
use crate::member::{Member, MemberRegistry, RegistryMark};
use crate::records::{ParticipationRecords, VoteReceipt};
use crate::request::{FundingRequest, RequestId, RequestStatus};
use crate::rewards::{RewardDistributor, RewardMark};
use commons_governance::{GuardianEscalation, VotingEngine};
use commons_ledger::{AssetTransfer, ShareLedger};
use commons_types::{Address, AssetId, BasisPoints, Timestamp, TypesError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Largest request, as a fraction of total pooled assets.
pub const MAX_REQUEST_BPS: u32 = 3_000;

/// Context of one invocation, supplied by the execution environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub caller: Address,
    pub now: Timestamp,
    /// Native currency attached to the call.
    pub value: u128,
}

impl Call {
    pub fn new(caller: impl Into<Address>, now: Timestamp) -> Self {
        Self {
            caller: caller.into(),
            now,
            value: 0,
        }
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}

/// A member's proportional stake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberShare {
    pub shares: u128,
    pub total_shares: u128,
    /// `shares` as basis points of `total_shares`, truncated.
    pub bps: u128,
}

/// Internal state. Failed operations restore it from a [`Checkpoint`] plus
/// the [`Undo`] entries they recorded.
#[derive(Debug)]
pub(crate) struct PoolState {
    pub open: bool,
    pub registry: MemberRegistry,
    pub requests: Vec<FundingRequest>,
    pub records: ParticipationRecords,
    pub rewards: RewardDistributor,
    pub total_deposited: u128,
    pub total_pending: u128,
}

/// Scalar state, saved whole at the start of every operation.
#[derive(Clone, Copy, Debug)]
struct Checkpoint {
    open: bool,
    total_deposited: u128,
    total_pending: u128,
}

impl PoolState {
    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            open: self.open,
            total_deposited: self.total_deposited,
            total_pending: self.total_pending,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.open = checkpoint.open;
        self.total_deposited = checkpoint.total_deposited;
        self.total_pending = checkpoint.total_pending;
    }
}

/// One reversible effect of the operation in flight.
///
/// Collection entries are saved only when touched, so rolling back costs
/// what the operation changed rather than the size of the pool.
#[derive(Debug)]
pub(crate) enum Undo {
    Mint { holder: Address, amount: u128 },
    Burn { holder: Address, amount: u128 },
    Refund { asset: AssetId, to: Address, amount: u128 },
    Registry(RegistryMark),
    RequestCreated,
    Request { index: usize, prior: Box<FundingRequest> },
    Vote { id: RequestId, voter: Address },
    Approval { id: RequestId, guardian: Address },
    Rewards(RewardMark),
    Debt { member: Address, asset: AssetId, prior: Option<u128> },
}

/// Staged effects of the operation in flight.
#[derive(Debug, Default)]
pub(crate) struct Tx {
    events: Vec<PoolEvent>,
    undo: Vec<Undo>,
}

impl Tx {
    pub fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    pub fn record(&mut self, undo: Undo) {
        self.undo.push(undo);
    }
}

/// A member-governed treasury pool.
///
/// `L` is the share ledger and `X` the custody the pool moves assets through.
/// Each public operation either applies completely or leaves the pool
/// untouched; events are delivered only for committed operations.
#[derive(Debug)]
pub struct Pool<L, X> {
    pub(crate) config: PoolConfig,
    pub(crate) admin: Address,
    pub(crate) voting: VotingEngine,
    pub(crate) escalation: GuardianEscalation,
    pub(crate) state: PoolState,
    pub(crate) shares: L,
    pub(crate) custody: X,
    pub(crate) events: EventBus,
}

impl<L: ShareLedger, X: AssetTransfer> Pool<L, X> {
    /// Create an open pool with no members.
    pub fn new(config: PoolConfig, admin: Address, shares: L, custody: X) -> Result<Self, PoolError> {
        config.validate()?;
        if !admin.is_valid() {
            return Err(TypesError::InvalidAddress(admin.to_string()).into());
        }
        Ok(Self {
            voting: VotingEngine::new(config.quorum_bps, config.approval_bps),
            escalation: GuardianEscalation::new(config.guardian_threshold_bps),
            config,
            admin,
            state: PoolState {
                open: true,
                registry: MemberRegistry::new(),
                requests: Vec::new(),
                records: ParticipationRecords::new(),
                rewards: RewardDistributor::new(),
                total_deposited: 0,
                total_pending: 0,
            },
            shares,
            custody,
            events: EventBus::new(),
        })
    }

    /// Register a listener for committed events.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&PoolEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    pub fn is_open(&self) -> bool {
        self.state.open
    }

    pub fn request(&self, id: RequestId) -> Option<&FundingRequest> {
        self.state.requests.get(id.index()?)
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.len()
    }

    pub fn total_deposited(&self) -> u128 {
        self.state.total_deposited
    }

    pub fn total_pending_funding(&self) -> u128 {
        self.state.total_pending
    }

    /// Pooled assets not earmarked for an approved request.
    pub fn available_funds(&self) -> u128 {
        self.state
            .total_deposited
            .saturating_sub(self.state.total_pending)
    }

    pub fn member(&self, address: &Address) -> Option<&Member> {
        self.state.registry.get(address)
    }

    pub fn member_share(&self, address: &Address) -> MemberShare {
        let shares = self.shares.balance_of(address);
        let total_shares = self.shares.total_supply();
        MemberShare {
            shares,
            total_shares,
            bps: BasisPoints::ratio(shares, total_shares).unwrap_or(0),
        }
    }

    pub fn is_whitelisted(&self, address: &Address) -> bool {
        self.state.registry.is_whitelisted(address)
    }

    pub fn active_member_count(&self) -> usize {
        self.state.registry.active_member_count()
    }

    pub fn active_guardian_count(&self) -> usize {
        self.state.registry.active_guardian_count()
    }

    pub fn members(&self) -> &[Address] {
        self.state.registry.members()
    }

    /// Includes removed guardians; check [`Member::guardian`] for the live flag.
    pub fn guardians(&self) -> &[Address] {
        self.state.registry.guardians()
    }

    /// The vote `voter` cast on request `id`, if any.
    pub fn vote_receipt(&self, id: RequestId, voter: &Address) -> Option<&VoteReceipt> {
        self.state.records.vote(id, voter)
    }

    /// Every vote cast on request `id`, ordered by voter.
    pub fn votes(&self, id: RequestId) -> impl Iterator<Item = (&Address, &VoteReceipt)> {
        self.state.records.votes_for(id)
    }

    pub fn has_approved(&self, id: RequestId, guardian: &Address) -> bool {
        self.state.records.has_approved(id, guardian)
    }

    pub fn history(&self) -> &[PoolEvent] {
        self.events.history()
    }

    pub fn shares(&self) -> &L {
        &self.shares
    }

    pub fn custody(&self) -> &X {
        &self.custody
    }

    pub fn custody_mut(&mut self) -> &mut X {
        &mut self.custody
    }

    // ── Transaction plumbing ───────────────────────────────────────────

    /// Run `op` all-or-nothing.
    ///
    /// Scalars are checkpointed up front. Everything else `op` changes is
    /// recorded in the undo log and replayed in reverse on error, together
    /// with compensation for share-ledger and custody effects. Staged events
    /// are emitted only on success.
    pub(crate) fn transact<T>(
        &mut self,
        name: &'static str,
        op: impl FnOnce(&mut Self, &mut Tx) -> Result<T, PoolError>,
    ) -> Result<T, PoolError> {
        let checkpoint = self.state.checkpoint();
        let mut tx = Tx::default();
        match op(self, &mut tx) {
            Ok(value) => {
                for event in tx.events {
                    self.events.emit(event);
                }
                Ok(value)
            }
            Err(err) => {
                self.unwind(tx.undo);
                self.state.restore(checkpoint);
                warn!(operation = name, error = %err, "pool operation rolled back");
                Err(err)
            }
        }
    }

    fn unwind(&mut self, undo: Vec<Undo>) {
        for step in undo.into_iter().rev() {
            let (action, result) = match step {
                Undo::Mint { holder, amount } => ("mint", self.shares.mint(&holder, amount)),
                Undo::Burn { holder, amount } => ("burn", self.shares.burn(&holder, amount)),
                Undo::Refund { asset, to, amount } => {
                    ("refund", self.custody.push(&asset, &to, amount))
                }
                Undo::Registry(mark) => {
                    self.state.registry.restore(mark);
                    continue;
                }
                Undo::RequestCreated => {
                    self.state.requests.pop();
                    continue;
                }
                Undo::Request { index, prior } => {
                    if let Some(slot) = self.state.requests.get_mut(index) {
                        *slot = *prior;
                    }
                    continue;
                }
                Undo::Vote { id, voter } => {
                    self.state.records.forget_vote(id, &voter);
                    continue;
                }
                Undo::Approval { id, guardian } => {
                    self.state.records.forget_approval(id, &guardian);
                    continue;
                }
                Undo::Rewards(mark) => {
                    self.state.rewards.restore(mark);
                    continue;
                }
                Undo::Debt { member, asset, prior } => {
                    self.state.rewards.restore_debt(&member, &asset, prior);
                    continue;
                }
            };
            if let Err(err) = result {
                error!(action, error = %err, "compensation failed");
            }
        }
    }

    pub(crate) fn require_admin(&self, caller: &Address) -> Result<(), PoolError> {
        if *caller != self.admin {
            return Err(PoolError::NotAdmin(caller.clone()));
        }
        Ok(())
    }

    pub(crate) fn require_active(&self, caller: &Address) -> Result<(), PoolError> {
        if !self.state.registry.is_active(caller) {
            return Err(PoolError::NotActiveMember(caller.clone()));
        }
        Ok(())
    }

    pub(crate) fn require_guardian(&self, caller: &Address) -> Result<(), PoolError> {
        if !self.state.registry.is_guardian(caller) {
            return Err(PoolError::NotGuardian(caller.clone()));
        }
        Ok(())
    }

    /// Registry access for changes to `address`.
    pub(crate) fn registry_mut(&mut self, tx: &mut Tx, address: &Address) -> &mut MemberRegistry {
        tx.record(Undo::Registry(self.state.registry.mark(address)));
        &mut self.state.registry
    }

    pub(crate) fn push_request(&mut self, tx: &mut Tx, request: FundingRequest) {
        self.state.requests.push(request);
        tx.record(Undo::RequestCreated);
    }

    pub(crate) fn request_at(&self, id: RequestId) -> Result<&FundingRequest, PoolError> {
        self.request(id).ok_or(PoolError::RequestNotFound(id))
    }

    /// Mutable access to one request. Its prior value is saved in `tx`.
    pub(crate) fn request_mut(
        &mut self,
        tx: &mut Tx,
        id: RequestId,
    ) -> Result<&mut FundingRequest, PoolError> {
        let index = id.index().ok_or(PoolError::RequestNotFound(id))?;
        let request = self
            .state
            .requests
            .get_mut(index)
            .ok_or(PoolError::RequestNotFound(id))?;
        tx.record(Undo::Request {
            index,
            prior: Box::new(request.clone()),
        });
        Ok(request)
    }

    /// Like [`Pool::request_mut`], after checking the request is in `expected`.
    pub(crate) fn request_in(
        &mut self,
        tx: &mut Tx,
        id: RequestId,
        expected: RequestStatus,
    ) -> Result<&mut FundingRequest, PoolError> {
        let actual = self.request_at(id)?.status;
        if actual != expected {
            return Err(PoolError::WrongStatus {
                id,
                actual,
                expected,
            });
        }
        self.request_mut(tx, id)
    }

    /// Returns `false` if `voter` already voted on `id`.
    pub(crate) fn record_vote(
        &mut self,
        tx: &mut Tx,
        id: RequestId,
        voter: &Address,
        receipt: VoteReceipt,
    ) -> bool {
        let recorded = self.state.records.record_vote(id, voter, receipt);
        if recorded {
            tx.record(Undo::Vote {
                id,
                voter: voter.clone(),
            });
        }
        recorded
    }

    /// Returns `false` if `guardian` already approved `id`.
    pub(crate) fn record_approval(&mut self, tx: &mut Tx, id: RequestId, guardian: &Address) -> bool {
        let recorded = self.state.records.record_approval(id, guardian);
        if recorded {
            tx.record(Undo::Approval {
                id,
                guardian: guardian.clone(),
            });
        }
        recorded
    }

    pub(crate) fn credit_deposits(&mut self, amount: u128) -> Result<(), PoolError> {
        self.state.total_deposited = self
            .state
            .total_deposited
            .checked_add(amount)
            .ok_or(PoolError::Overflow)?;
        Ok(())
    }

    pub(crate) fn debit_deposits(&mut self, amount: u128) -> Result<(), PoolError> {
        self.state.total_deposited = self
            .state
            .total_deposited
            .checked_sub(amount)
            .ok_or(PoolError::Overflow)?;
        Ok(())
    }

    pub(crate) fn mint_shares(
        &mut self,
        tx: &mut Tx,
        holder: &Address,
        amount: u128,
    ) -> Result<(), PoolError> {
        self.shares.mint(holder, amount)?;
        tx.undo.push(Undo::Burn {
            holder: holder.clone(),
            amount,
        });
        Ok(())
    }

    pub(crate) fn burn_shares(
        &mut self,
        tx: &mut Tx,
        holder: &Address,
        amount: u128,
    ) -> Result<(), PoolError> {
        self.shares.burn(holder, amount)?;
        tx.undo.push(Undo::Mint {
            holder: holder.clone(),
            amount,
        });
        Ok(())
    }

    /// Take `amount` of `asset` from the caller into custody.
    ///
    /// Native intake must be matched exactly by the value attached to the call.
    pub(crate) fn pull(
        &mut self,
        tx: &mut Tx,
        call: &Call,
        asset: &AssetId,
        amount: u128,
    ) -> Result<(), PoolError> {
        if amount == 0 {
            return Ok(());
        }
        if asset.is_native() && call.value != amount {
            return Err(PoolError::ValueMismatch {
                attached: call.value,
                expected: amount,
            });
        }
        self.custody.pull(asset, &call.caller, amount)?;
        tx.undo.push(Undo::Refund {
            asset: asset.clone(),
            to: call.caller.clone(),
            amount,
        });
        Ok(())
    }

    /// Send `amount` of `asset` out of custody. Call only after all state
    /// changes of the operation are applied.
    pub(crate) fn push(&mut self, asset: &AssetId, to: &Address, amount: u128) -> Result<(), PoolError> {
        if amount == 0 {
            return Ok(());
        }
        self.custody.push(asset, to, amount)?;
        Ok(())
    }
}

/// `a * b / c`, truncating. `None` when `c == 0` or the result overflows.
///
/// Falls back to splitting `a` around `c` when the direct product overflows,
/// so large balances with a high fixed-point scale still divide exactly.
pub(crate) fn mul_div(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    if let Some(product) = a.checked_mul(b) {
        return Some(product / c);
    }
    let whole = (a / c).checked_mul(b)?;
    let part = (a % c).checked_mul(b)? / c;
    whole.checked_add(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_truncates() {
        assert_eq!(mul_div(7, 3, 2), Some(10));
        assert_eq!(mul_div(1, 1, 0), None);
    }

    #[test]
    fn mul_div_survives_large_intermediate_products() {
        let scale = 1_000_000_000_000_000_000u128;
        let amount = u128::MAX / 1_000;
        let shares = 4 * scale;
        // amount * scale overflows, the quotient does not
        assert_eq!(mul_div(amount, scale, shares), Some(amount / 4));
    }

    #[test]
    fn call_builder() {
        let call = Call::new("alice", Timestamp::new(5)).with_value(10);
        assert_eq!(call.caller, Address::new("alice"));
        assert_eq!(call.value, 10);
    }
}
