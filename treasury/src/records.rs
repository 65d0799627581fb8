//! Per-(request, participant) records.
//!
//! Vote receipts and guardian approvals live in flat maps keyed by
//! `(RequestId, Address)` rather than a map per request. The tallies they feed
//! are stored on the request itself.

use crate::request::RequestId;
use commons_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// A vote as cast: side and the share weight at the time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub support: bool,
    pub weight: u128,
}

#[derive(Clone, Debug, Default)]
pub struct ParticipationRecords {
    votes: BTreeMap<(RequestId, Address), VoteReceipt>,
    guardian_approvals: BTreeSet<(RequestId, Address)>,
}

impl ParticipationRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self, id: RequestId, voter: &Address) -> bool {
        self.votes.contains_key(&(id, voter.clone()))
    }

    pub fn vote(&self, id: RequestId, voter: &Address) -> Option<&VoteReceipt> {
        self.votes.get(&(id, voter.clone()))
    }

    /// Returns `false` if the voter already has a receipt for this request.
    pub fn record_vote(&mut self, id: RequestId, voter: &Address, receipt: VoteReceipt) -> bool {
        match self.votes.entry((id, voter.clone())) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(receipt);
                true
            }
        }
    }

    pub fn has_approved(&self, id: RequestId, guardian: &Address) -> bool {
        self.guardian_approvals.contains(&(id, guardian.clone()))
    }

    /// Returns `false` if the guardian already approved this request.
    pub fn record_approval(&mut self, id: RequestId, guardian: &Address) -> bool {
        self.guardian_approvals.insert((id, guardian.clone()))
    }

    pub(crate) fn forget_vote(&mut self, id: RequestId, voter: &Address) {
        self.votes.remove(&(id, voter.clone()));
    }

    pub(crate) fn forget_approval(&mut self, id: RequestId, guardian: &Address) {
        self.guardian_approvals.remove(&(id, guardian.clone()));
    }

    /// All votes cast on one request.
    pub fn votes_for(&self, id: RequestId) -> impl Iterator<Item = (&Address, &VoteReceipt)> {
        self.votes
            .range((id, Address::new(""))..)
            .take_while(move |((rid, _), _)| *rid == id)
            .map(|((_, voter), receipt)| (voter, receipt))
    }
}
