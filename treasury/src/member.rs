//! Member, whitelist and guardian registries.

use commons_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A participant known to the pool.
///
/// A member is `active` exactly when they hold shares. Guardians can be
/// registered before ever depositing (`active == false`, `joined_at == None`)
/// and become full members by depositing later.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub active: bool,
    pub guardian: bool,
    /// Time of first activation.
    pub joined_at: Option<Timestamp>,
}

/// What a change to one address can touch, captured before the change.
#[derive(Clone, Debug)]
pub(crate) struct RegistryMark {
    address: Address,
    member: Option<Member>,
    whitelisted: bool,
    member_count: usize,
    guardian_count: usize,
}

/// Pool-owned registries keyed by external identity.
///
/// `member_list` and `guardian_list` are append-only enumerations. Removing a
/// guardian only clears the flag and leaves the list entry in place; counts
/// are always recomputed by filtering on the flags.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemberRegistry {
    members: HashMap<Address, Member>,
    whitelist: HashSet<Address>,
    member_list: Vec<Address>,
    guardian_list: Vec<Address>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &Address) -> Option<&Member> {
        self.members.get(address)
    }

    pub fn is_whitelisted(&self, address: &Address) -> bool {
        self.whitelist.contains(address)
    }

    pub fn is_active(&self, address: &Address) -> bool {
        self.members.get(address).is_some_and(|m| m.active)
    }

    pub fn is_guardian(&self, address: &Address) -> bool {
        self.members.get(address).is_some_and(|m| m.guardian)
    }

    /// Returns `false` if the address was already whitelisted.
    pub fn whitelist(&mut self, address: &Address) -> bool {
        self.whitelist.insert(address.clone())
    }

    /// Mark a depositor active. Returns `true` if they were not active before.
    pub fn activate(&mut self, address: &Address, now: Timestamp) -> bool {
        let member = self.members.entry(address.clone()).or_default();
        if member.active {
            return false;
        }
        member.active = true;
        if member.joined_at.is_none() {
            member.joined_at = Some(now);
            self.member_list.push(address.clone());
        }
        true
    }

    /// Mark a member inactive after their last share is redeemed.
    pub fn deactivate(&mut self, address: &Address) {
        if let Some(member) = self.members.get_mut(address) {
            member.active = false;
        }
    }

    /// Returns `false` if the address is already an active guardian.
    pub fn add_guardian(&mut self, address: &Address) -> bool {
        let member = self.members.entry(address.clone()).or_default();
        if member.guardian {
            return false;
        }
        member.guardian = true;
        if !self.guardian_list.contains(address) {
            self.guardian_list.push(address.clone());
        }
        true
    }

    /// Returns `false` if the address was not a guardian.
    pub fn remove_guardian(&mut self, address: &Address) -> bool {
        match self.members.get_mut(address) {
            Some(member) if member.guardian => {
                member.guardian = false;
                true
            }
            _ => false,
        }
    }

    pub fn active_member_count(&self) -> usize {
        self.members.values().filter(|m| m.active).count()
    }

    pub fn active_guardian_count(&self) -> usize {
        self.guardian_list
            .iter()
            .filter(|g| self.is_guardian(g))
            .count()
    }

    /// Every address that has ever been an active member, in join order.
    pub fn members(&self) -> &[Address] {
        &self.member_list
    }

    /// Every address ever registered as guardian, including removed ones.
    pub fn guardians(&self) -> &[Address] {
        &self.guardian_list
    }

    pub(crate) fn mark(&self, address: &Address) -> RegistryMark {
        RegistryMark {
            address: address.clone(),
            member: self.members.get(address).cloned(),
            whitelisted: self.whitelist.contains(address),
            member_count: self.member_list.len(),
            guardian_count: self.guardian_list.len(),
        }
    }

    /// Put one address back the way [`MemberRegistry::mark`] saw it.
    pub(crate) fn restore(&mut self, mark: RegistryMark) {
        match mark.member {
            Some(member) => {
                self.members.insert(mark.address.clone(), member);
            }
            None => {
                self.members.remove(&mark.address);
            }
        }
        if mark.whitelisted {
            self.whitelist.insert(mark.address);
        } else {
            self.whitelist.remove(&mark.address);
        }
        self.member_list.truncate(mark.member_count);
        self.guardian_list.truncate(mark.guardian_count);
    }
}
