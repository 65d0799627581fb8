//! Events emitted by pool operations for external observers.

use crate::request::{RequestId, RequestKind};
use commons_types::{Address, AssetId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where slashed collateral ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashDisposition {
    /// Credited to the pool's deposits (collateral in the reference asset).
    Treasury,
    /// Credited to the reward accumulator of the collateral asset.
    Rewards,
    /// Held in reward escrow because no shares were outstanding.
    Escrowed,
}

/// Every state transition of the pool, with enough detail to rebuild its state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    Whitelisted {
        member: Address,
    },
    GuardianAdded {
        guardian: Address,
    },
    GuardianRemoved {
        guardian: Address,
    },
    PoolToggled {
        open: bool,
    },
    Deposited {
        member: Address,
        amount: u128,
        shares: u128,
    },
    Withdrawn {
        member: Address,
        shares: u128,
        amount: u128,
    },
    RequestCreated {
        id: RequestId,
        requester: Address,
        amount: u128,
        kind: RequestKind,
        voting_ends_at: Timestamp,
    },
    CollateralLocked {
        id: RequestId,
        asset: AssetId,
        amount: u128,
    },
    VoteCast {
        id: RequestId,
        voter: Address,
        support: bool,
        weight: u128,
    },
    RequestFinalized {
        id: RequestId,
        approved: bool,
        yes: u128,
        no: u128,
    },
    GuardianApproved {
        id: RequestId,
        guardian: Address,
        approvals: u32,
    },
    RequestExecuted {
        id: RequestId,
        requester: Address,
        amount: u128,
    },
    RequestRepaid {
        id: RequestId,
        amount: u128,
        total_repaid: u128,
    },
    RequestCompleted {
        id: RequestId,
    },
    RequestDefaulted {
        id: RequestId,
    },
    RequestCancelled {
        id: RequestId,
    },
    CollateralReturned {
        id: RequestId,
        to: Address,
        asset: AssetId,
        amount: u128,
    },
    CollateralSlashed {
        id: RequestId,
        asset: AssetId,
        amount: u128,
        disposition: SlashDisposition,
    },
    RewardsDistributed {
        asset: AssetId,
        amount: u128,
        cumulative_per_share: u128,
    },
    RewardsEscrowed {
        asset: AssetId,
        amount: u128,
    },
    RewardsClaimed {
        member: Address,
        asset: AssetId,
        amount: u128,
    },
}

type Listener = Box<dyn Fn(&PoolEvent) + Send + Sync>;

/// Synchronous fan-out event bus with an append-only history.
///
/// Listeners are invoked inline when an operation commits; keep handlers fast.
/// Events from a failed operation are never delivered.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    history: Vec<PoolEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: PoolEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
        self.history.push(event);
    }

    /// Every event emitted so far, oldest first.
    pub fn history(&self) -> &[PoolEvent] {
        &self.history
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("history", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn listeners_see_every_event_in_order() {
        let mut bus = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        bus.subscribe(Box::new(move |_: &PoolEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        bus.emit(PoolEvent::PoolToggled { open: false });
        bus.emit(PoolEvent::PoolToggled { open: true });

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(
            bus.history().last(),
            Some(&PoolEvent::PoolToggled { open: true })
        );
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = PoolEvent::Whitelisted {
            member: Address::new("alice"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"whitelisted","member":"alice"}"#);
    }
}
