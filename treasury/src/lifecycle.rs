//! Funding request lifecycle: creation, voting, guardian escalation,
//! execution and settlement.

use crate::error::PoolError;
use crate::event::{PoolEvent, SlashDisposition};
use crate::pool::{Call, Pool, Tx, MAX_REQUEST_BPS};
use crate::records::VoteReceipt;
use crate::request::{Collateral, FundingRequest, NewRequest, RequestId, RequestStatus};
use crate::rewards::Credit;
use commons_governance::{EscalationStatus, VoteOutcome};
use commons_ledger::{AssetTransfer, ShareLedger};
use commons_types::BasisPoints;
use tracing::{debug, info};

impl<L: ShareLedger, X: AssetTransfer> Pool<L, X> {
    /// Open a funding request for a vote. Any caller may ask.
    ///
    /// The amount must fit in the available funds and in
    /// [`MAX_REQUEST_BPS`] of the pool. Collateral, if any, is taken into
    /// custody immediately; native collateral must be attached to the call.
    pub fn create_request(&mut self, call: &Call, params: NewRequest) -> Result<RequestId, PoolError> {
        self.transact("create_request", |pool, tx| {
            if params.amount == 0 {
                return Err(PoolError::ZeroAmount);
            }
            let available = pool.available_funds();
            if params.amount > available {
                return Err(PoolError::InsufficientAvailableFunds {
                    requested: params.amount,
                    available,
                });
            }
            let cap = BasisPoints::from_raw_unchecked(MAX_REQUEST_BPS)
                .apply(pool.state.total_deposited)
                .ok_or(PoolError::Overflow)?;
            if params.amount > cap {
                return Err(PoolError::ExceedsConcentrationCap {
                    requested: params.amount,
                    cap,
                });
            }
            if params.kind.requires_collateral() && params.effective_collateral().is_none() {
                return Err(PoolError::MissingCollateral { kind: params.kind });
            }

            let id = RequestId::new(pool.state.requests.len() as u64);
            let request = FundingRequest::open(
                id,
                call.caller.clone(),
                params,
                call.now,
                pool.config.voting_period_secs,
            );
            tx.emit(PoolEvent::RequestCreated {
                id,
                requester: request.requester.clone(),
                amount: request.amount,
                kind: request.kind,
                voting_ends_at: request.voting_ends_at,
            });
            let collateral = request.collateral.clone();
            info!(%id, requester = %call.caller, amount = request.amount, kind = %request.kind, "request created");
            pool.push_request(tx, request);

            if let Some(Collateral { asset, amount }) = collateral {
                tx.emit(PoolEvent::CollateralLocked {
                    id,
                    asset: asset.clone(),
                    amount,
                });
                pool.pull(tx, call, &asset, amount)?;
            }
            Ok(id)
        })
    }

    /// Cast a share-weighted vote. Weight is the caller's live balance.
    pub fn vote(&mut self, call: &Call, id: RequestId, support: bool) -> Result<(), PoolError> {
        self.transact("vote", |pool, tx| {
            pool.require_active(&call.caller)?;
            let weight = pool.shares.balance_of(&call.caller);
            if pool.state.records.has_voted(id, &call.caller) {
                return Err(PoolError::AlreadyVoted {
                    id,
                    voter: call.caller.clone(),
                });
            }
            let request = pool.request_in(tx, id, RequestStatus::Voting)?;
            if !request.voting_open(call.now) {
                return Err(PoolError::VotingClosed(id));
            }
            request
                .tally
                .record(support, weight)
                .map_err(|e| PoolError::from_governance(id, e))?;

            pool.record_vote(tx, id, &call.caller, VoteReceipt { support, weight });
            tx.emit(PoolEvent::VoteCast {
                id,
                voter: call.caller.clone(),
                support,
                weight,
            });
            debug!(%id, voter = %call.caller, support, weight, "vote cast");
            Ok(())
        })
    }

    /// Close the vote once the window has passed. Anyone may call.
    ///
    /// An approved request earmarks its amount in the pending-funding total.
    /// A rejected one returns its collateral. Approval fails with
    /// `InsufficientAvailableFunds` if withdrawals since creation left too
    /// little unearmarked money; the request stays in voting and may be
    /// finalized again later or cancelled.
    pub fn finalize(&mut self, call: &Call, id: RequestId) -> Result<RequestStatus, PoolError> {
        self.transact("finalize", |pool, tx| {
            let total_shares = pool.shares.total_supply();
            let available = pool.available_funds();
            let voting = pool.voting;
            let request = pool.request_in(tx, id, RequestStatus::Voting)?;
            if call.now < request.voting_ends_at {
                return Err(PoolError::VotingStillOpen(id));
            }

            let outcome = voting.evaluate(&request.tally, total_shares);
            let tally = request.tally;
            let amount = request.amount;
            let approved = outcome.is_approved();
            if approved {
                if amount > available {
                    return Err(PoolError::InsufficientAvailableFunds {
                        requested: amount,
                        available,
                    });
                }
                request.status = RequestStatus::Approved;
                pool.state.total_pending = pool
                    .state
                    .total_pending
                    .checked_add(amount)
                    .ok_or(PoolError::Overflow)?;
            } else {
                request.status = RequestStatus::Rejected;
            }
            tx.emit(PoolEvent::RequestFinalized {
                id,
                approved,
                yes: tally.yes,
                no: tally.no,
            });
            match outcome {
                VoteOutcome::Approved => info!(%id, yes = tally.yes, no = tally.no, "request approved"),
                other => info!(%id, yes = tally.yes, no = tally.no, outcome = ?other, "request rejected"),
            }

            if approved {
                Ok(RequestStatus::Approved)
            } else {
                pool.return_collateral(tx, id)?;
                Ok(RequestStatus::Rejected)
            }
        })
    }

    /// Record a guardian's approval of an approved request. Returns the
    /// approval count so far.
    pub fn guardian_approve(&mut self, call: &Call, id: RequestId) -> Result<u32, PoolError> {
        self.transact("guardian_approve", |pool, tx| {
            pool.require_guardian(&call.caller)?;
            let request = pool.request_in(tx, id, RequestStatus::Approved)?;
            let approvals = request
                .guardian_approvals
                .checked_add(1)
                .ok_or(PoolError::Overflow)?;
            request.guardian_approvals = approvals;
            if !pool.record_approval(tx, id, &call.caller) {
                return Err(PoolError::AlreadyApproved {
                    id,
                    guardian: call.caller.clone(),
                });
            }
            tx.emit(PoolEvent::GuardianApproved {
                id,
                guardian: call.caller.clone(),
                approvals,
            });
            info!(%id, guardian = %call.caller, approvals, "guardian approved");
            Ok(approvals)
        })
    }

    /// Pay out an approved request.
    ///
    /// Requests of at least the guardian threshold of the pool need a strict
    /// majority of active guardians first.
    pub fn execute(&mut self, call: &Call, id: RequestId) -> Result<(), PoolError> {
        self.transact("execute", |pool, tx| {
            let total_pooled = pool.state.total_deposited;
            let active_guardians =
                u32::try_from(pool.state.registry.active_guardian_count()).unwrap_or(u32::MAX);
            let escalation = pool.escalation;
            let request = pool.request_in(tx, id, RequestStatus::Approved)?;
            let status = escalation
                .authorize(
                    request.amount,
                    total_pooled,
                    request.guardian_approvals,
                    active_guardians,
                )
                .map_err(|e| PoolError::from_governance(id, e))?;
            if let EscalationStatus::Satisfied {
                approvals,
                required,
            } = status
            {
                debug!(%id, approvals, required, "guardian escalation satisfied");
            }

            request.status = RequestStatus::Funded;
            request.funded_at = Some(call.now);
            let amount = request.amount;
            let requester = request.requester.clone();

            pool.state.total_pending = pool
                .state
                .total_pending
                .checked_sub(amount)
                .ok_or(PoolError::Overflow)?;
            pool.debit_deposits(amount)?;
            tx.emit(PoolEvent::RequestExecuted {
                id,
                requester: requester.clone(),
                amount,
            });

            let asset = pool.config.reference_asset.clone();
            pool.push(&asset, &requester, amount)?;
            info!(%id, requester = %requester, amount, "request executed");
            Ok(())
        })
    }

    /// Pay back part of a funded request in the reference asset. Returns what
    /// is still outstanding.
    ///
    /// Repayment is credited to the pool's deposits, raising the value of
    /// every share. The total repaid can never exceed principal plus the
    /// expected reward.
    pub fn repay(&mut self, call: &Call, id: RequestId, amount: u128) -> Result<u128, PoolError> {
        self.transact("repay", |pool, tx| {
            let request = pool.request_in(tx, id, RequestStatus::Funded)?;
            if request.requester != call.caller {
                return Err(PoolError::NotRequester {
                    id,
                    caller: call.caller.clone(),
                });
            }
            if amount == 0 {
                return Err(PoolError::ZeroAmount);
            }
            let due = request.amount_due().ok_or(PoolError::Overflow)?;
            let outstanding = due.saturating_sub(request.repaid);
            if amount > outstanding {
                return Err(PoolError::OverRepayment {
                    amount,
                    outstanding,
                });
            }
            request.repaid += amount;
            let total_repaid = request.repaid;
            pool.credit_deposits(amount)?;
            tx.emit(PoolEvent::RequestRepaid {
                id,
                amount,
                total_repaid,
            });

            let asset = pool.config.reference_asset.clone();
            pool.pull(tx, call, &asset, amount)?;
            info!(%id, amount, total_repaid, "request repaid");
            Ok(outstanding - amount)
        })
    }

    /// Close a funded request as settled and release its collateral.
    pub fn complete_request(&mut self, call: &Call, id: RequestId) -> Result<(), PoolError> {
        self.transact("complete_request", |pool, tx| {
            pool.require_guardian(&call.caller)?;
            let request = pool.request_in(tx, id, RequestStatus::Funded)?;
            request.status = RequestStatus::Completed;
            tx.emit(PoolEvent::RequestCompleted { id });
            info!(%id, guardian = %call.caller, "request completed");
            pool.return_collateral(tx, id)
        })
    }

    /// Mark a funded request defaulted once its term has run out, and slash
    /// its collateral into the pool.
    ///
    /// Collateral in the reference asset is added to the pool's deposits.
    /// Any other asset is credited to that asset's reward accumulator, or
    /// held in escrow while no shares are outstanding.
    pub fn mark_defaulted(&mut self, call: &Call, id: RequestId) -> Result<(), PoolError> {
        self.transact("mark_defaulted", |pool, tx| {
            let request = pool.request_in(tx, id, RequestStatus::Funded)?;
            let ends_at = request.term_ends_at().ok_or(PoolError::Overflow)?;
            if call.now < ends_at {
                return Err(PoolError::TermNotElapsed {
                    id,
                    ends_at: ends_at.as_secs(),
                });
            }
            request.status = RequestStatus::Defaulted;
            let collateral = request.collateral.clone();
            tx.emit(PoolEvent::RequestDefaulted { id });
            info!(%id, "request defaulted");

            if let Some(Collateral { asset, amount }) = collateral {
                let disposition = if asset == pool.config.reference_asset {
                    pool.credit_deposits(amount)?;
                    SlashDisposition::Treasury
                } else {
                    let total_shares = pool.shares.total_supply();
                    match pool.credit_rewards(tx, &asset, amount, total_shares)? {
                        Credit::Distributed {
                            amount,
                            cumulative_per_share,
                        } => {
                            tx.emit(PoolEvent::RewardsDistributed {
                                asset: asset.clone(),
                                amount,
                                cumulative_per_share,
                            });
                            SlashDisposition::Rewards
                        }
                        Credit::Escrowed { amount } => {
                            tx.emit(PoolEvent::RewardsEscrowed {
                                asset: asset.clone(),
                                amount,
                            });
                            SlashDisposition::Escrowed
                        }
                    }
                };
                tx.emit(PoolEvent::CollateralSlashed {
                    id,
                    asset,
                    amount,
                    disposition,
                });
                debug!(%id, amount, ?disposition, "collateral slashed");
            }
            Ok(())
        })
    }

    /// Withdraw a request still in voting. Requester only.
    pub fn cancel_request(&mut self, call: &Call, id: RequestId) -> Result<(), PoolError> {
        self.transact("cancel_request", |pool, tx| {
            let request = pool.request_in(tx, id, RequestStatus::Voting)?;
            if request.requester != call.caller {
                return Err(PoolError::NotRequester {
                    id,
                    caller: call.caller.clone(),
                });
            }
            request.status = RequestStatus::Cancelled;
            tx.emit(PoolEvent::RequestCancelled { id });
            info!(%id, "request cancelled");
            pool.return_collateral(tx, id)
        })
    }

    /// Send a request's collateral back to its requester. Must be the last
    /// step of an operation.
    fn return_collateral(&mut self, tx: &mut Tx, id: RequestId) -> Result<(), PoolError> {
        let request = self.request_at(id)?;
        let Some(Collateral { asset, amount }) = request.collateral.clone() else {
            return Ok(());
        };
        let to = request.requester.clone();
        tx.emit(PoolEvent::CollateralReturned {
            id,
            to: to.clone(),
            asset: asset.clone(),
            amount,
        });
        self.push(&asset, &to, amount)
    }
}
