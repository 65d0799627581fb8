//! Admin registry operations, deposits and withdrawals.

use crate::error::PoolError;
use crate::event::PoolEvent;
use crate::pool::{mul_div, Call, Pool, Tx};
use commons_ledger::{AssetTransfer, ShareLedger};
use commons_types::{Address, TypesError};
use tracing::{debug, info};

impl<L: ShareLedger, X: AssetTransfer> Pool<L, X> {
    // ── Admin ──────────────────────────────────────────────────────────

    /// Allow `address` to deposit. Returns `false` if it already could.
    pub fn whitelist(&mut self, call: &Call, address: &Address) -> Result<bool, PoolError> {
        self.transact("whitelist", |pool, tx| {
            pool.require_admin(&call.caller)?;
            pool.whitelist_one(tx, address)
        })
    }

    /// Whitelist many addresses at once. Returns how many were new.
    pub fn batch_whitelist(
        &mut self,
        call: &Call,
        addresses: &[Address],
    ) -> Result<usize, PoolError> {
        self.transact("batch_whitelist", |pool, tx| {
            pool.require_admin(&call.caller)?;
            let mut added = 0;
            for address in addresses {
                if pool.whitelist_one(tx, address)? {
                    added += 1;
                }
            }
            info!(added, total = addresses.len(), "batch whitelisted");
            Ok(added)
        })
    }

    fn whitelist_one(&mut self, tx: &mut Tx, address: &Address) -> Result<bool, PoolError> {
        if !address.is_valid() {
            return Err(TypesError::InvalidAddress(address.to_string()).into());
        }
        let added = self.registry_mut(tx, address).whitelist(address);
        if added {
            tx.emit(PoolEvent::Whitelisted {
                member: address.clone(),
            });
        }
        Ok(added)
    }

    pub fn add_guardian(&mut self, call: &Call, address: &Address) -> Result<(), PoolError> {
        self.transact("add_guardian", |pool, tx| {
            pool.require_admin(&call.caller)?;
            if !address.is_valid() {
                return Err(TypesError::InvalidAddress(address.to_string()).into());
            }
            if !pool.registry_mut(tx, address).add_guardian(address) {
                return Err(PoolError::AlreadyGuardian(address.clone()));
            }
            tx.emit(PoolEvent::GuardianAdded {
                guardian: address.clone(),
            });
            info!(guardian = %address, "guardian added");
            Ok(())
        })
    }

    /// Clear the guardian flag. The address stays in [`Pool::guardians`].
    pub fn remove_guardian(&mut self, call: &Call, address: &Address) -> Result<(), PoolError> {
        self.transact("remove_guardian", |pool, tx| {
            pool.require_admin(&call.caller)?;
            if !pool.registry_mut(tx, address).remove_guardian(address) {
                return Err(PoolError::NotGuardian(address.clone()));
            }
            tx.emit(PoolEvent::GuardianRemoved {
                guardian: address.clone(),
            });
            info!(guardian = %address, "guardian removed");
            Ok(())
        })
    }

    /// Open or close the pool to deposits. Returns the new state.
    pub fn toggle_open(&mut self, call: &Call) -> Result<bool, PoolError> {
        self.transact("toggle_open", |pool, tx| {
            pool.require_admin(&call.caller)?;
            pool.state.open = !pool.state.open;
            tx.emit(PoolEvent::PoolToggled {
                open: pool.state.open,
            });
            Ok(pool.state.open)
        })
    }

    // ── Treasury ───────────────────────────────────────────────────────

    /// Deposit into the pool and receive shares. Returns the shares minted.
    ///
    /// Native pools take the value attached to the call and ignore `amount`.
    /// Shares are priced against `total_deposited`, never the custody balance,
    /// so rewards and collateral held by the pool do not move the price.
    pub fn deposit(&mut self, call: &Call, amount: u128) -> Result<u128, PoolError> {
        self.transact("deposit", |pool, tx| {
            if !pool.state.open {
                return Err(PoolError::PoolClosed);
            }
            if !pool.state.registry.is_whitelisted(&call.caller) {
                return Err(PoolError::NotWhitelisted(call.caller.clone()));
            }
            let asset = pool.config.reference_asset.clone();
            let received = if asset.is_native() { call.value } else { amount };
            if received == 0 {
                return Err(PoolError::ZeroAmount);
            }
            let minimum = u128::from(pool.config.min_deposit);
            if received < minimum {
                return Err(PoolError::BelowMinimumDeposit {
                    amount: received,
                    minimum,
                });
            }

            let total_shares = pool.shares.total_supply();
            let minted = if total_shares == 0 {
                received
            } else {
                mul_div(received, total_shares, pool.state.total_deposited)
                    .ok_or(PoolError::Overflow)?
            };
            if minted == 0 {
                return Err(PoolError::DepositTooSmall(received));
            }

            pool.credit_deposits(received)?;
            if pool.registry_mut(tx, &call.caller).activate(&call.caller, call.now) {
                debug!(member = %call.caller, "member activated");
            }
            tx.emit(PoolEvent::Deposited {
                member: call.caller.clone(),
                amount: received,
                shares: minted,
            });

            pool.pull(tx, call, &asset, received)?;
            pool.mint_shares(tx, &call.caller, minted)?;
            info!(member = %call.caller, amount = received, shares = minted, "deposit");
            Ok(minted)
        })
    }

    /// Redeem `shares` for their slice of the available funds. Returns the
    /// amount paid out.
    ///
    /// Shares are burned before the payout is sent. A member left with no
    /// shares becomes inactive.
    pub fn withdraw(&mut self, call: &Call, shares: u128) -> Result<u128, PoolError> {
        self.transact("withdraw", |pool, tx| {
            pool.require_active(&call.caller)?;
            if shares == 0 {
                return Err(PoolError::ZeroAmount);
            }
            let balance = pool.shares.balance_of(&call.caller);
            if balance < shares {
                return Err(PoolError::InsufficientShares {
                    requested: shares,
                    balance,
                });
            }

            let available = pool.available_funds();
            let amount = mul_div(shares, available, pool.shares.total_supply())
                .ok_or(PoolError::Overflow)?;
            if amount > available {
                return Err(PoolError::RedemptionExceedsAvailable { amount, available });
            }

            pool.burn_shares(tx, &call.caller, shares)?;
            pool.debit_deposits(amount)?;
            if balance == shares {
                pool.registry_mut(tx, &call.caller).deactivate(&call.caller);
                debug!(member = %call.caller, "member deactivated");
            }
            tx.emit(PoolEvent::Withdrawn {
                member: call.caller.clone(),
                shares,
                amount,
            });

            let asset = pool.config.reference_asset.clone();
            pool.push(&asset, &call.caller, amount)?;
            info!(member = %call.caller, shares, amount, "withdraw");
            Ok(amount)
        })
    }
}
