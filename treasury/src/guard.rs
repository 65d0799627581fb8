//! Shared access to a pool with re-entry rejection.
//!
//! A `&mut Pool` cannot be re-entered. Once a pool is shared, though, a
//! collaborator called from inside an operation (custody during a payout, an
//! event listener) could hold a handle to the same pool and call back in.
//! [`SharedPool`] rejects such calls with [`PoolError::Reentrant`] instead of
//! deadlocking on its own lock. Calls from other threads queue on the lock.

use crate::error::PoolError;
use crate::pool::Pool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

type Owner = Mutex<Option<ThreadId>>;

fn owner_slot(owner: &Owner) -> MutexGuard<'_, Option<ThreadId>> {
    // a plain id cannot be left half-written by a panic
    owner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the current thread as the one inside the pool for as long as it
/// lives.
#[derive(Debug)]
pub struct ReentrancyGuard<'a> {
    owner: &'a Owner,
}

impl<'a> ReentrancyGuard<'a> {
    /// Fails if the current thread already holds a guard on `owner`.
    pub fn check(owner: &Owner) -> Result<(), PoolError> {
        if *owner_slot(owner) == Some(thread::current().id()) {
            return Err(PoolError::Reentrant);
        }
        Ok(())
    }

    /// Claim `owner` for the current thread. Call with the pool lock held.
    pub fn enter(owner: &'a Owner) -> Result<Self, PoolError> {
        let mut slot = owner_slot(owner);
        if slot.is_some() {
            return Err(PoolError::Reentrant);
        }
        *slot = Some(thread::current().id());
        Ok(Self { owner })
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        *owner_slot(self.owner) = None;
    }
}

/// Cloneable handle to one pool.
///
/// Accesses are serialised: a call from another thread waits for the one in
/// flight to finish. A call made by the thread already inside the pool fails
/// with [`PoolError::Reentrant`].
#[derive(Debug)]
pub struct SharedPool<L, X> {
    pool: Arc<Mutex<Pool<L, X>>>,
    owner: Arc<Owner>,
}

impl<L, X> Clone for SharedPool<L, X> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            owner: Arc::clone(&self.owner),
        }
    }
}

impl<L, X> SharedPool<L, X> {
    pub fn new(pool: Pool<L, X>) -> Self {
        Self {
            pool: Arc::new(Mutex::new(pool)),
            owner: Arc::new(Mutex::new(None)),
        }
    }

    /// Run `op` with exclusive access to the pool.
    pub fn with<T>(
        &self,
        op: impl FnOnce(&mut Pool<L, X>) -> Result<T, PoolError>,
    ) -> Result<T, PoolError> {
        ReentrancyGuard::check(&self.owner)?;
        let mut pool = self.pool.lock().map_err(|_| PoolError::Poisoned)?;
        let _guard = ReentrancyGuard::enter(&self.owner)?;
        op(&mut pool)
    }

    /// Read from the pool once any operation in flight has finished, so no
    /// partially-updated state is ever observed.
    pub fn read<T>(&self, view: impl FnOnce(&Pool<L, X>) -> T) -> Result<T, PoolError> {
        ReentrancyGuard::check(&self.owner)?;
        let pool = self.pool.lock().map_err(|_| PoolError::Poisoned)?;
        let _guard = ReentrancyGuard::enter(&self.owner)?;
        Ok(view(&pool))
    }

    /// Whether some thread is inside the pool right now.
    pub fn is_busy(&self) -> bool {
        owner_slot(&self.owner).is_some()
    }
}
