//! Commons treasury pool.
//!
//! Members deposit a common asset and receive non-transferable shares priced
//! against the pool's running deposit total. Shares carry voting weight on
//! funding requests:
//!
//! - A request is created by anyone, voted on by members for a fixed window,
//!   then finalized against the quorum and approval thresholds.
//! - Large approved requests also need a strict majority of guardians before
//!   [`Pool::execute`] releases the money.
//! - Rewards in any asset are spread over shares with a cumulative
//!   reward-per-share accumulator.
//!
//! Every mutating operation is all-or-nothing and reports its outcome through
//! [`PoolEvent`]s.

pub mod config;
pub mod error;
pub mod event;
pub mod guard;
pub mod lifecycle;
pub mod member;
pub mod membership;
pub mod pool;
pub mod records;
pub mod request;
pub mod rewards;

pub use config::PoolConfig;
pub use error::{ErrorKind, PoolError};
pub use event::{EventBus, PoolEvent, SlashDisposition};
pub use guard::{ReentrancyGuard, SharedPool};
pub use member::{Member, MemberRegistry};
pub use pool::{Call, MemberShare, Pool, MAX_REQUEST_BPS};
pub use records::{ParticipationRecords, VoteReceipt};
pub use request::{Collateral, FundingRequest, NewRequest, RequestId, RequestKind, RequestStatus};
pub use rewards::{Credit, RewardDistributor, REWARD_PRECISION};
