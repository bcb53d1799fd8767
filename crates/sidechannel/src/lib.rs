//! Side-channel transaction consensus.
//!
//! Transactions carrying a side message are cached when they commit at height `H`. Validators
//! then evaluate the external fact behind each of them with the registered side handler and
//! circulate signed votes. When height `H + delay` begins, the [`SideTxCoordinator`] tallies the
//! votes against the validator snapshot of `H`, runs the post handler under the outcome inside
//! a rollback-capable scope, and evicts every cached transaction exactly once.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod codec;
mod context;
mod coordinator;
mod handler;
mod metrics;
mod router;
mod store;
mod tally;

pub use codec::{Codec, SideMsg};
pub use context::Context;
pub use coordinator::{SideTxCoordinator, SideVotes, DEFAULT_SIDE_TX_DELAY};
pub use handler::{PostTxHandler, SideHandlers, SideTxHandler, SideTxResponse};
pub use metrics::SideChannelMetrics;
pub use router::{RouterError, SideRouter};
pub use store::{CachedSideTx, SideTxStore, ValidatorPower, ValidatorSnapshot};
pub use tally::{is_supermajority, tally, VoteTally};
