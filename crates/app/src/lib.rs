//! Host-facing wiring of the side-channel consensus engine and the validator-set engine.
//!
//! [`SideChannelApp`] is the single owner of the sealed side-message router, the transaction
//! codec and the active validator set. The host block-execution framework calls it once per
//! phase of every block:
//!
//! - `on_begin_block`: snapshot the validators that signed the last commit,
//! - `on_deliver_tx`: cache committed transactions carrying a side message,
//! - `on_deliver_side_tx`: evaluate a cached transaction to produce this validator's vote,
//! - `on_begin_side_block`: replay the transactions whose votes are complete,
//! - `on_end_block`: reconcile the validator set and rotate the proposer.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod app;
mod msg;
mod state;

pub mod logging;

pub use app::{EndBlockResponse, SideChannelApp};
pub use msg::{AppMsg, BorshCodec};
pub use state::{load_validator_set, save_validator_set, PersistedValidators};
