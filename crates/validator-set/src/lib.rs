//! The active validator set and its evolution.
//!
//! [`ValidatorSet`] keeps validators in canonical address order, caches the total voting power
//! and the current proposer, and rotates the proposer in proportion to stake. [`compute_change_set`]
//! derives the minimal [`ChangeSet`] between the active set and the full roster for a given
//! acknowledgement count, which [`ValidatorSet::apply_change_set`] folds in atomically.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod change_set;
mod error;
mod set;
mod validator;

pub use change_set::{compute_change_set, ChangeSet, ValidatorChange};
pub use error::ValidatorSetError;
pub use set::{ValidatorSet, MAX_TOTAL_VOTING_POWER, PRIORITY_WINDOW_SIZE_FACTOR};
pub use validator::Validator;
