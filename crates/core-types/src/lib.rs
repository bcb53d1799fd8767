//! Core data types shared by the side-channel consensus engine and the validator-set engine.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    variant_size_differences
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod address;
mod code;
mod event;
mod hash;
mod height;
mod pub_key;
mod side_tx;

pub use address::Address;
pub use code::{CodeType, TxError, DEFAULT_CODESPACE};
pub use event::{Attribute, Event};
pub use hash::TxHash;
pub use height::Height;
pub use pub_key::{PubKey, PubKeyError};
pub use side_tx::{SideTxResult, SideVote};

/// Stake-derived weight of a validator.
///
/// Signed so that proposer priorities and voting power share the same arithmetic.
pub type VotingPower = i64;

/// Identifier of a validator on the external chain's staking contract.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    borsh::BorshSerialize,
    borsh::BorshDeserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct ValidatorId(u64);

impl ValidatorId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
