use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{Address, TxHash};

/// The vote a validator casts on a side transaction, and the tallied outcome of those votes.
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
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[borsh(use_discriminant = true)]
#[serde(rename_all = "lowercase")]
pub enum SideTxResult {
    /// Not enough information to decide, or no supermajority
    #[default]
    Skip = 0,
    /// The external fact holds
    Yes = 1,
    /// The external fact does not hold
    No = 2,
}

impl SideTxResult {
    /// Swaps `Yes` and `No`, leaving `Skip` untouched.
    pub const fn invert(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
            Self::Skip => Self::Skip,
        }
    }
}

impl fmt::Display for SideTxResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
        }
    }
}

/// A single validator's signed response to a side transaction, as collected by the host engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideVote {
    pub tx_hash: TxHash,
    pub voter: Address,
    pub result: SideTxResult,
}

impl SideVote {
    pub const fn new(tx_hash: TxHash, voter: Address, result: SideTxResult) -> Self {
        Self {
            tx_hash,
            voter,
            result,
        }
    }
}
