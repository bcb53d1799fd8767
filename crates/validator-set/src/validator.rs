use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use anchor_core_types::{Address, PubKey, ValidatorId, VotingPower};

/// A validator as tracked by the staking module.
///
/// `start_epoch` and `end_epoch` bound the validator's activity in acknowledgement-count units;
/// an `end_epoch` of zero means no exit has been scheduled.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Validator {
    pub id: ValidatorId,
    pub address: Address,
    pub pub_key: PubKey,
    pub voting_power: VotingPower,
    pub proposer_priority: i64,
    pub start_epoch: u64,
    pub end_epoch: u64,
    pub jailed: bool,
}

impl Validator {
    /// Creates a validator active from epoch zero with no scheduled exit.
    pub fn new(id: ValidatorId, pub_key: PubKey, voting_power: VotingPower) -> Self {
        Self {
            id,
            address: pub_key.address(),
            pub_key,
            voting_power,
            proposer_priority: 0,
            start_epoch: 0,
            end_epoch: 0,
            jailed: false,
        }
    }

    pub fn with_epochs(mut self, start_epoch: u64, end_epoch: u64) -> Self {
        self.start_epoch = start_epoch;
        self.end_epoch = end_epoch;
        self
    }

    pub fn with_jailed(mut self, jailed: bool) -> Self {
        self.jailed = jailed;
        self
    }

    /// Whether the validator belongs in the active set at the given acknowledgement count.
    pub fn is_current(&self, ack_count: u64) -> bool {
        !self.jailed
            && self.voting_power > 0
            && self.start_epoch <= ack_count
            && (self.end_epoch == 0 || ack_count < self.end_epoch)
    }
}
