use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use anchor_core_types::{Address, TxError, TxHash, ValidatorId};
use anchor_sidechannel::SideMsg;

/// Route of the top-up module's side messages.
pub const TOPUP_ROUTE: &str = "topup";

/// A fee deposit observed on the staking contract of the external chain, to be credited to the
/// validator's signer once a supermajority has confirmed it.
#[derive(
    Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct MsgTopup {
    /// Account that relayed the deposit, paid `fee_per_tx` out of the credited amount
    pub from_address: Address,
    pub validator_id: ValidatorId,
    pub signer: Address,
    pub fee: u128,
    /// Hash of the external chain transaction that emitted the deposit event
    pub tx_hash: TxHash,
    pub log_index: u64,
    pub block_number: u64,
}

impl MsgTopup {
    /// Unique position of the deposit event on the external chain.
    pub fn sequence(&self, log_index_unit: u64) -> u128 {
        u128::from(self.block_number) * u128::from(log_index_unit) + u128::from(self.log_index)
    }
}

impl SideMsg for MsgTopup {
    fn route(&self) -> &str {
        TOPUP_ROUTE
    }

    fn side_sign_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(TxHash::LENGTH + 16);
        bytes.extend_from_slice(self.tx_hash.as_bytes());
        bytes.extend_from_slice(&self.log_index.to_be_bytes());
        bytes.extend_from_slice(&self.block_number.to_be_bytes());
        bytes
    }

    fn validate_basic(&self) -> Result<(), TxError> {
        if self.from_address.is_empty() {
            return Err(TxError::invalid_msg("Missing sender address"));
        }

        if self.validator_id.as_u64() == 0 {
            return Err(TxError::invalid_msg(format!(
                "Invalid validator id {}",
                self.validator_id
            )));
        }

        Ok(())
    }
}

/// Gives the top-up handlers access to the [`MsgTopup`] inside an application's message type.
pub trait AsTopup {
    fn as_topup(&self) -> Option<&MsgTopup>;
}

impl AsTopup for MsgTopup {
    fn as_topup(&self) -> Option<&MsgTopup> {
        Some(self)
    }
}
