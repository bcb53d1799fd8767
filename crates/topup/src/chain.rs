use std::sync::Arc;

use anchor_core_types::{Address, TxHash, ValidatorId};

/// Receipt of an external chain transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn log(&self, index: u64) -> Option<&Log> {
        self.logs.iter().find(|log| log.index == index)
    }
}

/// A raw log entry of a [`Receipt`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    pub index: u64,
    pub emitter: Address,
    pub data: Vec<u8>,
}

/// The staking contract's fee top-up event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TopupEvent {
    pub validator_id: ValidatorId,
    pub signer: Address,
    pub fee: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("External chain unavailable: {0}")]
    Unavailable(String),

    #[error("No log at index {0}")]
    MissingLog(u64),

    #[error("Failed to decode top-up event: {0}")]
    Decode(String),
}

/// Read access to the external chain, as seen by the side handlers.
///
/// Implementations are expected to be deterministic for a given confirmed receipt: every
/// validator must reach the same verdict from the same chain state.
pub trait ChainClient: Send + Sync {
    /// Returns the receipt of `tx_hash` once it is at least `confirmations` blocks deep, or
    /// `None` while it is not.
    fn confirmed_receipt(
        &self,
        tx_hash: &TxHash,
        confirmations: u64,
    ) -> Result<Option<Receipt>, ChainError>;

    /// Decodes the top-up event at `log_index` of `receipt`.
    fn decode_topup_event(&self, receipt: &Receipt, log_index: u64)
        -> Result<TopupEvent, ChainError>;
}

impl<T> ChainClient for Arc<T>
where
    T: ChainClient + ?Sized,
{
    fn confirmed_receipt(
        &self,
        tx_hash: &TxHash,
        confirmations: u64,
    ) -> Result<Option<Receipt>, ChainError> {
        (**self).confirmed_receipt(tx_hash, confirmations)
    }

    fn decode_topup_event(
        &self,
        receipt: &Receipt,
        log_index: u64,
    ) -> Result<TopupEvent, ChainError> {
        (**self).decode_topup_event(receipt, log_index)
    }
}
