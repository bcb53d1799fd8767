//! Fee top-up module.
//!
//! A validator deposits fee tokens on the staking contract of the external chain. Anyone may
//! relay the deposit as a [`MsgTopup`]; validators check it against a confirmed receipt in the
//! side handler, and once a supermajority agrees the post handler credits the validator's
//! signer and pays the relayer. Each deposit event is credited at most once, keyed by its
//! sequence on the external chain.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod bank;
mod chain;
mod handler;
mod msg;
mod sequence;

pub use bank::{Account, Bank, KvBank, Permission, BANK_CODESPACE};
pub use chain::{ChainClient, ChainError, Log, Receipt, TopupEvent};
pub use handler::{
    topup_handlers, TopupParams, TopupPostHandler, TopupSideHandler, ValidatorLookup,
    DEFAULT_FEE_PER_TX, DEFAULT_LOG_INDEX_UNIT, DEFAULT_TX_CONFIRMATIONS, EVENT_TYPE_TOPUP,
    TOPUP_CODESPACE,
};
pub use msg::{AsTopup, MsgTopup, TOPUP_ROUTE};
pub use sequence::{has_topup_sequence, set_topup_sequence, topup_sequences};

use anchor_core_types::TxError;
use anchor_store::StoreError;

pub(crate) fn store_error(e: StoreError) -> TxError {
    TxError::internal(e.to_string())
}
