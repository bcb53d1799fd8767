mod persistence;
mod snapshots;
mod topup;
mod validator_set;

use anchor_core_types::{Address, TxHash, ValidatorId};
use anchor_topup::MsgTopup;

pub const FEE_PER_TX: u128 = 1_000_000_000_000_000;

pub const RELAYER: Address = Address::new([0xaa; 20]);
pub const SIGNER: Address = Address::new([0xbb; 20]);

/// A deposit of five relay fees, from a validator id the genesis set does not know by default.
pub fn deposit(validator_id: u64) -> MsgTopup {
    MsgTopup {
        from_address: RELAYER,
        validator_id: ValidatorId::new(validator_id),
        signer: SIGNER,
        fee: 5 * FEE_PER_TX,
        tx_hash: TxHash::new([0xde; 32]),
        log_index: 3,
        block_number: 12_000,
    }
}
