use borsh::{BorshDeserialize, BorshSerialize};

use anchor_core_types::{Address, Height, TxHash, VotingPower};
use anchor_store::{KvStore, StoreError};
use anchor_validator_set::ValidatorSet;

const SIDE_TX_PREFIX: &[u8] = b"sidetx/";
const SNAPSHOT_PREFIX: &[u8] = b"sidetx-validators/";

/// A committed transaction awaiting side-channel voting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedSideTx {
    pub height: Height,
    pub tx_hash: TxHash,
    pub raw: Vec<u8>,
}

/// A validator's voting power at the height its snapshot was taken.
#[derive(Copy, Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ValidatorPower {
    pub address: Address,
    pub voting_power: VotingPower,
}

/// The roster eligible to vote on the transactions of one height.
///
/// Entries are unique by address and sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ValidatorSnapshot(Vec<ValidatorPower>);

impl ValidatorSnapshot {
    /// Sorts `validators` by address. Of repeated addresses, the first entry is kept.
    pub fn new(mut validators: Vec<ValidatorPower>) -> Self {
        validators.sort_by(|a, b| a.address.cmp(&b.address));
        validators.dedup_by(|later, earlier| later.address == earlier.address);
        Self(validators)
    }

    pub fn from_set(set: &ValidatorSet) -> Self {
        Self(
            set.iter()
                .map(|v| ValidatorPower {
                    address: v.address,
                    voting_power: v.voting_power,
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidatorPower> {
        self.0.iter()
    }

    pub fn power_of(&self, address: &Address) -> Option<VotingPower> {
        self.0
            .binary_search_by(|v| v.address.cmp(address))
            .ok()
            .and_then(|index| self.0.get(index))
            .map(|v| v.voting_power)
    }

    /// Sum of the voting power of all entries, in `i128` so that it cannot overflow.
    pub fn total_voting_power(&self) -> i128 {
        self.0.iter().map(|v| i128::from(v.voting_power)).sum()
    }
}

fn height_prefix(height: Height) -> Vec<u8> {
    let mut key = Vec::with_capacity(SIDE_TX_PREFIX.len() + 9);
    key.extend_from_slice(SIDE_TX_PREFIX);
    key.extend_from_slice(&height.to_be_bytes());
    key.push(b'/');
    key
}

fn side_tx_key(height: Height, tx_hash: &TxHash) -> Vec<u8> {
    let mut key = height_prefix(height);
    key.extend_from_slice(tx_hash.as_bytes());
    key
}

fn snapshot_key(height: Height) -> Vec<u8> {
    let mut key = SNAPSHOT_PREFIX.to_vec();
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// Height-scoped cache of side transactions and validator snapshots, over any [`KvStore`].
pub trait SideTxStore: KvStore {
    /// Caches `raw` at `height`, keyed by its hash.
    fn store_side_tx(&mut self, height: Height, raw: &[u8]) -> Result<TxHash, StoreError> {
        let tx_hash = TxHash::digest(raw);
        self.set(&side_tx_key(height, &tx_hash), raw)?;
        Ok(tx_hash)
    }

    /// All transactions cached at `height`, in store order.
    fn get_side_txs(&self, height: Height) -> Result<Vec<CachedSideTx>, StoreError> {
        let txs = self
            .scan_prefix(&height_prefix(height))?
            .into_iter()
            .map(|(_, raw)| CachedSideTx {
                height,
                tx_hash: TxHash::digest(&raw),
                raw,
            })
            .collect();

        Ok(txs)
    }

    fn has_side_tx(&self, height: Height, tx_hash: &TxHash) -> Result<bool, StoreError> {
        self.has(&side_tx_key(height, tx_hash))
    }

    /// Removing a missing entry is a no-op.
    fn remove_side_tx(&mut self, height: Height, tx_hash: &TxHash) -> Result<(), StoreError> {
        self.delete(&side_tx_key(height, tx_hash))
    }

    fn set_validator_snapshot(
        &mut self,
        height: Height,
        snapshot: &ValidatorSnapshot,
    ) -> Result<(), StoreError> {
        let key = snapshot_key(height);
        let bytes = borsh::to_vec(snapshot).map_err(|e| StoreError::encode(&key, e))?;
        self.set(&key, &bytes)
    }

    fn get_validator_snapshot(
        &self,
        height: Height,
    ) -> Result<Option<ValidatorSnapshot>, StoreError> {
        let key = snapshot_key(height);

        self.get(&key)?
            .map(|bytes| borsh::from_slice(&bytes).map_err(|e| StoreError::decode(&key, e)))
            .transpose()
    }

    fn has_validator_snapshot(&self, height: Height) -> Result<bool, StoreError> {
        self.has(&snapshot_key(height))
    }

    fn remove_validator_snapshot(&mut self, height: Height) -> Result<(), StoreError> {
        self.delete(&snapshot_key(height))
    }
}

impl<S: KvStore + ?Sized> SideTxStore for S {}
