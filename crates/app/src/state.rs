use anchor_core_types::{Address, ValidatorId};
use anchor_store::{KvStore, StoreError};
use anchor_topup::ValidatorLookup;
use anchor_validator_set::ValidatorSet;

const VALIDATOR_SET_KEY: &[u8] = b"validatorset";

pub fn load_validator_set(state: &dyn KvStore) -> Result<Option<ValidatorSet>, StoreError> {
    state
        .get(VALIDATOR_SET_KEY)?
        .map(|bytes| {
            borsh::from_slice(&bytes).map_err(|e| StoreError::decode(VALIDATOR_SET_KEY, e))
        })
        .transpose()
}

pub fn save_validator_set(state: &mut dyn KvStore, set: &ValidatorSet) -> Result<(), StoreError> {
    let bytes = borsh::to_vec(set).map_err(|e| StoreError::encode(VALIDATOR_SET_KEY, e))?;
    state.set(VALIDATOR_SET_KEY, &bytes)
}

/// Looks validators up in the persisted active set.
#[derive(Copy, Clone, Debug, Default)]
pub struct PersistedValidators;

impl ValidatorLookup for PersistedValidators {
    fn signer_of(
        &self,
        store: &dyn KvStore,
        id: ValidatorId,
    ) -> Result<Option<Address>, StoreError> {
        let Some(set) = load_validator_set(store)? else {
            return Ok(None);
        };

        let signer = set.iter().find(|v| v.id == id).map(|v| v.address);
        Ok(signer)
    }
}
