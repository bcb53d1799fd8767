use anchor_store::{KvStore, StoreError};

const TOPUP_SEQUENCE_PREFIX: &[u8] = b"topup-sequence/";

fn sequence_key(sequence: u128) -> Vec<u8> {
    let mut key = TOPUP_SEQUENCE_PREFIX.to_vec();
    key.extend_from_slice(sequence.to_string().as_bytes());
    key
}

/// Whether the deposit event at `sequence` has already been credited.
pub fn has_topup_sequence(store: &dyn KvStore, sequence: u128) -> Result<bool, StoreError> {
    store.has(&sequence_key(sequence))
}

pub fn set_topup_sequence(store: &mut dyn KvStore, sequence: u128) -> Result<(), StoreError> {
    store.set(&sequence_key(sequence), &[1])
}

/// Every credited sequence, in key order.
pub fn topup_sequences(store: &dyn KvStore) -> Result<Vec<u128>, StoreError> {
    store
        .scan_prefix(TOPUP_SEQUENCE_PREFIX)?
        .into_iter()
        .map(|(key, _)| {
            let suffix = &key[TOPUP_SEQUENCE_PREFIX.len()..];

            std::str::from_utf8(suffix)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| StoreError::decode(&key, "invalid top-up sequence"))
        })
        .collect()
}
