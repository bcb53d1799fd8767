use anchor_core_types::{PubKey, SideTxResult, SideVote, TxHash, ValidatorId, VotingPower};
use anchor_sidechannel::ValidatorPower;
use anchor_validator_set::Validator;

/// A deterministic uncompressed public key derived from `seed`.
pub fn make_pub_key(seed: u64) -> PubKey {
    let mut bytes = [0; PubKey::LENGTH];
    bytes[0] = 0x04;

    for (i, chunk) in bytes[1..].chunks_mut(8).enumerate() {
        let word = seed.wrapping_mul(0x9e37_79b9_7f4a_7c15).wrapping_add(i as u64);
        chunk.copy_from_slice(&word.to_be_bytes()[..chunk.len()]);
    }

    PubKey::new(bytes).expect("tagged uncompressed key")
}

pub fn make_validator(id: u64, voting_power: VotingPower) -> Validator {
    Validator::new(ValidatorId::new(id), make_pub_key(id), voting_power)
}

/// One validator per entry of `powers`, with ids starting at 1.
pub fn make_validators(powers: &[VotingPower]) -> Vec<Validator> {
    powers
        .iter()
        .zip(1..)
        .map(|(&power, id)| make_validator(id, power))
        .collect()
}

pub fn snapshot_of(validators: &[Validator]) -> Vec<ValidatorPower> {
    validators
        .iter()
        .map(|v| ValidatorPower {
            address: v.address,
            voting_power: v.voting_power,
        })
        .collect()
}

/// The votes of `validators` on `tx_hash`, pairing each validator with a result.
pub fn votes<'a>(
    tx_hash: TxHash,
    ballots: impl IntoIterator<Item = (&'a Validator, SideTxResult)>,
) -> Vec<SideVote> {
    ballots
        .into_iter()
        .map(|(validator, result)| SideVote::new(tx_hash, validator.address, result))
        .collect()
}
