use anchor_core_types::{Address, VotingPower};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidatorSetError {
    #[error("Validator set must not be empty")]
    Empty,

    #[error("Applying the validator changes would result in an empty set")]
    WouldBeEmpty,

    #[error("Duplicate entry for validator {0}")]
    Duplicate(Address),

    #[error("Voting power of validator {address} cannot be negative: {power}")]
    NegativePower { address: Address, power: VotingPower },

    #[error("Voting power of validator {address} cannot be higher than {max}, got {power}")]
    PowerTooHigh {
        address: Address,
        power: VotingPower,
        max: VotingPower,
    },

    #[error("Total voting power would exceed {max}")]
    TotalPowerOverflow { max: VotingPower },

    #[error("Validator {0} is not part of the set")]
    UnknownValidator(Address),

    #[error("Validator {0} is already part of the set")]
    AlreadyPresent(Address),
}
