use tracing::debug;

use anchor_core_types::Address;

use crate::{Validator, ValidatorSet};

/// A single change to the active validator set.
///
/// Removal is explicit: applying an `Update` to zero voting power keeps the member in the set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidatorChange {
    Add(Validator),
    Update(Validator),
    Remove(Address),
}

impl ValidatorChange {
    pub fn address(&self) -> Address {
        match self {
            Self::Add(v) | Self::Update(v) => v.address,
            Self::Remove(address) => *address,
        }
    }
}

/// The changes needed to bring the active set in line with the roster.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet(Vec<ValidatorChange>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: ValidatorChange) {
        self.0.push(change);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidatorChange> {
        self.0.iter()
    }
}

impl From<Vec<ValidatorChange>> for ChangeSet {
    fn from(changes: Vec<ValidatorChange>) -> Self {
        Self(changes)
    }
}

impl FromIterator<ValidatorChange> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = ValidatorChange>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ChangeSet {
    type Item = ValidatorChange;
    type IntoIter = std::vec::IntoIter<ValidatorChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Computes the change-set between the active set and the full roster at the given
/// acknowledgement count.
///
/// - a member of `current` that is no longer current is removed,
/// - a current validator missing from `current` is added,
/// - a member whose voting power differs from the roster is updated.
///
/// Changes follow roster order.
pub fn compute_change_set(current: &ValidatorSet, roster: &[Validator], ack_count: u64) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for validator in roster {
        let existing = current.get_by_address(&validator.address).map(|(_, v)| v);
        let is_current = validator.is_current(ack_count);

        match existing {
            Some(_) if !is_current => {
                changes.push(ValidatorChange::Remove(validator.address));
            }
            None if is_current => {
                changes.push(ValidatorChange::Add(validator.clone()));
            }
            Some(member) if member.voting_power != validator.voting_power => {
                changes.push(ValidatorChange::Update(validator.clone()));
            }
            _ => {}
        }
    }

    debug!(
        ack_count,
        roster = roster.len(),
        changes = changes.len(),
        "Computed validator change-set"
    );

    changes
}
