use std::collections::BTreeSet;
use std::io::{self, Read, Write};
use std::sync::OnceLock;

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::{debug, trace};

use anchor_core_types::{Address, VotingPower};

use crate::{ChangeSet, Validator, ValidatorChange, ValidatorSetError};

/// Upper bound on the total voting power of a set, leaving headroom for priority arithmetic.
pub const MAX_TOTAL_VOTING_POWER: VotingPower = i64::MAX / 8;

/// After a change-set is applied, priorities are rescaled so that the distance between the
/// highest and lowest is at most this factor times the total voting power.
pub const PRIORITY_WINDOW_SIZE_FACTOR: i64 = 2;

/// The ordered set of active validators.
///
/// Validators are kept sorted by address. The total voting power and the proposer are cached
/// lazily and reset by every structural mutation.
#[derive(Clone, Debug, Default)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
    proposer: OnceLock<Option<Address>>,
    total_voting_power: OnceLock<VotingPower>,
}

impl ValidatorSet {
    /// A genuinely empty set, with no proposer.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a set from a non-empty list of validators and runs one round of proposer
    /// selection so that a proposer is defined.
    pub fn new(validators: Vec<Validator>) -> Result<Self, ValidatorSetError> {
        if validators.is_empty() {
            return Err(ValidatorSetError::Empty);
        }

        let mut set = Self {
            validators: canonical(validators)?,
            ..Self::default()
        };

        set.increment_accum(1);
        Ok(set)
    }

    /// Rebuilds a previously persisted set without touching proposer priorities.
    pub fn from_existing(
        validators: Vec<Validator>,
        proposer: Option<Address>,
    ) -> Result<Self, ValidatorSetError> {
        let mut set = Self {
            validators: canonical(validators)?,
            ..Self::default()
        };

        if let Some(address) = proposer {
            if !set.has_address(&address) {
                return Err(ValidatorSetError::UnknownValidator(address));
            }
            set.proposer = OnceLock::from(Some(address));
        }

        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.validators.iter()
    }

    pub fn has_address(&self, address: &Address) -> bool {
        self.position(address).is_ok()
    }

    pub fn get_by_address(&self, address: &Address) -> Option<(usize, &Validator)> {
        let index = self.position(address).ok()?;
        self.validators.get(index).map(|v| (index, v))
    }

    pub fn get_by_index(&self, index: usize) -> Option<&Validator> {
        self.validators.get(index)
    }

    /// Sum of the voting power of all members, saturating at `i64::MAX`.
    pub fn total_voting_power(&self) -> VotingPower {
        *self.total_voting_power.get_or_init(|| {
            self.validators
                .iter()
                .fold(0, |acc: VotingPower, v| acc.saturating_add(v.voting_power))
        })
    }

    /// The current proposer, computed from the priorities if not cached.
    pub fn get_proposer(&self) -> Option<&Validator> {
        let address = (*self
            .proposer
            .get_or_init(|| self.find_proposer().map(|v| v.address)))?;

        self.get_by_address(&address).map(|(_, v)| v)
    }

    /// The validator with the highest proposer priority.
    ///
    /// Ties go to the lowest address.
    pub fn find_proposer(&self) -> Option<&Validator> {
        self.max_priority_index()
            .and_then(|index| self.validators.get(index))
    }

    /// Inserts a validator, keeping address order.
    ///
    /// Returns `false` and leaves the set unchanged if the address is already present.
    pub fn add(&mut self, validator: Validator) -> bool {
        match self.position(&validator.address) {
            Ok(_) => false,
            Err(index) => {
                self.validators.insert(index, validator);
                self.invalidate();
                true
            }
        }
    }

    pub fn remove(&mut self, address: &Address) -> Option<Validator> {
        let index = self.position(address).ok()?;
        let removed = self.validators.remove(index);
        self.invalidate();
        Some(removed)
    }

    /// Replaces the member with the same address.
    ///
    /// Returns `false` and leaves the set unchanged if there is no such member.
    pub fn update(&mut self, validator: Validator) -> bool {
        let Ok(index) = self.position(&validator.address) else {
            return false;
        };

        if let Some(slot) = self.validators.get_mut(index) {
            *slot = validator;
        }

        self.invalidate();
        true
    }

    /// Advances proposer selection by `times` rounds.
    ///
    /// Every validator's priority first grows by `voting_power * times`. Then, once per round, the
    /// validator with the highest priority is picked and its priority is reduced by the total
    /// voting power. The last pick becomes the proposer. Arithmetic saturates at the bounds of `i64`.
    pub fn increment_accum(&mut self, times: u32) {
        if self.validators.is_empty() || times == 0 {
            return;
        }

        let times = i64::from(times);
        let total = self.total_voting_power();

        for v in &mut self.validators {
            v.proposer_priority = v
                .proposer_priority
                .saturating_add(v.voting_power.saturating_mul(times));
        }

        let mut proposer = None;

        for _ in 0..times {
            let Some(winner) = self
                .max_priority_index()
                .and_then(|index| self.validators.get_mut(index))
            else {
                break;
            };

            winner.proposer_priority = winner.proposer_priority.saturating_sub(total);
            proposer = Some(winner.address);
        }

        trace!(
            proposer = ?proposer.map(|a| a.to_string()),
            rounds = times,
            "Incremented proposer priorities"
        );

        self.proposer = OnceLock::from(proposer);
    }

    /// Applies a change-set atomically: on error the set is left untouched.
    ///
    /// New validators start with a priority of `-(P + P/8)`, where `P` is the total voting power
    /// after updates and before removals, so that leaving and re-joining cannot reset a negative
    /// priority. Updated validators keep their priority. Priorities are then rescaled and centred.
    pub fn apply_change_set(&mut self, changes: &ChangeSet) -> Result<(), ValidatorSetError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut seen = BTreeSet::new();
        let mut upserts = Vec::new();
        let mut removals = Vec::new();
        let mut added = 0usize;
        let mut removed_power = 0i128;

        for change in changes.iter() {
            let address = change.address();
            if !seen.insert(address) {
                return Err(ValidatorSetError::Duplicate(address));
            }

            match change {
                ValidatorChange::Add(validator) => {
                    check_power(validator)?;
                    if self.has_address(&address) {
                        return Err(ValidatorSetError::AlreadyPresent(address));
                    }
                    added += 1;
                    upserts.push(validator);
                }
                ValidatorChange::Update(validator) => {
                    check_power(validator)?;
                    if !self.has_address(&address) {
                        return Err(ValidatorSetError::UnknownValidator(address));
                    }
                    upserts.push(validator);
                }
                ValidatorChange::Remove(address) => {
                    let (_, existing) = self
                        .get_by_address(address)
                        .ok_or(ValidatorSetError::UnknownValidator(*address))?;
                    removed_power += i128::from(existing.voting_power);
                    removals.push(*address);
                }
            }
        }

        if self.len() + added == removals.len() {
            return Err(ValidatorSetError::WouldBeEmpty);
        }

        // Apply the smallest deltas first so that a transient overflow is not reported
        // when removals and decreases make room for increases.
        let mut deltas: Vec<i128> = upserts
            .iter()
            .map(|v| i128::from(v.voting_power) - i128::from(self.power_of(&v.address)))
            .collect();
        deltas.sort_unstable();

        let max = i128::from(MAX_TOTAL_VOTING_POWER);
        let mut total = i128::from(self.total_voting_power()) - removed_power;
        for delta in deltas {
            total += delta;
            if total > max {
                return Err(ValidatorSetError::TotalPowerOverflow {
                    max: MAX_TOTAL_VOTING_POWER,
                });
            }
        }

        let total_before_removals = total + removed_power;
        let new_priority = clip(-(total_before_removals + (total_before_removals >> 3)));

        let mut next = self.clone();

        for validator in upserts {
            let mut validator = validator.clone();
            validator.proposer_priority = match self.get_by_address(&validator.address) {
                Some((_, existing)) => existing.proposer_priority,
                None => new_priority,
            };

            if next.has_address(&validator.address) {
                next.update(validator);
            } else {
                next.add(validator);
            }
        }

        for address in &removals {
            next.remove(address);
        }

        let window = PRIORITY_WINDOW_SIZE_FACTOR.saturating_mul(next.total_voting_power());
        next.rescale_priorities(window);
        next.shift_by_avg_priority();

        debug!(
            changes = changes.len(),
            added,
            removed = removals.len(),
            size = next.len(),
            total_voting_power = next.total_voting_power(),
            "Applied validator change-set"
        );

        *self = next;
        Ok(())
    }

    fn position(&self, address: &Address) -> Result<usize, usize> {
        self.validators
            .binary_search_by(|v| v.address.cmp(address))
    }

    fn power_of(&self, address: &Address) -> VotingPower {
        self.get_by_address(address)
            .map_or(0, |(_, v)| v.voting_power)
    }

    fn max_priority_index(&self) -> Option<usize> {
        let mut best: Option<(usize, i64)> = None;

        for (index, v) in self.validators.iter().enumerate() {
            match best {
                Some((_, priority)) if priority >= v.proposer_priority => {}
                _ => best = Some((index, v.proposer_priority)),
            }
        }

        best.map(|(index, _)| index)
    }

    fn invalidate(&mut self) {
        self.proposer = OnceLock::new();
        self.total_voting_power = OnceLock::new();
    }

    /// Divides all priorities by `ceil(diff / diff_max)` when their spread exceeds `diff_max`.
    fn rescale_priorities(&mut self, diff_max: i64) {
        if diff_max <= 0 {
            return;
        }

        let priorities = self.validators.iter().map(|v| v.proposer_priority);
        let (Some(max), Some(min)) = (priorities.clone().max(), priorities.min()) else {
            return;
        };

        let diff = i128::from(max) - i128::from(min);
        let diff_max = i128::from(diff_max);

        if diff > diff_max {
            let ratio = (diff + diff_max - 1) / diff_max;
            for v in &mut self.validators {
                v.proposer_priority = clip(i128::from(v.proposer_priority) / ratio);
            }
        }
    }

    fn shift_by_avg_priority(&mut self) {
        if self.validators.is_empty() {
            return;
        }

        let sum: i128 = self
            .validators
            .iter()
            .map(|v| i128::from(v.proposer_priority))
            .sum();

        // Floors, so a negative fractional average moves down.
        let avg = clip(sum.div_euclid(self.validators.len() as i128));

        for v in &mut self.validators {
            v.proposer_priority = v.proposer_priority.saturating_sub(avg);
        }
    }
}

impl PartialEq for ValidatorSet {
    fn eq(&self, other: &Self) -> bool {
        self.validators == other.validators
            && self.get_proposer().map(|v| v.address) == other.get_proposer().map(|v| v.address)
    }
}

impl Eq for ValidatorSet {}

impl BorshSerialize for ValidatorSet {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        BorshSerialize::serialize(&self.validators, writer)?;
        BorshSerialize::serialize(&self.get_proposer().map(|v| v.address), writer)
    }
}

impl BorshDeserialize for ValidatorSet {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let validators = Vec::<Validator>::deserialize_reader(reader)?;
        let proposer = Option::<Address>::deserialize_reader(reader)?;

        Self::from_existing(validators, proposer)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn canonical(mut validators: Vec<Validator>) -> Result<Vec<Validator>, ValidatorSetError> {
    validators.sort_by(|a, b| a.address.cmp(&b.address));

    for pair in validators.windows(2) {
        if let [a, b] = pair {
            if a.address == b.address {
                return Err(ValidatorSetError::Duplicate(a.address));
            }
        }
    }

    let mut total = 0i128;
    for v in &validators {
        check_power(v)?;
        total += i128::from(v.voting_power);
    }

    if total > i128::from(MAX_TOTAL_VOTING_POWER) {
        return Err(ValidatorSetError::TotalPowerOverflow {
            max: MAX_TOTAL_VOTING_POWER,
        });
    }

    Ok(validators)
}

fn check_power(validator: &Validator) -> Result<(), ValidatorSetError> {
    if validator.voting_power < 0 {
        return Err(ValidatorSetError::NegativePower {
            address: validator.address,
            power: validator.voting_power,
        });
    }

    if validator.voting_power > MAX_TOTAL_VOTING_POWER {
        return Err(ValidatorSetError::PowerTooHigh {
            address: validator.address,
            power: validator.voting_power,
            max: MAX_TOTAL_VOTING_POWER,
        });
    }

    Ok(())
}

fn clip(value: i128) -> i64 {
    if value > i128::from(i64::MAX) {
        i64::MAX
    } else if value < i128::from(i64::MIN) {
        i64::MIN
    } else {
        value as i64
    }
}
