use std::collections::BTreeMap;

use anchor_core_types::{Address, SideTxResult, SideVote};

use crate::ValidatorSnapshot;

/// Whether `weight` is strictly more than two thirds of `total`.
pub fn is_supermajority(weight: i128, total: i128) -> bool {
    weight.saturating_mul(3) > total.saturating_mul(2)
}

/// Voting power behind each result for a single side transaction.
///
/// Weights are summed in `i128` so that no sum of `i64` powers can overflow.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub yes: i128,
    pub no: i128,
    pub skip: i128,
    pub total: i128,
}

impl VoteTally {
    /// Weighs the votes by the snapshot's voting power.
    ///
    /// Only the last vote of each validator counts. Votes from addresses outside the
    /// snapshot weigh nothing.
    pub fn count<'a, I>(votes: I, validators: &ValidatorSnapshot) -> Self
    where
        I: IntoIterator<Item = &'a SideVote>,
    {
        let latest: BTreeMap<Address, SideTxResult> = votes
            .into_iter()
            .map(|vote| (vote.voter, vote.result))
            .collect();

        let mut tally = Self {
            total: validators.total_voting_power(),
            ..Self::default()
        };

        for (voter, result) in latest {
            let Some(power) = validators.power_of(&voter) else {
                continue;
            };

            let weight = match result {
                SideTxResult::Yes => &mut tally.yes,
                SideTxResult::No => &mut tally.no,
                SideTxResult::Skip => &mut tally.skip,
            };

            *weight += i128::from(power);
        }

        tally
    }

    /// `Yes` or `No` if either holds a two-thirds supermajority of the total power, else `Skip`.
    pub fn outcome(&self) -> SideTxResult {
        if self.total <= 0 {
            return SideTxResult::Skip;
        }

        if is_supermajority(self.yes, self.total) {
            SideTxResult::Yes
        } else if is_supermajority(self.no, self.total) {
            SideTxResult::No
        } else {
            SideTxResult::Skip
        }
    }
}

/// Aggregates the votes on a side transaction into a single outcome.
pub fn tally<'a, I>(votes: I, validators: &ValidatorSnapshot) -> SideTxResult
where
    I: IntoIterator<Item = &'a SideVote>,
{
    VoteTally::count(votes, validators).outcome()
}
