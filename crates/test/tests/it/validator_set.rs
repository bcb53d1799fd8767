use std::collections::BTreeMap;

use anchor_app::load_validator_set;
use anchor_test::{make_validator, TestNode};
use anchor_validator_set::ValidatorChange;

#[test]
fn validators_join_and_leave_with_ack_count() {
    let mut node = TestNode::new(&[10, 20, 30]).unwrap();

    let joining = make_validator(4, 40).with_epochs(5, 0);
    let leaving = node.genesis[0].clone().with_epochs(0, 7);

    let roster = vec![
        leaving.clone(),
        node.genesis[1].clone(),
        node.genesis[2].clone(),
        joining.clone(),
    ];

    let response = node.end_block(1, 4, &roster).unwrap();
    assert!(response.updates.is_empty());
    assert_eq!(node.app.validators().len(), 3);

    let response = node.end_block(2, 5, &roster).unwrap();
    assert_eq!(
        response.updates.iter().collect::<Vec<_>>(),
        vec![&ValidatorChange::Add(joining.clone())]
    );
    assert_eq!(node.app.validators().len(), 4);
    assert_eq!(node.app.validators().total_voting_power(), 100);

    let response = node.end_block(3, 7, &roster).unwrap();
    assert_eq!(
        response.updates.iter().collect::<Vec<_>>(),
        vec![&ValidatorChange::Remove(leaving.address)]
    );
    assert_eq!(node.app.validators().len(), 3);
    assert!(!node.app.validators().has_address(&leaving.address));
    assert_eq!(node.app.validators().total_voting_power(), 90);

    let persisted = load_validator_set(&node.state).unwrap().unwrap();
    assert_eq!(&persisted, node.app.validators());
}

#[test]
fn stake_changes_are_applied() {
    let mut node = TestNode::new(&[10, 20, 30]).unwrap();

    let mut roster = node.genesis.clone();
    roster[1].voting_power = 25;

    let response = node.end_block(1, 0, &roster).unwrap();

    assert_eq!(response.updates.len(), 1);
    assert_eq!(node.app.validators().total_voting_power(), 65);
}

#[test]
fn change_set_emptying_the_set_is_rejected() {
    let mut node = TestNode::new(&[10, 20, 30]).unwrap();
    let before = node.app.validators().clone();

    let roster: Vec<_> = node
        .genesis
        .iter()
        .map(|v| v.clone().with_jailed(true))
        .collect();

    let response = node.end_block(1, 0, &roster).unwrap();

    assert!(response.updates.is_empty());
    assert!(response.proposer.is_some());
    assert_eq!(node.app.validators().len(), 3);
    assert_eq!(
        node.app.validators().validators().iter().map(|v| v.address).collect::<Vec<_>>(),
        before.validators().iter().map(|v| v.address).collect::<Vec<_>>()
    );
}

#[test]
fn proposer_rotation_follows_stake() {
    let mut node = TestNode::new(&[1, 2, 3]).unwrap();
    let roster = node.genesis.clone();

    let mut proposals = BTreeMap::new();

    for height in 1..=6 {
        let response = node.end_block(height, 0, &roster).unwrap();
        let proposer = response.proposer.expect("a proposer");
        *proposals.entry(proposer).or_insert(0) += 1;
    }

    for validator in &node.genesis {
        assert_eq!(
            proposals.get(&validator.address).copied().unwrap_or(0),
            validator.voting_power,
            "validator {}",
            validator.id
        );
    }
}
