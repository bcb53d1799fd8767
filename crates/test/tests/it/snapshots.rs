use anchor_config::{Config, MetricsConfig, SideChannelConfig};
use anchor_core_types::SideTxResult::{No, Yes};
use anchor_core_types::Height;
use anchor_sidechannel::SideTxStore;
use anchor_test::{snapshot_of, TestNode};

use crate::{deposit, FEE_PER_TX, SIGNER};

#[test]
fn last_commit_defines_the_voters() {
    let mut node = TestNode::new(&[10, 20, 30, 40]).unwrap();
    let msg = deposit(99);
    node.chain.add_topup(&msg, 10);
    let tx = node.encode(msg).unwrap();

    // Only the two lightest validators signed the last commit
    let last_commit = snapshot_of(&node.genesis[..2]);
    node.app
        .on_begin_block(&mut node.state, Height::new(18), &last_commit)
        .unwrap();

    let tx_hash = node.deliver_tx(18, &tx).unwrap().unwrap();

    let snapshot = node
        .state
        .get_validator_snapshot(Height::new(18))
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.total_voting_power(), 30);

    // Votes from validators outside the snapshot carry no weight
    let votes = node.split(tx_hash, &[Yes, Yes, No, No]);
    let events = node.begin_side_block(20, &votes).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(node.balance(&SIGNER).unwrap(), 4 * FEE_PER_TX);
}

#[test]
fn empty_last_commit_is_not_recorded() {
    let mut node = TestNode::new(&[10, 20, 30, 40]).unwrap();

    node.app
        .on_begin_block(&mut node.state, Height::new(18), &[])
        .unwrap();

    assert!(!node
        .state
        .has_validator_snapshot(Height::new(18))
        .unwrap());
}

fn run_replay(prune_validator_snapshots: bool) -> TestNode {
    let config = Config {
        side_channel: SideChannelConfig {
            prune_validator_snapshots,
            ..SideChannelConfig::default()
        },
        metrics: MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        },
        ..Config::default()
    };

    let mut node = TestNode::with_config(config, &[10, 20, 30, 40]).unwrap();
    let msg = deposit(99);
    node.chain.add_topup(&msg, 10);
    let tx = node.encode(msg).unwrap();

    let tx_hash = node.deliver_tx(18, &tx).unwrap().unwrap();
    let votes = node.unanimous(tx_hash, Yes);
    node.begin_side_block(20, &votes).unwrap();

    node
}

#[test]
fn consumed_snapshots_are_pruned() {
    let node = run_replay(true);

    assert!(!node
        .state
        .has_validator_snapshot(Height::new(18))
        .unwrap());
}

#[test]
fn consumed_snapshots_can_be_kept() {
    let node = run_replay(false);

    assert!(node
        .state
        .has_validator_snapshot(Height::new(18))
        .unwrap());
}

#[test]
fn tx_delay_is_configurable() {
    let config = Config {
        side_channel: SideChannelConfig {
            tx_delay: 3,
            ..SideChannelConfig::default()
        },
        metrics: MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        },
        ..Config::default()
    };

    let mut node = TestNode::with_config(config, &[10, 20, 30, 40]).unwrap();
    let msg = deposit(99);
    node.chain.add_topup(&msg, 10);
    let tx = node.encode(msg).unwrap();

    let tx_hash = node.deliver_tx(18, &tx).unwrap().unwrap();
    let votes = node.unanimous(tx_hash, Yes);

    assert!(node.begin_side_block(20, &votes).unwrap().is_empty());
    assert_eq!(node.pending_side_txs(18).unwrap(), 1);

    assert_eq!(node.begin_side_block(21, &votes).unwrap().len(), 1);
    assert_eq!(node.pending_side_txs(18).unwrap(), 0);
}

#[test]
fn zero_tx_delay_is_rejected_at_startup() {
    let config = Config {
        side_channel: SideChannelConfig {
            tx_delay: 0,
            ..SideChannelConfig::default()
        },
        ..Config::default()
    };

    assert!(TestNode::with_config(config, &[10, 20, 30, 40]).is_err());
}

#[test]
fn repeated_last_commit_entries_count_once() {
    let mut node = TestNode::new(&[10, 20, 30, 40]).unwrap();
    let msg = deposit(99);
    node.chain.add_topup(&msg, 10);
    let tx = node.encode(msg).unwrap();

    // The lightest validator appears three times in the last commit
    let mut last_commit = snapshot_of(&node.genesis[..2]);
    last_commit.extend(snapshot_of(&node.genesis[..1]));
    last_commit.extend(snapshot_of(&node.genesis[..1]));
    node.app
        .on_begin_block(&mut node.state, Height::new(18), &last_commit)
        .unwrap();

    let tx_hash = node.deliver_tx(18, &tx).unwrap().unwrap();

    let snapshot = node
        .state
        .get_validator_snapshot(Height::new(18))
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.total_voting_power(), 30);

    // 10 of 30 is not a supermajority however often its voter is listed
    let votes = node.split(tx_hash, &[Yes, No, No, No]);
    assert!(node.begin_side_block(20, &votes).unwrap().is_empty());
    assert_eq!(node.balance(&SIGNER).unwrap(), 0);
}
