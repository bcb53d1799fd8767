use anchor_core_types::SideTxResult::{No, Skip, Yes};
use anchor_core_types::{CodeType, Height, TxHash};
use anchor_sidechannel::SideMsg;
use anchor_test::TestNode;
use anchor_topup::{MsgTopup, EVENT_TYPE_TOPUP};

use crate::{deposit, FEE_PER_TX, RELAYER, SIGNER};

fn setup(msg: &MsgTopup) -> (TestNode, Vec<u8>) {
    let node = TestNode::new(&[10, 20, 30, 40]).unwrap();
    node.chain.add_topup(msg, 10);

    let tx = node.encode(msg.clone()).unwrap();
    (node, tx)
}

#[test]
fn approved_topup_is_credited_two_blocks_later() {
    let msg = deposit(99);
    let (mut node, tx) = setup(&msg);

    let tx_hash = node.deliver_tx(18, &tx).unwrap().expect("side tx is cached");
    assert_eq!(tx_hash, TxHash::digest(&tx));

    let response = node.deliver_side_tx(19, &tx);
    assert_eq!(response.result, Yes);
    assert_eq!(response.data, msg.side_sign_bytes());

    let votes = node.unanimous(tx_hash, Yes);

    assert!(node.begin_side_block(19, &votes).unwrap().is_empty());
    assert_eq!(node.pending_side_txs(18).unwrap(), 1);
    assert_eq!(node.balance(&SIGNER).unwrap(), 0);

    let events = node.begin_side_block(20, &votes).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EVENT_TYPE_TOPUP);

    assert_eq!(node.balance(&SIGNER).unwrap(), 4 * FEE_PER_TX);
    assert_eq!(node.balance(&RELAYER).unwrap(), FEE_PER_TX);
    assert_eq!(node.pending_side_txs(18).unwrap(), 0);

    let metrics = node.app.metrics();
    assert_eq!(metrics.side_txs_cached.get(), 1);
    assert_eq!(metrics.side_txs_approved.get(), 1);
    assert_eq!(metrics.side_txs_evicted.get(), 1);
}

#[test]
fn split_vote_changes_nothing() {
    let msg = deposit(99);
    let (mut node, tx) = setup(&msg);

    let tx_hash = node.deliver_tx(18, &tx).unwrap().unwrap();

    // 50 of 100 for, 50 of 100 against: neither side clears two thirds
    let votes = node.split(tx_hash, &[Yes, No, No, Yes]);
    let events = node.begin_side_block(20, &votes).unwrap();

    assert!(events.is_empty());
    assert_eq!(node.balance(&SIGNER).unwrap(), 0);
    assert_eq!(node.balance(&RELAYER).unwrap(), 0);
    assert_eq!(node.pending_side_txs(18).unwrap(), 0);
    assert_eq!(node.app.metrics().side_txs_skipped.get(), 1);
}

#[test]
fn seventy_percent_against_rejects_topup() {
    let msg = deposit(99);
    let (mut node, tx) = setup(&msg);

    let tx_hash = node.deliver_tx(18, &tx).unwrap().unwrap();

    // 30 of 100 for, 70 of 100 against
    let votes = node.split(tx_hash, &[Yes, Yes, No, No]);
    let events = node.begin_side_block(20, &votes).unwrap();

    assert!(events.is_empty());
    assert_eq!(node.balance(&SIGNER).unwrap(), 0);
    assert_eq!(node.app.metrics().side_txs_rejected.get(), 1);
    assert_eq!(node.app.metrics().side_txs_skipped.get(), 0);
}

#[test]
fn rejected_topup_changes_nothing() {
    let msg = deposit(99);
    let (mut node, tx) = setup(&msg);

    let tx_hash = node.deliver_tx(18, &tx).unwrap().unwrap();
    let events = node
        .begin_side_block(20, &node.unanimous(tx_hash, No))
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(node.balance(&SIGNER).unwrap(), 0);
    assert_eq!(node.app.metrics().side_txs_rejected.get(), 1);
    assert_eq!(node.app.metrics().post_tx_failures.get(), 1);
}

#[test]
fn known_validator_is_credited_on_its_signer() {
    let msg = deposit(3);
    let (mut node, tx) = setup(&msg);
    let validator = node.genesis[2].address;

    let tx_hash = node.deliver_tx(18, &tx).unwrap().unwrap();
    node.begin_side_block(20, &node.unanimous(tx_hash, Yes))
        .unwrap();

    assert_eq!(node.balance(&validator).unwrap(), 4 * FEE_PER_TX);
    assert_eq!(node.balance(&SIGNER).unwrap(), 0);
}

#[test]
fn replayed_topup_is_not_credited_twice() {
    let msg = deposit(99);
    let (mut node, tx) = setup(&msg);

    let tx_hash = node.deliver_tx(18, &tx).unwrap().unwrap();
    let votes = node.unanimous(tx_hash, Yes);
    assert_eq!(node.begin_side_block(20, &votes).unwrap().len(), 1);

    // The same deposit relayed again in a later block
    assert_eq!(node.deliver_tx(21, &tx).unwrap(), Some(tx_hash));
    assert_eq!(node.deliver_side_tx(22, &tx).result, Yes);

    let events = node.begin_side_block(23, &votes).unwrap();

    assert!(events.is_empty());
    assert_eq!(node.balance(&SIGNER).unwrap(), 4 * FEE_PER_TX);
    assert_eq!(node.balance(&RELAYER).unwrap(), FEE_PER_TX);
    assert_eq!(node.pending_side_txs(21).unwrap(), 0);
    assert_eq!(node.app.metrics().post_tx_failures.get(), 1);
}

#[test]
fn unconfirmed_topup_votes_skip_until_deep_enough() {
    let msg = deposit(99);
    let (mut node, tx) = setup(&msg);
    node.chain.set_depth(&msg.tx_hash, 3);

    let response = node.deliver_side_tx(19, &tx);
    assert_eq!(response.result, Skip);
    assert_eq!(response.code, CodeType::WAIT_FOR_CONFIRMATION);
    assert!(response.data.is_empty());

    node.chain.set_depth(&msg.tx_hash, 6);

    let response = node.deliver_side_tx(19, &tx);
    assert_eq!(response.result, Yes);
    assert!(response.is_ok());
}

#[test]
fn invalid_topup_votes_skip() {
    let msg = MsgTopup {
        validator_id: anchor_core_types::ValidatorId::new(0),
        ..deposit(99)
    };
    let (mut node, tx) = setup(&msg);

    let response = node.deliver_side_tx(19, &tx);

    assert_eq!(response.result, Skip);
    assert_eq!(response.code, CodeType::INVALID_MSG);
}

#[test]
fn only_committed_side_txs_are_cached() {
    let msg = deposit(99);
    let (mut node, tx) = setup(&msg);

    let cached = node
        .app
        .on_deliver_tx(&mut node.state, Height::new(18), &tx, false)
        .unwrap();
    assert_eq!(cached, None);

    assert_eq!(node.deliver_tx(18, b"not a transaction").unwrap(), None);
    assert_eq!(node.pending_side_txs(18).unwrap(), 0);
}
