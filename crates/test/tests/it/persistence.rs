use anchor_app::{load_validator_set, AppMsg, SideChannelApp};
use anchor_config::{Config, MetricsConfig};
use anchor_core_types::{Height, SideTxResult};
use anchor_sidechannel::{Codec, SideVotes};
use anchor_store::{MemStore, RedbStore};
use anchor_test::{make_validator, make_validators, votes, MockChainClient};
use anchor_topup::{Bank, KvBank};
use anchor_validator_set::ValidatorSet;

use crate::{deposit, FEE_PER_TX, SIGNER};

fn config() -> Config {
    Config {
        moniker: "restarted-node".to_string(),
        metrics: MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        },
        ..Config::default()
    }
}

#[test]
fn restarted_node_resumes_from_persisted_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.redb");

    let genesis = make_validators(&[10, 20, 30]);
    let chain = MockChainClient::new();

    let msg = deposit(99);
    chain.add_topup(&msg, 10);

    let tx_hash;
    let expected;

    {
        let mut state = RedbStore::open(&path).unwrap();
        let mut app = SideChannelApp::new(
            config(),
            ValidatorSet::new(genesis.clone()).unwrap(),
            chain.clone(),
        )
        .unwrap();

        app.init_chain(&mut state).unwrap();

        let tx = app.codec().encode(&AppMsg::from(msg.clone())).unwrap();
        tx_hash = app
            .on_deliver_tx(&mut state, Height::new(5), &tx, true)
            .unwrap()
            .unwrap();

        let mut roster = genesis.clone();
        roster.push(make_validator(4, 40));
        let response = app
            .on_end_block(&mut state, Height::new(5), 0, &roster)
            .unwrap();
        assert_eq!(response.updates.len(), 1);

        expected = app.validators().clone();
    }

    let mut state = RedbStore::open(&path).unwrap();
    assert_eq!(load_validator_set(&state).unwrap().as_ref(), Some(&expected));

    let app = SideChannelApp::load(config(), &state, chain).unwrap();
    assert_eq!(app.validators(), &expected);
    assert_eq!(app.validators().len(), 4);

    // Votes are weighed against the set recorded when the tx was committed
    let ballots = genesis.iter().map(|v| (v, SideTxResult::Yes));
    let votes = SideVotes::from([(tx_hash, votes(tx_hash, ballots))]);

    let events = app
        .on_begin_side_block(&mut state, Height::new(7), &votes)
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(
        KvBank::new().balance(&state, &SIGNER).unwrap(),
        4 * FEE_PER_TX
    );
}

#[test]
fn loading_without_persisted_set_fails() {
    let state = MemStore::new();
    let result = SideChannelApp::load(config(), &state, MockChainClient::new());

    assert!(result.is_err());
}
