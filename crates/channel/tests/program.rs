//! Program lifecycle end-to-end against in-process services.

use weft_channel::{OrgContext, Program};
use weft_client::Client;
use weft_test_utils::{
    spawn_orderer, spawn_peer, test_signer, tx_id_of, unreachable_endpoint, DeliverState,
    MockEndorser, MockOrderer, MockPeerDeliver,
};
use weft_types::error::OrchestrationError;

fn org_context() -> OrgContext {
    OrgContext::new("org1", "Org1MSP", Client::new(test_signer("Org1MSP")))
}

#[tokio::test]
async fn invoke_survives_an_unreachable_peer_and_confirms_commit() {
    let orderer = MockOrderer::accepting();
    let orderer_server = spawn_orderer(orderer.clone()).await;

    // The reachable peer reflects every ordered envelope back as a valid
    // commit on its filtered-block stream.
    let deliver = MockPeerDeliver::new(DeliverState {
        reflect: Some(orderer.broadcast_log()),
        channel_id: "trades".into(),
        hold_open: true,
        ..Default::default()
    });
    let endorser = MockEndorser::answering(b"moved");
    let reachable_peer = spawn_peer(endorser.clone(), deliver).await;

    let program = Program::new("asset", "1.0", "", org_context());
    let tx_id = program
        .invoke(
            "trades",
            vec![b"move".to_vec(), b"a".to_vec(), b"b".to_vec(), b"10".to_vec()],
            &[unreachable_endpoint(), reachable_peer.endpoint()],
            &[orderer_server.endpoint()],
        )
        .await
        .unwrap();

    assert_eq!(endorser.calls(), 1);
    let broadcasts = orderer.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(tx_id, tx_id_of(&broadcasts[0]));
}

#[tokio::test]
async fn install_endorses_without_broadcasting() {
    let endorser = MockEndorser::answering(b"");
    let peer = spawn_peer(endorser.clone(), MockPeerDeliver::default()).await;

    let program = Program::new("asset", "1.0", "github.com/example/asset", org_context());
    program
        .install(b"packaged-source".to_vec(), &[peer.endpoint()])
        .await
        .unwrap();

    assert_eq!(endorser.calls(), 1);
}

#[tokio::test]
async fn instantiate_endorses_then_broadcasts() {
    let endorser = MockEndorser::answering(b"");
    let peer = spawn_peer(endorser.clone(), MockPeerDeliver::default()).await;
    let orderer = MockOrderer::accepting();
    let orderer_server = spawn_orderer(orderer.clone()).await;

    let program = Program::new("asset", "1.0", "", org_context());
    program
        .instantiate(
            "trades",
            vec![b"init".to_vec()],
            Some("OutOf(1, 'Org1MSP.member')".to_string()),
            None,
            &[peer.endpoint()],
            &[orderer_server.endpoint()],
        )
        .await
        .unwrap();

    assert_eq!(endorser.calls(), 1);
    assert_eq!(orderer.broadcasts().len(), 1);
}

#[tokio::test]
async fn query_returns_the_endorser_payload() {
    let endorser = MockEndorser::answering(b"balance=40");
    let peer = spawn_peer(endorser, MockPeerDeliver::default()).await;

    let program = Program::new("asset", "1.0", "", org_context());
    let payload = program
        .query("trades", vec![b"balance".to_vec(), b"a".to_vec()], &[peer.endpoint()])
        .await
        .unwrap();
    assert_eq!(payload, b"balance=40");
}

#[tokio::test]
async fn invocation_with_a_failed_endorsement_status_is_not_retried() {
    let endorser = MockEndorser::answering(b"").with_status(500);
    let fallback = MockEndorser::answering(b"");
    let peer = spawn_peer(endorser, MockPeerDeliver::default()).await;
    let fallback_peer = spawn_peer(fallback.clone(), MockPeerDeliver::default()).await;
    let orderer_server = spawn_orderer(MockOrderer::accepting()).await;

    let program = Program::new("asset", "1.0", "", org_context());
    let err = program
        .invoke(
            "trades",
            vec![b"move".to_vec()],
            &[peer.endpoint(), fallback_peer.endpoint()],
            &[orderer_server.endpoint()],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestrationError::Endorse(_)));
    // A validation failure aborts the scan; the next candidate stays idle.
    assert_eq!(fallback.calls(), 0);
}
