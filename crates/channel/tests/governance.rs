//! Governance orchestration against live in-process services: add/delete
//! organizations, channel creation, channel joining.

use std::collections::BTreeMap;

use weft_channel::{Channel, OrgContext};
use weft_client::Client;
use weft_configtx::org::{application_org_group, orderer_org_group, Organization};
use weft_configtx::{
    ADMINS_POLICY_KEY, APPLICATION_GROUP_KEY, CONSORTIUMS_GROUP_KEY, ORDERER_ADDRESSES_KEY,
    ORDERER_GROUP_KEY,
};
use weft_proto::common::{
    Block, BlockData, BlockHeader, BlockMetadata, ChannelHeader, Config, ConfigEnvelope,
    ConfigGroup, ConfigUpdate, ConfigUpdateEnvelope, ConfigValue, Envelope, LastConfig,
    OrdererAddresses, Payload,
};
use weft_test_utils::{
    spawn_orderer, spawn_peer, test_signer, MockEndorser, MockOrderer, MockPeerDeliver,
};
use weft_types::bundle::IdentityBundle;
use weft_types::error::OrchestrationError;
use weft_types::{Endpoint, DEFAULT_CONSORTIUM, DEFAULT_SYSTEM_CHANNEL};

fn channel_id_of(envelope: &Envelope) -> String {
    let payload: Payload = weft_proto::decode(&envelope.payload).unwrap();
    let header = payload.header.unwrap();
    let channel_header: ChannelHeader = weft_proto::decode(&header.channel_header).unwrap();
    channel_header.channel_id
}

fn update_envelope_of(envelope: &Envelope) -> ConfigUpdateEnvelope {
    let payload: Payload = weft_proto::decode(&envelope.payload).unwrap();
    weft_proto::decode(&payload.data).unwrap()
}

fn base_config() -> Config {
    let mut channel = ConfigGroup {
        version: 0,
        mod_policy: ADMINS_POLICY_KEY.into(),
        ..Default::default()
    };
    channel.values.insert(
        ORDERER_ADDRESSES_KEY.into(),
        ConfigValue {
            version: 0,
            value: weft_proto::encode(&OrdererAddresses {
                addresses: vec!["orderer0.example.com:7050".into()],
            }),
            mod_policy: ADMINS_POLICY_KEY.into(),
        },
    );

    let mut orderer = ConfigGroup::default();
    orderer
        .groups
        .insert("Org1MSP".into(), ConfigGroup::default());
    channel.groups.insert(ORDERER_GROUP_KEY.into(), orderer);

    let mut consortium = ConfigGroup::default();
    consortium
        .groups
        .insert("Org1MSP".into(), ConfigGroup::default());
    let mut consortiums = ConfigGroup::default();
    consortiums
        .groups
        .insert(DEFAULT_CONSORTIUM.into(), consortium);
    channel
        .groups
        .insert(CONSORTIUMS_GROUP_KEY.into(), consortiums);

    let mut application = ConfigGroup::default();
    application
        .groups
        .insert("Org1MSP".into(), ConfigGroup::default());
    channel
        .groups
        .insert(APPLICATION_GROUP_KEY.into(), application);

    Config {
        sequence: 2,
        channel_group: Some(channel),
    }
}

fn config_block(config: &Config, number: u64) -> Block {
    let payload = Payload {
        header: None,
        data: weft_proto::encode(&ConfigEnvelope {
            config: Some(config.clone()),
            last_update: None,
        }),
    };
    let envelope = Envelope {
        payload: weft_proto::encode(&payload),
        signature: vec![],
    };
    Block {
        header: Some(BlockHeader {
            number,
            previous_hash: vec![],
            data_hash: vec![],
        }),
        data: Some(BlockData {
            data: vec![weft_proto::encode(&envelope)],
        }),
        metadata: Some(BlockMetadata {
            metadata: vec![vec![], weft_proto::encode(&LastConfig { index: number })],
        }),
    }
}

fn org(name: &str, msp_id: &str, orderers: Vec<Endpoint>) -> OrgContext {
    OrgContext::new(name, msp_id, Client::new(test_signer(msp_id))).with_orderers(orderers)
}

fn bundle() -> IdentityBundle {
    IdentityBundle {
        org: "org3".into(),
        msp_id: "Org3MSP".into(),
        orderers: vec!["orderer3.example.com:7050".into()],
        anchors: vec!["grpcs://peer0.org3.example.com:7051".into()],
        channel_peers: vec!["peer0.org3.example.com:7051".into()],
        admin_certs: BTreeMap::from([("admin.pem".to_string(), b"admin-cert".to_vec())]),
        ca_certs: BTreeMap::from([("ca.pem".to_string(), b"ca-cert".to_vec())]),
        tls_ca_certs: BTreeMap::from([("tlsca.pem".to_string(), b"tls-cert".to_vec())]),
    }
}

#[tokio::test]
async fn add_org_updates_system_channel_before_application_channel() {
    // First test in the binary wins the global subscriber; later calls
    // are no-ops.
    let _ = weft_telemetry::init_tracing();

    let orderer = MockOrderer::accepting();
    orderer.put_block(3, config_block(&base_config(), 3));
    let server = spawn_orderer(orderer.clone()).await;

    let channel = Channel::new(vec![
        org("org1", "Org1MSP", vec![server.endpoint()]),
        org("org2", "Org2MSP", vec![server.endpoint()]),
    ])
    .unwrap();

    channel.add_org(&bundle(), "trades").await.unwrap();

    let broadcasts = orderer.broadcasts();
    assert_eq!(broadcasts.len(), 2);
    assert_eq!(channel_id_of(&broadcasts[0]), DEFAULT_SYSTEM_CHANNEL);
    assert_eq!(channel_id_of(&broadcasts[1]), "trades");

    // Both updates carry one signature per participating organization.
    for envelope in &broadcasts {
        let update_envelope = update_envelope_of(envelope);
        assert_eq!(update_envelope.signatures.len(), 2);
    }

    // The system update admits the org to ordering and consortium groups.
    let system_update: ConfigUpdate =
        weft_proto::decode(&update_envelope_of(&broadcasts[0]).config_update).unwrap();
    assert_eq!(system_update.channel_id, DEFAULT_SYSTEM_CHANNEL);
    let write = system_update.write_set.unwrap();
    assert!(write.groups[ORDERER_GROUP_KEY].groups.contains_key("Org3MSP"));
    assert!(write.groups[CONSORTIUMS_GROUP_KEY].groups[DEFAULT_CONSORTIUM]
        .groups
        .contains_key("Org3MSP"));

    // The application update admits it to the application group.
    let app_update: ConfigUpdate =
        weft_proto::decode(&update_envelope_of(&broadcasts[1]).config_update).unwrap();
    assert_eq!(app_update.channel_id, "trades");
    assert!(app_update.write_set.unwrap().groups[APPLICATION_GROUP_KEY]
        .groups
        .contains_key("Org3MSP"));
}

#[tokio::test]
async fn application_failure_after_system_success_is_resumable() {
    let orderer = MockOrderer::accepting_first(1);
    orderer.put_block(3, config_block(&base_config(), 3));
    let server = spawn_orderer(orderer.clone()).await;

    let channel = Channel::new(vec![org("org1", "Org1MSP", vec![server.endpoint()])]).unwrap();

    let err = channel.add_org(&bundle(), "trades").await.unwrap_err();
    match err {
        OrchestrationError::AppChannelUpdate { channel, .. } => assert_eq!(channel, "trades"),
        other => panic!("unexpected error: {other}"),
    }
    // Only the system update went through.
    assert_eq!(orderer.broadcasts().len(), 1);
    assert_eq!(
        channel_id_of(&orderer.broadcasts()[0]),
        DEFAULT_SYSTEM_CHANNEL
    );
}

#[tokio::test]
async fn add_org_against_a_satisfied_topology_broadcasts_nothing() {
    let bundle = bundle();
    let organization = Organization {
        name: bundle.msp_id.clone(),
        msp_id: bundle.msp_id.clone(),
        root_certs: bundle.ca_certs.values().cloned().collect(),
        admin_certs: bundle.admin_certs.values().cloned().collect(),
        tls_root_certs: bundle.tls_ca_certs.values().cloned().collect(),
        anchor_peers: bundle.anchors.clone(),
    };

    // Seed a configuration where the organization is already everywhere.
    let mut config = base_config();
    {
        let channel = config.channel_group.as_mut().unwrap();
        channel.values.insert(
            ORDERER_ADDRESSES_KEY.into(),
            ConfigValue {
                version: 0,
                value: weft_proto::encode(&OrdererAddresses {
                    addresses: vec![
                        "orderer0.example.com:7050".into(),
                        "orderer3.example.com:7050".into(),
                    ],
                }),
                mod_policy: ADMINS_POLICY_KEY.into(),
            },
        );
        channel
            .groups
            .get_mut(ORDERER_GROUP_KEY)
            .unwrap()
            .groups
            .insert("Org3MSP".into(), orderer_org_group(&organization));
        channel
            .groups
            .get_mut(CONSORTIUMS_GROUP_KEY)
            .unwrap()
            .groups
            .get_mut(DEFAULT_CONSORTIUM)
            .unwrap()
            .groups
            .insert("Org3MSP".into(), orderer_org_group(&organization));
        channel
            .groups
            .get_mut(APPLICATION_GROUP_KEY)
            .unwrap()
            .groups
            .insert("Org3MSP".into(), application_org_group(&organization));
    }

    let orderer = MockOrderer::accepting();
    orderer.put_block(4, config_block(&config, 4));
    let server = spawn_orderer(orderer.clone()).await;

    let channel = Channel::new(vec![org("org1", "Org1MSP", vec![server.endpoint()])]).unwrap();
    channel.add_org(&bundle, "trades").await.unwrap();

    assert!(orderer.broadcasts().is_empty());
}

#[tokio::test]
async fn delete_org_removes_membership_from_both_channels() {
    let orderer = MockOrderer::accepting();
    orderer.put_block(3, config_block(&base_config(), 3));
    let server = spawn_orderer(orderer.clone()).await;

    let channel = Channel::new(vec![org("org2", "Org2MSP", vec![server.endpoint()])]).unwrap();
    channel
        .delete_org(
            "Org1MSP",
            &["orderer0.example.com:7050".to_string()],
            "trades",
        )
        .await
        .unwrap();

    let broadcasts = orderer.broadcasts();
    assert_eq!(broadcasts.len(), 2);
    let system_update: ConfigUpdate =
        weft_proto::decode(&update_envelope_of(&broadcasts[0]).config_update).unwrap();
    let write = system_update.write_set.unwrap();
    // The surviving membership no longer lists the removed organization.
    assert!(!write.groups[ORDERER_GROUP_KEY].groups.contains_key("Org1MSP"));
}

#[tokio::test]
async fn create_channel_broadcasts_a_self_signed_update() {
    let orderer = MockOrderer::accepting();
    let server = spawn_orderer(orderer.clone()).await;

    let channel = Channel::new(vec![org("org1", "Org1MSP", vec![server.endpoint()])]).unwrap();
    channel.create_channel("trades").await.unwrap();

    let broadcasts = orderer.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(channel_id_of(&broadcasts[0]), "trades");
    let update_envelope = update_envelope_of(&broadcasts[0]);
    assert_eq!(update_envelope.signatures.len(), 1);
    let update: ConfigUpdate = weft_proto::decode(&update_envelope.config_update).unwrap();
    assert_eq!(update.channel_id, "trades");
}

#[tokio::test]
async fn join_channel_sends_the_genesis_block_to_every_peer() {
    let orderer = MockOrderer::accepting();
    orderer.put_block(0, config_block(&base_config(), 0));
    let orderer_server = spawn_orderer(orderer).await;

    let endorser_a = MockEndorser::answering(b"");
    let endorser_b = MockEndorser::answering(b"");
    let peer_a = spawn_peer(endorser_a.clone(), MockPeerDeliver::default()).await;
    let peer_b = spawn_peer(endorser_b.clone(), MockPeerDeliver::default()).await;

    let org = org("org1", "Org1MSP", vec![orderer_server.endpoint()])
        .with_peers(vec![peer_a.endpoint(), peer_b.endpoint()]);
    let channel = Channel::new(vec![org]).unwrap();
    channel.join_channel("trades").await.unwrap();

    assert_eq!(endorser_a.calls(), 1);
    assert_eq!(endorser_b.calls(), 1);
}

#[tokio::test]
async fn identity_bundle_roundtrips_to_add_org_input() {
    let org = OrgContext::new("org3", "Org3MSP", Client::new(test_signer("Org3MSP")))
        .with_orderers(vec![Endpoint::insecure("orderer3.example.com:7050")])
        .with_anchors(vec!["grpcs://peer0.org3.example.com:7051".into()]);
    let channel = Channel::new(vec![org]).unwrap();

    let bundle = channel.identity_bundle();
    let parsed = IdentityBundle::from_json(&bundle.to_json()).unwrap();
    assert_eq!(parsed.msp_id, "Org3MSP");
    assert_eq!(parsed.orderers, vec!["orderer3.example.com:7050".to_string()]);
}
