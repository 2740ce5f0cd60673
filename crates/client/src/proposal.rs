//! Proposal construction.
//!
//! A proposal is built exactly once per operation and shared across every
//! candidate endorser, so the transaction id it carries stays stable no
//! matter which candidate ends up answering.

use std::collections::BTreeMap;

use weft_crypto::{random_nonce, sha256};
use weft_proto::common::{ChannelHeader, Header, HeaderType, SignatureHeader};
use weft_proto::peer::{
    DeploymentSpec, ProgramId, ProgramInput, ProgramInvocationSpec, ProgramSpec, Proposal,
    ProposalPayload,
};
use weft_types::error::EndorseError;

/// System program handling deployment (install/instantiate) requests.
pub const LIFECYCLE_PROGRAM: &str = "lsys";
/// System program handling channel membership requests on a peer.
pub const CONFIG_PROGRAM: &str = "csys";

/// Function name for installs, addressed to the lifecycle program.
pub const INSTALL_FUNC: &[u8] = b"install";
/// Function name for instantiations, addressed to the lifecycle program.
pub const DEPLOY_FUNC: &[u8] = b"deploy";
/// Function name for channel joins, addressed to the config program.
pub const JOIN_FUNC: &[u8] = b"JoinChannel";

/// A proposal with its derived transaction id and wire bytes.
#[derive(Clone, Debug)]
pub struct BuiltProposal {
    /// Transaction id: hex(SHA-256(nonce || creator)).
    pub tx_id: String,
    pub proposal: Proposal,
    /// The exact bytes candidates receive and the creator signs.
    pub proposal_bytes: Vec<u8>,
}

fn build(
    header_type: HeaderType,
    channel_id: &str,
    spec_bytes: Vec<u8>,
    transient: BTreeMap<String, Vec<u8>>,
    creator: &[u8],
) -> Result<BuiltProposal, EndorseError> {
    let nonce = random_nonce();
    let mut digest_input = nonce.clone();
    digest_input.extend_from_slice(creator);
    let tx_id = hex::encode(
        sha256(&digest_input).map_err(|e| EndorseError::Build(e.to_string()))?,
    );

    let channel_header = ChannelHeader {
        r#type: header_type as i32,
        version: 0,
        channel_id: channel_id.to_string(),
        tx_id: tx_id.clone(),
        epoch: 0,
    };
    let signature_header = SignatureHeader {
        creator: creator.to_vec(),
        nonce,
    };
    let header = Header {
        channel_header: weft_proto::encode(&channel_header),
        signature_header: weft_proto::encode(&signature_header),
    };

    let payload = ProposalPayload {
        input: spec_bytes,
        transient,
    };
    let proposal = Proposal {
        header: weft_proto::encode(&header),
        payload: weft_proto::encode(&payload),
    };
    let proposal_bytes = weft_proto::encode(&proposal);

    Ok(BuiltProposal {
        tx_id,
        proposal,
        proposal_bytes,
    })
}

fn invocation_spec(program: &str, args: Vec<Vec<u8>>) -> Vec<u8> {
    let spec = ProgramInvocationSpec {
        spec: Some(ProgramSpec {
            program_id: Some(ProgramId {
                name: program.to_string(),
                ..Default::default()
            }),
            input: Some(ProgramInput { args }),
        }),
    };
    weft_proto::encode(&spec)
}

/// Builds an invocation proposal for `program` on `channel_id`.
pub fn program_proposal(
    channel_id: &str,
    program: &str,
    args: Vec<Vec<u8>>,
    transient: BTreeMap<String, Vec<u8>>,
    creator: &[u8],
) -> Result<BuiltProposal, EndorseError> {
    build(
        HeaderType::EndorserTransaction,
        channel_id,
        invocation_spec(program, args),
        transient,
        creator,
    )
}

/// Builds an install proposal carrying the packaged program bytes.
/// Installs are channel-less: the proposal binds to no channel id.
pub fn install_proposal(
    deployment: &DeploymentSpec,
    creator: &[u8],
) -> Result<BuiltProposal, EndorseError> {
    let args = vec![INSTALL_FUNC.to_vec(), weft_proto::encode(deployment)];
    build(
        HeaderType::EndorserTransaction,
        "",
        invocation_spec(LIFECYCLE_PROGRAM, args),
        BTreeMap::new(),
        creator,
    )
}

/// Builds a deployment (instantiate) proposal for `channel_id`.
pub fn deploy_proposal(
    channel_id: &str,
    deployment: &DeploymentSpec,
    creator: &[u8],
) -> Result<BuiltProposal, EndorseError> {
    let args = vec![
        DEPLOY_FUNC.to_vec(),
        channel_id.as_bytes().to_vec(),
        weft_proto::encode(deployment),
    ];
    build(
        HeaderType::EndorserTransaction,
        channel_id,
        invocation_spec(LIFECYCLE_PROGRAM, args),
        BTreeMap::new(),
        creator,
    )
}

/// Builds the configuration-typed proposal asking a peer to join a channel
/// whose genesis block is supplied.
pub fn join_proposal(
    genesis_block_bytes: Vec<u8>,
    creator: &[u8],
) -> Result<BuiltProposal, EndorseError> {
    let args = vec![JOIN_FUNC.to_vec(), genesis_block_bytes];
    build(
        HeaderType::Config,
        "",
        invocation_spec(CONFIG_PROGRAM, args),
        BTreeMap::new(),
        creator,
    )
}
