//! Endorsement collection with sequential failover.

use tonic::Request;
use tracing::{debug, warn};
use weft_proto::common::Status;
use weft_proto::peer::endorser_client::EndorserClient;
use weft_proto::peer::{ProposalResponse, SignedProposal};
use weft_types::error::EndorseError;
use weft_types::identity::SigningIdentity;
use weft_types::Endpoint;

use crate::connection::connect;
use crate::failover;
use crate::proposal::BuiltProposal;

/// The product of a successful endorsement round.
#[derive(Clone, Debug)]
pub struct Endorsed {
    pub tx_id: String,
    pub proposal: weft_proto::peer::Proposal,
    /// The signed-over proposal bytes, kept for envelope assembly.
    pub proposal_bytes: Vec<u8>,
    /// One response per answering peer.
    pub responses: Vec<ProposalResponse>,
    /// The first peer that endorsed; commit watches default to it.
    pub endorser: Endpoint,
}

fn validate_response(response: &ProposalResponse) -> Result<(), EndorseError> {
    let body = response
        .response
        .as_ref()
        .ok_or(EndorseError::MissingField("response"))?;
    if body.status != Status::Success as i32 {
        return Err(EndorseError::BadStatus {
            status: body.status,
            message: body.message.clone(),
        });
    }
    let endorsement = response
        .endorsement
        .as_ref()
        .ok_or(EndorseError::MissingField("endorsement"))?;
    if endorsement.signature.is_empty() {
        return Err(EndorseError::MissingField("endorsement signature"));
    }
    Ok(())
}

async fn process_proposal(
    endpoint: &Endpoint,
    signed: SignedProposal,
) -> Result<ProposalResponse, EndorseError> {
    let channel = connect(endpoint).await?;
    let mut client = EndorserClient::new(channel);
    let response = client
        .process_proposal(Request::new(signed))
        .await
        .map_err(|status| EndorseError::Rpc(endpoint.address.clone(), status.to_string()))?
        .into_inner();
    validate_response(&response)?;
    Ok(response)
}

fn sign_proposal(
    signer: &dyn SigningIdentity,
    built: &BuiltProposal,
) -> Result<SignedProposal, EndorseError> {
    let signature = signer
        .sign(&built.proposal_bytes)
        .map_err(|e| EndorseError::Build(e.to_string()))?;
    Ok(SignedProposal {
        proposal_bytes: built.proposal_bytes.clone(),
        signature,
    })
}

/// Sends `built` to the candidates strictly in order, returning the first
/// successful endorsement. The proposal is signed once; the transaction id
/// is the same no matter which candidate answers.
pub async fn endorse(
    signer: &dyn SigningIdentity,
    built: BuiltProposal,
    peers: &[Endpoint],
) -> Result<Endorsed, EndorseError> {
    let signed = sign_proposal(signer, &built)?;

    let (endorser, response) = failover::try_each(peers, |peer| {
        let signed = signed.clone();
        async move {
            let response = process_proposal(&peer, signed).await?;
            Ok::<_, EndorseError>((peer, response))
        }
    })
    .await?;

    debug!(tx_id = %built.tx_id, endorser = %endorser.address, "proposal endorsed");
    Ok(Endorsed {
        tx_id: built.tx_id,
        proposal: built.proposal,
        proposal_bytes: built.proposal_bytes,
        responses: vec![response],
        endorser,
    })
}

/// Sends `built` to *every* candidate and requires all successful
/// responses to carry byte-identical payloads.
///
/// Divergent payloads from two successful endorsers mean non-deterministic
/// execution or tampering: that is the fatal
/// [`EndorseError::PayloadMismatch`], never resolved by picking a side.
/// Only when every candidate fails is [`EndorseError::AllEndpointsFailed`]
/// returned.
pub async fn endorse_all(
    signer: &dyn SigningIdentity,
    built: BuiltProposal,
    peers: &[Endpoint],
) -> Result<Endorsed, EndorseError> {
    let signed = sign_proposal(signer, &built)?;

    let mut responses = Vec::new();
    let mut endorser = None;
    let mut last = None;
    for peer in peers {
        match process_proposal(peer, signed.clone()).await {
            Ok(response) => {
                endorser.get_or_insert_with(|| peer.clone());
                responses.push(response);
            }
            Err(err) if failover::FailoverError::retryable(&err) => {
                warn!(endpoint = %peer.address, error = %err, "endorser failed");
                last = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    let endorser = match endorser {
        Some(endorser) => endorser,
        None => {
            return Err(failover::FailoverError::all_endpoints_failed(
                peers.len(),
                last,
            ))
        }
    };

    let reference = &responses[0].payload;
    if responses.iter().any(|r| &r.payload != reference) {
        return Err(EndorseError::PayloadMismatch);
    }

    debug!(tx_id = %built.tx_id, quorum = responses.len(), "proposal endorsed by quorum");
    Ok(Endorsed {
        tx_id: built.tx_id,
        proposal: built.proposal,
        proposal_bytes: built.proposal_bytes,
        responses,
        endorser,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_proto::peer::{Endorsement, Response};

    fn response(status: i32, payload: &[u8]) -> ProposalResponse {
        ProposalResponse {
            version: 1,
            response: Some(Response {
                status,
                message: String::new(),
                payload: payload.to_vec(),
            }),
            payload: payload.to_vec(),
            endorsement: Some(Endorsement {
                endorser: b"peer".to_vec(),
                signature: b"sig".to_vec(),
            }),
        }
    }

    #[test]
    fn success_response_passes_validation() {
        assert!(validate_response(&response(Status::Success as i32, b"out")).is_ok());
    }

    #[test]
    fn non_success_status_is_rejected() {
        let err = validate_response(&response(500, b"out")).unwrap_err();
        assert!(matches!(err, EndorseError::BadStatus { status: 500, .. }));
    }

    #[test]
    fn empty_endorsement_signature_is_rejected() {
        let mut resp = response(Status::Success as i32, b"out");
        resp.endorsement.as_mut().unwrap().signature.clear();
        assert!(matches!(
            validate_response(&resp),
            Err(EndorseError::MissingField("endorsement signature"))
        ));
    }
}
