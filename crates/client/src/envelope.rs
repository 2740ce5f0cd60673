//! Envelope assembly.
//!
//! Combines a proposal and its endorsements into a transaction envelope
//! ready for ordering, or wraps a signed configuration update into a
//! channel envelope. Each envelope is constructed exactly once per
//! submission attempt.

use weft_crypto::random_nonce;
use weft_proto::common::{
    ChannelHeader, ConfigSignature, ConfigUpdateEnvelope, Envelope, Header, HeaderType, Payload,
    SignatureHeader, Status,
};
use weft_proto::orderer::{seek_info::SeekBehavior, seek_position, SeekInfo, SeekPosition};
use weft_proto::peer::{
    ProgramActionPayload, ProgramEndorsedAction, Proposal, ProposalPayload, ProposalResponse,
    Transaction, TransactionAction,
};
use weft_types::error::{EndorseError, IdentityError};
use weft_types::identity::SigningIdentity;

/// Assembles a transaction envelope from a proposal and its endorsements.
///
/// The first response's status must be success and every response payload
/// must be byte-identical to the first; divergence here means an earlier
/// quorum check was skipped and is rejected the same way. Transient data
/// never crosses into the ordered transaction.
pub fn transaction_envelope(
    signer: &dyn SigningIdentity,
    proposal: &Proposal,
    responses: &[ProposalResponse],
) -> Result<Envelope, EndorseError> {
    if responses.is_empty() {
        return Err(EndorseError::MissingField("proposal responses"));
    }

    let first = &responses[0];
    let body = first
        .response
        .as_ref()
        .ok_or(EndorseError::MissingField("response"))?;
    if body.status != Status::Success as i32 {
        return Err(EndorseError::BadStatus {
            status: body.status,
            message: body.message.clone(),
        });
    }
    if responses[1..].iter().any(|r| r.payload != first.payload) {
        return Err(EndorseError::PayloadMismatch);
    }

    let header: Header =
        weft_proto::decode(&proposal.header).map_err(EndorseError::Build)?;
    let proposal_payload: ProposalPayload =
        weft_proto::decode(&proposal.payload).map_err(EndorseError::Build)?;

    // Strip transient data before the payload enters the transaction.
    let visible_payload = ProposalPayload {
        input: proposal_payload.input,
        transient: Default::default(),
    };

    let endorsements = responses
        .iter()
        .filter_map(|r| r.endorsement.clone())
        .collect();
    let action = ProgramEndorsedAction {
        proposal_response_payload: first.payload.clone(),
        endorsements,
    };
    let action_payload = ProgramActionPayload {
        program_proposal_payload: weft_proto::encode(&visible_payload),
        action: Some(action),
    };
    let transaction = Transaction {
        actions: vec![TransactionAction {
            header: header.signature_header.clone(),
            payload: weft_proto::encode(&action_payload),
        }],
    };

    let payload = Payload {
        header: Some(header),
        data: weft_proto::encode(&transaction),
    };
    let payload_bytes = weft_proto::encode(&payload);
    let signature = signer
        .sign(&payload_bytes)
        .map_err(|e| EndorseError::Build(e.to_string()))?;

    Ok(Envelope {
        payload: payload_bytes,
        signature,
    })
}

fn signed_payload_envelope(
    signer: &dyn SigningIdentity,
    header_type: HeaderType,
    channel_id: &str,
    data: Vec<u8>,
) -> Result<Envelope, IdentityError> {
    let channel_header = ChannelHeader {
        r#type: header_type as i32,
        version: 0,
        channel_id: channel_id.to_string(),
        tx_id: String::new(),
        epoch: 0,
    };
    let signature_header = SignatureHeader {
        creator: signer.serialize(),
        nonce: random_nonce(),
    };
    let payload = Payload {
        header: Some(Header {
            channel_header: weft_proto::encode(&channel_header),
            signature_header: weft_proto::encode(&signature_header),
        }),
        data,
    };
    let payload_bytes = weft_proto::encode(&payload);
    let signature = signer.sign(&payload_bytes)?;
    Ok(Envelope {
        payload: payload_bytes,
        signature,
    })
}

/// Wraps a signed configuration update into a channel envelope.
pub fn config_update_envelope(
    signer: &dyn SigningIdentity,
    channel_id: &str,
    update_bytes: Vec<u8>,
    signatures: Vec<ConfigSignature>,
) -> Result<Envelope, IdentityError> {
    let update_envelope = ConfigUpdateEnvelope {
        config_update: update_bytes,
        signatures,
    };
    signed_payload_envelope(
        signer,
        HeaderType::ConfigUpdate,
        channel_id,
        weft_proto::encode(&update_envelope),
    )
}

/// Builds the signed seek envelope opening a deliver stream.
pub fn seek_envelope(
    signer: &dyn SigningIdentity,
    channel_id: &str,
    seek: SeekInfo,
) -> Result<Envelope, IdentityError> {
    signed_payload_envelope(
        signer,
        HeaderType::DeliverSeekInfo,
        channel_id,
        weft_proto::encode(&seek),
    )
}

fn position(r#type: seek_position::Type) -> SeekPosition {
    SeekPosition {
        r#type: Some(r#type),
    }
}

fn newest() -> SeekPosition {
    position(seek_position::Type::Newest(Default::default()))
}

fn specified(number: u64) -> SeekPosition {
    position(seek_position::Type::Specified(
        weft_proto::orderer::SeekSpecified { number },
    ))
}

/// Seek exactly the newest block.
pub fn seek_newest() -> SeekInfo {
    SeekInfo {
        start: Some(newest()),
        stop: Some(newest()),
        behavior: SeekBehavior::BlockUntilReady as i32,
    }
}

/// Seek exactly block `number`.
pub fn seek_block(number: u64) -> SeekInfo {
    SeekInfo {
        start: Some(specified(number)),
        stop: Some(specified(number)),
        behavior: SeekBehavior::BlockUntilReady as i32,
    }
}

/// Seek from the newest block onward, without end.
pub fn seek_newest_onward() -> SeekInfo {
    SeekInfo {
        start: Some(newest()),
        stop: Some(specified(u64::MAX)),
        behavior: SeekBehavior::BlockUntilReady as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use weft_proto::peer::{Endorsement, Response};
    use weft_types::error::IdentityError;

    struct FakeSigner;

    impl SigningIdentity for FakeSigner {
        fn msp_id(&self) -> &str {
            "Org1MSP"
        }

        fn serialize(&self) -> Vec<u8> {
            b"identity".to_vec()
        }

        fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError> {
            Ok(message.len().to_be_bytes().to_vec())
        }
    }

    fn proposal_with_transient() -> Proposal {
        let payload = ProposalPayload {
            input: b"spec".to_vec(),
            transient: BTreeMap::from([("secret".to_string(), b"v".to_vec())]),
        };
        let header = Header {
            channel_header: b"ch".to_vec(),
            signature_header: b"sh".to_vec(),
        };
        Proposal {
            header: weft_proto::encode(&header),
            payload: weft_proto::encode(&payload),
        }
    }

    fn response(status: i32, payload: &[u8]) -> ProposalResponse {
        ProposalResponse {
            version: 1,
            response: Some(Response {
                status,
                message: String::new(),
                payload: vec![],
            }),
            payload: payload.to_vec(),
            endorsement: Some(Endorsement {
                endorser: b"peer".to_vec(),
                signature: b"sig".to_vec(),
            }),
        }
    }

    #[test]
    fn transient_data_is_stripped_from_the_transaction() {
        let envelope = transaction_envelope(
            &FakeSigner,
            &proposal_with_transient(),
            &[response(Status::Success as i32, b"out")],
        )
        .unwrap();

        let payload: Payload = weft_proto::decode(&envelope.payload).unwrap();
        let transaction: Transaction = weft_proto::decode(&payload.data).unwrap();
        let action_payload: ProgramActionPayload =
            weft_proto::decode(&transaction.actions[0].payload).unwrap();
        let visible: ProposalPayload =
            weft_proto::decode(&action_payload.program_proposal_payload).unwrap();
        assert!(visible.transient.is_empty());
        assert_eq!(visible.input, b"spec");
    }

    #[test]
    fn divergent_payloads_fail_assembly() {
        let err = transaction_envelope(
            &FakeSigner,
            &proposal_with_transient(),
            &[
                response(Status::Success as i32, b"out-a"),
                response(Status::Success as i32, b"out-b"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, EndorseError::PayloadMismatch));
    }

    #[test]
    fn failed_first_response_rejects_assembly() {
        let err = transaction_envelope(
            &FakeSigner,
            &proposal_with_transient(),
            &[response(500, b"out")],
        )
        .unwrap_err();
        assert!(matches!(err, EndorseError::BadStatus { status: 500, .. }));
    }

    #[test]
    fn all_endorsements_enter_the_action() {
        let envelope = transaction_envelope(
            &FakeSigner,
            &proposal_with_transient(),
            &[
                response(Status::Success as i32, b"out"),
                response(Status::Success as i32, b"out"),
            ],
        )
        .unwrap();
        let payload: Payload = weft_proto::decode(&envelope.payload).unwrap();
        let transaction: Transaction = weft_proto::decode(&payload.data).unwrap();
        let action_payload: ProgramActionPayload =
            weft_proto::decode(&transaction.actions[0].payload).unwrap();
        assert_eq!(action_payload.action.unwrap().endorsements.len(), 2);
    }
}
