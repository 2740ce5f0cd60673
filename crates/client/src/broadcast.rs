//! Envelope submission to the ordering service.

use futures::stream;
use tonic::Request;
use tracing::debug;
use weft_proto::common::{Envelope, Status};
use weft_proto::orderer::atomic_broadcast_client::AtomicBroadcastClient;
use weft_types::error::BroadcastError;
use weft_types::Endpoint;

use crate::connection::connect;
use crate::failover;

/// Sends one envelope over a fresh broadcast stream and waits for the
/// transport-level acknowledgment: acceptance into the ordering
/// pipeline, not a commit guarantee.
pub async fn broadcast_one(endpoint: &Endpoint, envelope: Envelope) -> Result<(), BroadcastError> {
    let channel = connect(endpoint).await?;
    let mut client = AtomicBroadcastClient::new(channel);

    let outbound = stream::iter(vec![envelope]);
    let mut inbound = client
        .broadcast(Request::new(outbound))
        .await
        .map_err(|status| BroadcastError::Rpc(endpoint.address.clone(), status.to_string()))?
        .into_inner();

    let ack = inbound
        .message()
        .await
        .map_err(|status| BroadcastError::Rpc(endpoint.address.clone(), status.to_string()))?
        .ok_or(BroadcastError::NoAck)?;

    if ack.status != Status::Success as i32 {
        return Err(BroadcastError::Rejected {
            status: ack.status,
            info: ack.info,
        });
    }
    debug!(orderer = %endpoint.address, "envelope accepted for ordering");
    Ok(())
}

/// Tries the orderers strictly in list order, returning on the first
/// acknowledgment; exhausting the list yields
/// [`BroadcastError::AllEndpointsFailed`].
pub async fn broadcast(envelope: &Envelope, orderers: &[Endpoint]) -> Result<(), BroadcastError> {
    failover::try_each(orderers, |orderer| {
        let envelope = envelope.clone();
        async move { broadcast_one(&orderer, envelope).await }
    })
    .await
}
