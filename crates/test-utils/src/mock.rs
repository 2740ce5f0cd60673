//! Mock peer and orderer services.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};
use weft_proto::common::{
    Block, ChannelHeader, Envelope, Payload, Status as WireStatus,
};
use weft_proto::orderer::atomic_broadcast_server::{AtomicBroadcast, AtomicBroadcastServer};
use weft_proto::orderer::{
    deliver_response, seek_position, BroadcastResponse, DeliverResponse as OrdererDeliverResponse,
    SeekInfo,
};
use weft_proto::peer::deliver_server::{Deliver, DeliverServer};
use weft_proto::peer::endorser_server::{Endorser, EndorserServer};
use weft_proto::peer::{
    deliver_response as peer_deliver_response, DeliverResponse as PeerDeliverResponse,
    Endorsement, FilteredBlock, FilteredTransaction, ProposalResponse, Response as PeerResponse,
    SignedProposal, TxValidationCode,
};
use weft_types::Endpoint;

/// An endpoint no listener is bound to; connections fail fast.
pub fn unreachable_endpoint() -> Endpoint {
    Endpoint::insecure("127.0.0.1:1").with_timeout(Duration::from_millis(300))
}

/// Extracts the transaction id from an assembled envelope.
pub fn tx_id_of(envelope: &Envelope) -> String {
    let payload: Payload = weft_proto::decode(&envelope.payload).expect("payload");
    let header = payload.header.expect("header");
    let channel_header: ChannelHeader =
        weft_proto::decode(&header.channel_header).expect("channel header");
    channel_header.tx_id
}

// ---------------------------------------------------------------------------
// Endorser
// ---------------------------------------------------------------------------

/// A peer endorser with scriptable behavior and a call counter.
#[derive(Clone, Default)]
pub struct MockEndorser {
    calls: Arc<AtomicUsize>,
    payload: Arc<Mutex<Vec<u8>>>,
    status: Arc<AtomicI32>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl MockEndorser {
    /// An endorser answering success with the given result payload.
    pub fn answering(payload: &[u8]) -> Self {
        let endorser = Self::default();
        endorser.status.store(WireStatus::Success as i32, Ordering::SeqCst);
        *endorser.payload.lock() = payload.to_vec();
        endorser
    }

    /// An endorser failing every RPC with an UNAVAILABLE status.
    pub fn unavailable(message: &str) -> Self {
        let endorser = Self::answering(b"");
        *endorser.fail_with.lock() = Some(message.to_string());
        endorser
    }

    /// An endorser answering the given response status.
    pub fn with_status(self, status: i32) -> Self {
        self.status.store(status, Ordering::SeqCst);
        self
    }

    /// Number of proposals this endorser received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[tonic::async_trait]
impl Endorser for MockEndorser {
    async fn process_proposal(
        &self,
        _request: Request<SignedProposal>,
    ) -> Result<Response<ProposalResponse>, Status> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_with.lock().clone() {
            return Err(Status::unavailable(message));
        }
        let payload = self.payload.lock().clone();
        Ok(Response::new(ProposalResponse {
            version: 1,
            response: Some(PeerResponse {
                status: self.status.load(Ordering::SeqCst),
                message: String::new(),
                payload: payload.clone(),
            }),
            payload,
            endorsement: Some(Endorsement {
                endorser: b"mock-peer".to_vec(),
                signature: b"mock-signature".to_vec(),
            }),
        }))
    }
}

// ---------------------------------------------------------------------------
// Orderer
// ---------------------------------------------------------------------------

type BoxedResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + 'static>>;

/// An ordering node recording broadcasts and serving a fixed block store.
#[derive(Clone)]
pub struct MockOrderer {
    broadcasts: Arc<Mutex<Vec<Envelope>>>,
    blocks: Arc<Mutex<BTreeMap<u64, Block>>>,
    broadcast_status: Arc<AtomicI32>,
    /// Envelopes accepted before the orderer starts rejecting.
    accept_limit: Arc<AtomicUsize>,
}

impl Default for MockOrderer {
    fn default() -> Self {
        Self {
            broadcasts: Arc::default(),
            blocks: Arc::default(),
            broadcast_status: Arc::default(),
            accept_limit: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }
}

impl MockOrderer {
    pub fn accepting() -> Self {
        let orderer = Self::default();
        orderer
            .broadcast_status
            .store(WireStatus::Success as i32, Ordering::SeqCst);
        orderer
    }

    /// An orderer rejecting every envelope with the given status.
    pub fn rejecting(status: i32) -> Self {
        let orderer = Self::default();
        orderer.broadcast_status.store(status, Ordering::SeqCst);
        orderer
    }

    /// Accepts the first `limit` envelopes, then rejects with 503.
    pub fn accepting_first(limit: usize) -> Self {
        let orderer = Self::accepting();
        orderer.accept_limit.store(limit, Ordering::SeqCst);
        orderer
    }

    /// Installs a block at `number` for the deliver surface.
    pub fn put_block(&self, number: u64, block: Block) {
        self.blocks.lock().insert(number, block);
    }

    /// Envelopes accepted so far, oldest first.
    pub fn broadcasts(&self) -> Vec<Envelope> {
        self.broadcasts.lock().clone()
    }

    /// Shared handle for a reflecting peer deliver service.
    pub fn broadcast_log(&self) -> Arc<Mutex<Vec<Envelope>>> {
        Arc::clone(&self.broadcasts)
    }
}

fn decode_seek(envelope: &Envelope) -> Option<SeekInfo> {
    let payload: Payload = weft_proto::decode(&envelope.payload).ok()?;
    weft_proto::decode(&payload.data).ok()
}

fn resolve_position(
    position: Option<&weft_proto::orderer::SeekPosition>,
    blocks: &BTreeMap<u64, Block>,
) -> Option<u64> {
    match position?.r#type.as_ref()? {
        seek_position::Type::Newest(_) => blocks.keys().max().copied(),
        seek_position::Type::Oldest(_) => blocks.keys().min().copied(),
        seek_position::Type::Specified(s) => Some(s.number),
    }
}

#[tonic::async_trait]
impl AtomicBroadcast for MockOrderer {
    type BroadcastStream = BoxedResponseStream<BroadcastResponse>;
    type DeliverStream = BoxedResponseStream<OrdererDeliverResponse>;

    async fn broadcast(
        &self,
        request: Request<Streaming<Envelope>>,
    ) -> Result<Response<Self::BroadcastStream>, Status> {
        let mut inbound = request.into_inner();
        let mut acks = Vec::new();
        while let Some(envelope) = inbound.message().await? {
            let accepted = {
                let mut broadcasts = self.broadcasts.lock();
                if broadcasts.len() < self.accept_limit.load(Ordering::SeqCst) {
                    broadcasts.push(envelope);
                    true
                } else {
                    false
                }
            };
            acks.push(Ok(if accepted {
                BroadcastResponse {
                    status: self.broadcast_status.load(Ordering::SeqCst),
                    info: String::new(),
                }
            } else {
                BroadcastResponse {
                    status: WireStatus::ServiceUnavailable as i32,
                    info: "broadcast quota exhausted".to_string(),
                }
            }));
        }
        Ok(Response::new(Box::pin(stream::iter(acks))))
    }

    async fn deliver(
        &self,
        request: Request<Streaming<Envelope>>,
    ) -> Result<Response<Self::DeliverStream>, Status> {
        let mut inbound = request.into_inner();
        let envelope = inbound
            .message()
            .await?
            .ok_or_else(|| Status::invalid_argument("missing seek request"))?;
        let seek =
            decode_seek(&envelope).ok_or_else(|| Status::invalid_argument("malformed seek"))?;

        let blocks = self.blocks.lock();
        let start = resolve_position(seek.start.as_ref(), &blocks);
        let stop = resolve_position(seek.stop.as_ref(), &blocks);

        let mut responses = Vec::new();
        if let (Some(start), Some(stop)) = (start, stop) {
            for (_, block) in blocks.range(start..=stop) {
                responses.push(Ok(OrdererDeliverResponse {
                    r#type: Some(deliver_response::Type::Block(block.clone())),
                }));
            }
        }
        responses.push(Ok(OrdererDeliverResponse {
            r#type: Some(deliver_response::Type::Status(WireStatus::Success as i32)),
        }));
        Ok(Response::new(Box::pin(stream::iter(responses))))
    }
}

// ---------------------------------------------------------------------------
// Peer deliver (filtered blocks)
// ---------------------------------------------------------------------------

/// Behavior of a mock filtered-block stream.
#[derive(Clone, Default)]
pub struct DeliverState {
    /// Blocks emitted as soon as the stream opens.
    pub initial_blocks: Vec<FilteredBlock>,
    /// When set, every envelope recorded in this log is reflected as a
    /// freshly committed (valid) filtered block. Used to close the loop
    /// between a mock orderer and the commit watcher.
    pub reflect: Option<Arc<Mutex<Vec<Envelope>>>>,
    /// Keep the stream open after the scripted blocks; when false the
    /// stream ends with a success status.
    pub hold_open: bool,
    /// Channel id stamped on reflected blocks.
    pub channel_id: String,
}

/// A peer deliver service scripted by [`DeliverState`].
#[derive(Clone, Default)]
pub struct MockPeerDeliver {
    state: Arc<DeliverState>,
}

impl MockPeerDeliver {
    pub fn new(state: DeliverState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// A stream that emits nothing and never ends; commit watches against
    /// it can only time out.
    pub fn silent() -> Self {
        Self::new(DeliverState {
            hold_open: true,
            ..Default::default()
        })
    }
}

#[tonic::async_trait]
impl Deliver for MockPeerDeliver {
    type DeliverFilteredStream = BoxedResponseStream<PeerDeliverResponse>;

    async fn deliver_filtered(
        &self,
        request: Request<Streaming<Envelope>>,
    ) -> Result<Response<Self::DeliverFilteredStream>, Status> {
        let mut inbound = request.into_inner();
        inbound
            .message()
            .await?
            .ok_or_else(|| Status::invalid_argument("missing seek request"))?;

        let state = Arc::clone(&self.state);
        let (tx, rx) = mpsc::channel::<Result<PeerDeliverResponse, Status>>(16);

        tokio::spawn(async move {
            let mut number = 0u64;
            for block in &state.initial_blocks {
                number = block.number;
                if tx
                    .send(Ok(PeerDeliverResponse {
                        r#type: Some(peer_deliver_response::Type::FilteredBlock(block.clone())),
                    }))
                    .await
                    .is_err()
                {
                    return;
                }
            }

            if let Some(log) = &state.reflect {
                let mut seen = 0usize;
                loop {
                    let pending: Vec<Envelope> = {
                        let log = log.lock();
                        log[seen.min(log.len())..].to_vec()
                    };
                    for envelope in pending {
                        seen += 1;
                        number += 1;
                        let block = FilteredBlock {
                            channel_id: state.channel_id.clone(),
                            number,
                            filtered_transactions: vec![FilteredTransaction {
                                tx_id: tx_id_of(&envelope),
                                tx_validation_code: TxValidationCode::Valid as i32,
                            }],
                        };
                        if tx
                            .send(Ok(PeerDeliverResponse {
                                r#type: Some(peer_deliver_response::Type::FilteredBlock(block)),
                            }))
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    if tx.is_closed() {
                        return;
                    }
                }
            }

            if state.hold_open {
                // Emit nothing further; exit once the client goes away.
                while !tx.is_closed() {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                return;
            }

            let _ = tx
                .send(Ok(PeerDeliverResponse {
                    r#type: Some(peer_deliver_response::Type::Status(
                        WireStatus::Success as i32,
                    )),
                }))
                .await;
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}

// ---------------------------------------------------------------------------
// Server plumbing
// ---------------------------------------------------------------------------

/// A spawned in-process gRPC server.
pub struct MockServer {
    pub address: String,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    /// An insecure [`Endpoint`] pointing at this server.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::insecure(&self.address).with_timeout(Duration::from_secs(2))
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a peer exposing the endorser and filtered-deliver surfaces.
pub async fn spawn_peer(endorser: MockEndorser, deliver: MockPeerDeliver) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr").to_string();
    let incoming = TcpListenerStream::new(listener);
    let handle = tokio::spawn(async move {
        let _ = Server::builder()
            .add_service(EndorserServer::new(endorser))
            .add_service(DeliverServer::new(deliver))
            .serve_with_incoming(incoming)
            .await;
    });
    MockServer { address, handle }
}

/// Spawns an ordering node exposing the atomic-broadcast surface.
pub async fn spawn_orderer(orderer: MockOrderer) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr").to_string();
    let incoming = TcpListenerStream::new(listener);
    let handle = tokio::spawn(async move {
        let _ = Server::builder()
            .add_service(AtomicBroadcastServer::new(orderer))
            .serve_with_incoming(incoming)
            .await;
    });
    MockServer { address, handle }
}
