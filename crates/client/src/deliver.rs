//! Block delivery streams.
//!
//! A [`BlockStream`] decouples the network receive loop from its consumer:
//! the loop runs on its own task and pushes decoded blocks into a bounded
//! hand-off queue, with a distinct channel for the terminal error. Closing
//! the stream is idempotent and non-blocking: the receive task is torn
//! down immediately, and any send it had in flight is discarded rather
//! than deadlocked.

use futures::stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tonic::{Request, Streaming};
use tracing::debug;
use weft_proto::common::{Block, Envelope, Status};
use weft_proto::orderer::atomic_broadcast_client::AtomicBroadcastClient;
use weft_proto::peer::deliver_client::DeliverClient;
use weft_proto::peer::FilteredBlock;
use weft_types::error::WatchError;
use weft_types::Endpoint;

use crate::connection::connect;

/// Capacity of the hand-off queue between the receive loop and consumer.
const HANDOFF_CAPACITY: usize = 16;

/// Classification of one deliver response.
pub enum Classified<T> {
    Block(T),
    Status(i32),
    Unknown,
}

/// A block kind deliverable over a streaming RPC.
pub trait Deliverable: Sized + Send + 'static {
    type Response: Send + 'static;

    fn classify(response: Self::Response) -> Classified<Self>;
}

impl Deliverable for FilteredBlock {
    type Response = weft_proto::peer::DeliverResponse;

    fn classify(response: Self::Response) -> Classified<Self> {
        use weft_proto::peer::deliver_response::Type;
        match response.r#type {
            Some(Type::FilteredBlock(block)) => Classified::Block(block),
            Some(Type::Status(status)) => Classified::Status(status),
            None => Classified::Unknown,
        }
    }
}

impl Deliverable for Block {
    type Response = weft_proto::orderer::DeliverResponse;

    fn classify(response: Self::Response) -> Classified<Self> {
        use weft_proto::orderer::deliver_response::Type;
        match response.r#type {
            Some(Type::Block(block)) => Classified::Block(block),
            Some(Type::Status(status)) => Classified::Status(status),
            None => Classified::Unknown,
        }
    }
}

/// A live block stream: background receive loop plus consumer cursor.
pub struct BlockStream<T> {
    blocks: mpsc::Receiver<T>,
    errors: mpsc::Receiver<WatchError>,
    task: JoinHandle<()>,
    closed: bool,
}

impl<T: Deliverable> BlockStream<T> {
    fn spawn(mut inbound: Streaming<T::Response>) -> Self {
        let (block_tx, block_rx) = mpsc::channel(HANDOFF_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            loop {
                match inbound.message().await {
                    Ok(Some(response)) => match T::classify(response) {
                        Classified::Block(block) => {
                            // The consumer closing its end discards this
                            // send instead of blocking the loop.
                            if block_tx.send(block).await.is_err() {
                                return;
                            }
                        }
                        Classified::Status(status) => {
                            if status != Status::Success as i32 {
                                let _ = error_tx.try_send(WatchError::BadStatus(status));
                            }
                            return;
                        }
                        Classified::Unknown => {
                            let _ = error_tx
                                .try_send(WatchError::Stream("unrecognized response".into()));
                            return;
                        }
                    },
                    Ok(None) => return,
                    Err(status) => {
                        let _ = error_tx.try_send(WatchError::Stream(status.to_string()));
                        return;
                    }
                }
            }
        });

        Self {
            blocks: block_rx,
            errors: error_rx,
            task,
            closed: false,
        }
    }

    /// Blocks until the next item, the stream's terminal error, or close.
    pub async fn next(&mut self) -> Result<T, WatchError> {
        if self.closed {
            return Err(WatchError::Closed);
        }
        match self.blocks.recv().await {
            Some(block) => Ok(block),
            None => match self.errors.try_recv() {
                Ok(err) => Err(err),
                Err(_) => Err(WatchError::StreamEnded),
            },
        }
    }

    /// Tears the stream down: deterministic, non-blocking, and safe to
    /// call any number of times. The receive loop never outlives this
    /// call's return.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.blocks.close();
        self.errors.close();
        self.task.abort();
        debug!("block stream closed");
    }

    /// Whether the background receive loop has fully terminated.
    pub fn is_terminated(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for BlockStream<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Opens a filtered-block stream from a peer for the given seek envelope.
pub async fn filtered_stream(
    peer: &Endpoint,
    request: Envelope,
) -> Result<BlockStream<FilteredBlock>, WatchError> {
    let channel = connect(peer).await?;
    let mut client = DeliverClient::new(channel);
    let inbound = client
        .deliver_filtered(Request::new(stream::iter(vec![request])))
        .await
        .map_err(|status| WatchError::Stream(status.to_string()))?
        .into_inner();
    Ok(BlockStream::spawn(inbound))
}

/// Opens a full-block stream from an orderer for the given seek envelope.
pub async fn block_stream(
    orderer: &Endpoint,
    request: Envelope,
) -> Result<BlockStream<Block>, WatchError> {
    let channel = connect(orderer).await?;
    let mut client = AtomicBroadcastClient::new(channel);
    let inbound = client
        .deliver(Request::new(stream::iter(vec![request])))
        .await
        .map_err(|status| WatchError::Stream(status.to_string()))?
        .into_inner();
    Ok(BlockStream::spawn(inbound))
}

/// Fetches a single block: opens a stream, reads one item, tears down.
pub async fn request_block(orderer: &Endpoint, request: Envelope) -> Result<Block, WatchError> {
    let mut stream = block_stream(orderer, request).await?;
    let block = stream.next().await;
    stream.close();
    block
}
