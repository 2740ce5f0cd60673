//! The per-identity protocol client.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use weft_configtx::block::last_config_index;
use weft_proto::common::{Block, ConfigSignature, Envelope};
use weft_types::config::ClientConfig;
use weft_types::error::{
    BroadcastError, ConfigTxError, EndorseError, IdentityError, OrchestrationError, WatchError,
};
use weft_types::identity::SigningIdentity;
use weft_types::Endpoint;

use crate::broadcast;
use crate::cache::IdentityCache;
use crate::deliver::request_block;
use crate::endorse::{self, Endorsed};
use crate::envelope::{
    config_update_envelope, seek_block, seek_envelope, seek_newest, transaction_envelope,
};
use crate::proposal::{program_proposal, BuiltProposal};
use crate::signer::MspSigner;
use crate::watch;

/// A protocol client bound to one organization's signing identity.
///
/// Cheap to clone; connections are opened per call and never pooled.
#[derive(Clone)]
pub struct Client {
    signer: Arc<MspSigner>,
    config: ClientConfig,
}

impl Client {
    pub fn new(signer: Arc<MspSigner>) -> Self {
        Self::with_config(signer, ClientConfig::default())
    }

    pub fn with_config(signer: Arc<MspSigner>, config: ClientConfig) -> Self {
        Self { signer, config }
    }

    /// Builds a client whose identity comes from `cache`, materializing
    /// the MSP directory on first use.
    pub fn from_cache(
        cache: &IdentityCache,
        name: &str,
        msp_id: &str,
        msp_dir: impl AsRef<Path>,
    ) -> Result<Self, IdentityError> {
        Ok(Self::new(cache.get_or_load(name, msp_id, msp_dir)?))
    }

    pub fn signer(&self) -> &Arc<MspSigner> {
        &self.signer
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn creator(&self) -> Vec<u8> {
        self.signer.serialize()
    }

    /// Endorses an invocation with first-success failover over `peers`.
    pub async fn endorse(
        &self,
        channel_id: &str,
        program: &str,
        args: Vec<Vec<u8>>,
        transient: BTreeMap<String, Vec<u8>>,
        peers: &[Endpoint],
    ) -> Result<Endorsed, EndorseError> {
        let built = program_proposal(channel_id, program, args, transient, &self.creator())?;
        self.endorse_proposal(built, peers).await
    }

    /// Endorses an invocation against *every* peer, requiring all
    /// successful responses to be byte-identical.
    pub async fn endorse_all(
        &self,
        channel_id: &str,
        program: &str,
        args: Vec<Vec<u8>>,
        transient: BTreeMap<String, Vec<u8>>,
        peers: &[Endpoint],
    ) -> Result<Endorsed, EndorseError> {
        let built = program_proposal(channel_id, program, args, transient, &self.creator())?;
        endorse::endorse_all(&*self.signer, built, peers).await
    }

    /// Endorses an already-built proposal with first-success failover.
    pub async fn endorse_proposal(
        &self,
        built: BuiltProposal,
        peers: &[Endpoint],
    ) -> Result<Endorsed, EndorseError> {
        endorse::endorse(&*self.signer, built, peers).await
    }

    /// Assembles the transaction envelope for `endorsed` and submits it
    /// with orderer failover.
    pub async fn submit(
        &self,
        endorsed: &Endorsed,
        orderers: &[Endpoint],
    ) -> Result<(), OrchestrationError> {
        let envelope =
            transaction_envelope(&*self.signer, &endorsed.proposal, &endorsed.responses)?;
        self.broadcast_envelope(&envelope, orderers).await?;
        Ok(())
    }

    /// Broadcasts an assembled envelope with orderer failover.
    pub async fn broadcast_envelope(
        &self,
        envelope: &Envelope,
        orderers: &[Endpoint],
    ) -> Result<(), BroadcastError> {
        broadcast::broadcast(envelope, orderers).await
    }

    /// Signs a pending configuration update with this client's identity.
    pub fn sign_config_update(&self, update_bytes: &[u8]) -> Result<ConfigSignature, ConfigTxError> {
        weft_configtx::sign_update(update_bytes, &*self.signer)
    }

    /// Wraps a co-signed configuration update into a channel envelope and
    /// broadcasts it with orderer failover.
    pub async fn update_channel(
        &self,
        channel_id: &str,
        update_bytes: Vec<u8>,
        signatures: Vec<ConfigSignature>,
        orderers: &[Endpoint],
    ) -> Result<(), OrchestrationError> {
        let envelope =
            config_update_envelope(&*self.signer, channel_id, update_bytes, signatures)?;
        self.broadcast_envelope(&envelope, orderers).await?;
        Ok(())
    }

    /// Waits for `tx_id` to commit on `committer`, up to `timeout`
    /// (defaulting to the configured commit timeout).
    pub async fn wait_for_commit(
        &self,
        channel_id: &str,
        tx_id: &str,
        committer: &Endpoint,
        timeout: Option<Duration>,
    ) -> Result<bool, WatchError> {
        let timeout = timeout.unwrap_or_else(|| self.config.timeouts.commit());
        watch::wait_for_commit(&*self.signer, channel_id, tx_id, committer, timeout).await
    }

    /// Fetches the newest block of `channel_id` from one orderer.
    pub async fn newest_block(
        &self,
        channel_id: &str,
        orderer: &Endpoint,
    ) -> Result<Block, WatchError> {
        let request = seek_envelope(&*self.signer, channel_id, seek_newest())
            .map_err(|e| WatchError::Stream(e.to_string()))?;
        request_block(orderer, request).await
    }

    /// Fetches block `index` of `channel_id` from one orderer.
    pub async fn block_by_index(
        &self,
        channel_id: &str,
        index: u64,
        orderer: &Endpoint,
    ) -> Result<Block, WatchError> {
        let request = seek_envelope(&*self.signer, channel_id, seek_block(index))
            .map_err(|e| WatchError::Stream(e.to_string()))?;
        request_block(orderer, request).await
    }

    /// Fetches the current configuration block of `channel_id`: newest
    /// block, follow its last-config pointer, fetch that block.
    pub async fn config_block(
        &self,
        channel_id: &str,
        orderer: &Endpoint,
    ) -> Result<Block, WatchError> {
        let newest = self.newest_block(channel_id, orderer).await?;
        let index =
            last_config_index(&newest).map_err(|e| WatchError::Stream(e.to_string()))?;
        self.block_by_index(channel_id, index, orderer).await
    }
}
