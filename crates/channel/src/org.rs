//! Per-organization orchestration context.

use std::collections::BTreeMap;

use weft_client::Client;
use weft_types::Endpoint;

/// One organization's view of the network: its client identity, its nodes,
/// and the certificate material it publishes when on-boarding.
#[derive(Clone)]
pub struct OrgContext {
    /// Organization name.
    pub name: String,
    /// The MSP id the organization's certificates map to.
    pub msp_id: String,
    /// Protocol client signing as this organization's admin.
    pub client: Client,
    /// The organization's peers.
    pub peers: Vec<Endpoint>,
    /// The organization's ordering nodes.
    pub orderers: Vec<Endpoint>,
    /// Anchor-peer addresses published to channels.
    pub anchors: Vec<String>,
    /// Admin certificates by file name.
    pub admin_certs: BTreeMap<String, Vec<u8>>,
    /// CA root certificates by file name.
    pub ca_certs: BTreeMap<String, Vec<u8>>,
    /// TLS CA root certificates by file name.
    pub tls_ca_certs: BTreeMap<String, Vec<u8>>,
}

impl OrgContext {
    pub fn new(name: impl Into<String>, msp_id: impl Into<String>, client: Client) -> Self {
        Self {
            name: name.into(),
            msp_id: msp_id.into(),
            client,
            peers: Vec::new(),
            orderers: Vec::new(),
            anchors: Vec::new(),
            admin_certs: BTreeMap::new(),
            ca_certs: BTreeMap::new(),
            tls_ca_certs: BTreeMap::new(),
        }
    }

    pub fn with_peers(mut self, peers: Vec<Endpoint>) -> Self {
        self.peers = peers;
        self
    }

    pub fn with_orderers(mut self, orderers: Vec<Endpoint>) -> Self {
        self.orderers = orderers;
        self
    }

    pub fn with_anchors(mut self, anchors: Vec<String>) -> Self {
        self.anchors = anchors;
        self
    }
}
