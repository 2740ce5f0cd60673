//! Channel lifecycle: creation and joining.

use tracing::info;
use weft_client::failover::try_each;
use weft_client::proposal::join_proposal;
use weft_configtx::create::{new_channel_update, ChannelDefinition};
use weft_configtx::Organization;
use weft_types::error::OrchestrationError;
use weft_types::identity::SigningIdentity;
use weft_types::DEFAULT_CONSORTIUM;

use crate::org::OrgContext;

/// Multi-organization orchestration over one channel's membership.
///
/// The first organization in the list is the operating organization: its
/// identity signs outward requests and its nodes are the default targets,
/// while every organization co-signs governance updates.
pub struct Channel {
    orgs: Vec<OrgContext>,
}

impl Channel {
    pub fn new(orgs: Vec<OrgContext>) -> Result<Self, OrchestrationError> {
        if orgs.is_empty() {
            return Err(OrchestrationError::InvalidArgument(
                "at least one organization is required".into(),
            ));
        }
        Ok(Self { orgs })
    }

    pub fn orgs(&self) -> &[OrgContext] {
        &self.orgs
    }

    pub(crate) fn operator(&self) -> &OrgContext {
        &self.orgs[0]
    }

    fn organization_of(org: &OrgContext) -> Organization {
        Organization {
            name: org.msp_id.clone(),
            msp_id: org.msp_id.clone(),
            root_certs: org.ca_certs.values().cloned().collect(),
            admin_certs: org.admin_certs.values().cloned().collect(),
            tls_root_certs: org.tls_ca_certs.values().cloned().collect(),
            anchor_peers: org.anchors.clone(),
        }
    }

    /// Creates `channel_id` under the default consortium with every
    /// organization of this context as a member.
    pub async fn create_channel(&self, channel_id: &str) -> Result<(), OrchestrationError> {
        let definition = ChannelDefinition {
            channel_id: channel_id.to_string(),
            consortium: DEFAULT_CONSORTIUM.to_string(),
            organizations: self.orgs.iter().map(Self::organization_of).collect(),
            policies: None,
        };
        let update = new_channel_update(&definition);
        let update_bytes = weft_proto::encode(&update);

        let operator = self.operator();
        let signature = operator.client.sign_config_update(&update_bytes)?;
        operator
            .client
            .update_channel(channel_id, update_bytes, vec![signature], &operator.orderers)
            .await?;
        info!(channel = channel_id, "channel creation submitted");
        Ok(())
    }

    /// Joins the operating organization's peers to `channel_id`.
    ///
    /// The genesis block is fetched from the orderers with failover; the
    /// join proposal is then sent to *every* peer. Joining has per-peer
    /// effect, so a peer failing fails the operation.
    pub async fn join_channel(&self, channel_id: &str) -> Result<(), OrchestrationError> {
        let operator = self.operator();
        let genesis = try_each(&operator.orderers, |orderer| {
            let client = operator.client.clone();
            async move { client.block_by_index(channel_id, 0, &orderer).await }
        })
        .await?;
        let genesis_bytes = weft_proto::encode(&genesis);

        let creator = operator.client.signer().serialize();
        let built = join_proposal(genesis_bytes, &creator)?;
        for peer in &operator.peers {
            operator
                .client
                .endorse_proposal(built.clone(), std::slice::from_ref(peer))
                .await?;
            info!(channel = channel_id, peer = %peer.address, "peer joined channel");
        }
        Ok(())
    }
}
