//! Multi-organization governance: admitting and removing organizations.
//!
//! Both operations update two channels: the ordering-system channel that
//! carries consortium membership, then the target application channel.
//! The system-channel update must be accepted before the application
//! update is attempted; a failure after that point surfaces as
//! [`OrchestrationError::AppChannelUpdate`] so operators resume with the
//! application channel instead of replaying the whole change.

use std::collections::BTreeMap;

use tracing::info;
use weft_client::failover::try_each;
use weft_configtx::block::config_from_block;
use weft_configtx::org::{add_org_update, del_org_update};
use weft_configtx::{AddOrg, Computed, Organization};
use weft_proto::common::ConfigSignature;
use weft_types::bundle::IdentityBundle;
use weft_types::error::OrchestrationError;
use weft_types::{DEFAULT_CONSORTIUM, DEFAULT_SYSTEM_CHANNEL};

use crate::channel::Channel;

fn organization_from_bundle(bundle: &IdentityBundle) -> Organization {
    Organization {
        name: bundle.msp_id.clone(),
        msp_id: bundle.msp_id.clone(),
        root_certs: bundle.ca_certs.values().cloned().collect(),
        admin_certs: bundle.admin_certs.values().cloned().collect(),
        tls_root_certs: bundle.tls_ca_certs.values().cloned().collect(),
        anchor_peers: bundle.anchors.clone(),
    }
}

impl Channel {
    /// Exports the operating organization's identity bundle for an
    /// existing network to consume.
    pub fn identity_bundle(&self) -> IdentityBundle {
        let operator = self.operator();
        IdentityBundle {
            org: operator.name.clone(),
            msp_id: operator.msp_id.clone(),
            orderers: operator.orderers.iter().map(|e| e.address.clone()).collect(),
            anchors: operator.anchors.clone(),
            channel_peers: operator.peers.iter().map(|e| e.address.clone()).collect(),
            admin_certs: operator.admin_certs.clone(),
            ca_certs: operator.ca_certs.clone(),
            tls_ca_certs: operator.tls_ca_certs.clone(),
        }
    }

    /// Parses a JSON identity bundle and admits the organization it
    /// describes to `channel_id` (and the system channel).
    pub async fn add_org_from_json(
        &self,
        bundle_json: &[u8],
        channel_id: &str,
    ) -> Result<(), OrchestrationError> {
        let bundle = IdentityBundle::from_json(bundle_json)
            .map_err(OrchestrationError::InvalidBundle)?;
        self.add_org(&bundle, channel_id).await
    }

    /// Admits the organization described by `bundle`: consortium and
    /// ordering membership on the system channel, application and
    /// ordering membership on `channel_id`, each signed by every
    /// organization of this context.
    pub async fn add_org(
        &self,
        bundle: &IdentityBundle,
        channel_id: &str,
    ) -> Result<(), OrchestrationError> {
        let org = organization_from_bundle(bundle);
        info!(org = %org.msp_id, channel = channel_id, "admitting organization");

        let system_request = AddOrg {
            orderer_orgs: vec![org.clone()],
            consortium_orgs: BTreeMap::from([(DEFAULT_CONSORTIUM.to_string(), vec![org.clone()])]),
            orderer_addresses: bundle.orderers.clone(),
            ..Default::default()
        };
        let channel_request = AddOrg {
            orderer_orgs: vec![org.clone()],
            application_orgs: vec![org],
            orderer_addresses: bundle.orderers.clone(),
            ..Default::default()
        };

        let system = self
            .computed_update(DEFAULT_SYSTEM_CHANNEL, |config| {
                add_org_update(DEFAULT_SYSTEM_CHANNEL, config, &system_request)
            })
            .await?;
        let application = self
            .computed_update(channel_id, |config| {
                add_org_update(channel_id, config, &channel_request)
            })
            .await?;

        self.broadcast_governance(channel_id, system, application)
            .await
    }

    /// Removes `org_name` (and any listed orderer addresses) from the
    /// system channel and from `channel_id`.
    pub async fn delete_org(
        &self,
        org_name: &str,
        orderer_addresses: &[String],
        channel_id: &str,
    ) -> Result<(), OrchestrationError> {
        info!(org = org_name, channel = channel_id, "removing organization");

        let system = self
            .computed_update(DEFAULT_SYSTEM_CHANNEL, |config| {
                del_org_update(DEFAULT_SYSTEM_CHANNEL, config, org_name, orderer_addresses)
            })
            .await?;
        let application = self
            .computed_update(channel_id, |config| {
                del_org_update(channel_id, config, org_name, orderer_addresses)
            })
            .await?;

        self.broadcast_governance(channel_id, system, application)
            .await
    }

    /// Fetches `channel_id`'s current configuration (orderer failover) and
    /// runs the delta computation against it.
    async fn computed_update<F>(
        &self,
        channel_id: &str,
        compute: F,
    ) -> Result<Computed, OrchestrationError>
    where
        F: Fn(&weft_proto::common::Config) -> Result<Computed, weft_types::error::ConfigTxError>,
    {
        let operator = self.operator();
        let block = try_each(&operator.orderers, |orderer| {
            let client = operator.client.clone();
            async move { client.config_block(channel_id, &orderer).await }
        })
        .await?;
        let config = config_from_block(&block)?;
        Ok(compute(&config)?)
    }

    fn co_sign(&self, update_bytes: &[u8]) -> Result<Vec<ConfigSignature>, OrchestrationError> {
        self.orgs()
            .iter()
            .map(|org| org.client.sign_config_update(update_bytes))
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Broadcasts a pair of governance updates in the mandatory order:
    /// system channel first, application channel only after it succeeds.
    /// A no-op on either side is skipped as satisfied.
    async fn broadcast_governance(
        &self,
        channel_id: &str,
        system: Computed,
        application: Computed,
    ) -> Result<(), OrchestrationError> {
        let operator = self.operator();

        match system.into_update() {
            Some(update) => {
                let bytes = weft_proto::encode(&update);
                let signatures = self.co_sign(&bytes)?;
                operator
                    .client
                    .update_channel(DEFAULT_SYSTEM_CHANNEL, bytes, signatures, &operator.orderers)
                    .await?;
                info!("system channel update accepted");
            }
            None => info!("system channel already satisfies the requested state"),
        }

        match application.into_update() {
            Some(update) => {
                // From here on the system channel is already updated, so
                // any failure must carry the resumable partial-progress
                // shape.
                let wrap = |source: OrchestrationError| OrchestrationError::AppChannelUpdate {
                    channel: channel_id.to_string(),
                    source: Box::new(source),
                };
                let bytes = weft_proto::encode(&update);
                let signatures = self.co_sign(&bytes).map_err(wrap)?;
                operator
                    .client
                    .update_channel(channel_id, bytes, signatures, &operator.orderers)
                    .await
                    .map_err(wrap)?;
                info!(channel = channel_id, "application channel update accepted");
            }
            None => {
                info!(channel = channel_id, "application channel already satisfies the requested state")
            }
        }
        Ok(())
    }
}
