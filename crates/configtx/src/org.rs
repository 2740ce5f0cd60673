//! Organization groups and topology mutations over a configuration tree.

use std::collections::BTreeMap;

use tracing::debug;
use weft_proto::common::{
    AnchorPeer, AnchorPeers, Config, ConfigGroup, ConfigPolicy, ConfigValue, MspMaterial,
    OrdererAddresses,
};
use weft_types::error::ConfigTxError;

use crate::update::{compute, Computed};
use crate::{
    ADMINS_POLICY_KEY, ANCHOR_PEERS_KEY, APPLICATION_GROUP_KEY, CONSORTIUMS_GROUP_KEY, MSP_KEY,
    ORDERER_ADDRESSES_KEY, ORDERER_GROUP_KEY, READERS_POLICY_KEY, WRITERS_POLICY_KEY,
};

/// Definition of an organization being added to a channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Organization {
    /// Group name under the parent (conventionally the MSP id).
    pub name: String,
    /// The MSP id the organization's certificates map to.
    pub msp_id: String,
    /// CA root certificates (PEM).
    pub root_certs: Vec<Vec<u8>>,
    /// Admin certificates (PEM).
    pub admin_certs: Vec<Vec<u8>>,
    /// TLS CA root certificates (PEM).
    pub tls_root_certs: Vec<Vec<u8>>,
    /// Anchor-peer addresses, `host:port` with an optional scheme prefix.
    pub anchor_peers: Vec<String>,
}

/// A requested topology extension: organizations per parent group plus new
/// orderer addresses.
#[derive(Clone, Debug, Default)]
pub struct AddOrg {
    /// Organizations joining the ordering-organizations group.
    pub orderer_orgs: Vec<Organization>,
    /// Organizations joining the application-organizations group.
    pub application_orgs: Vec<Organization>,
    /// Organizations joining named consortiums (system channel only).
    pub consortium_orgs: BTreeMap<String, Vec<Organization>>,
    /// Orderer addresses to union into the channel's address list.
    pub orderer_addresses: Vec<String>,
}

fn signature_policy(role: &str, msp_id: &str) -> String {
    format!("OutOf(1, '{msp_id}.{role}')")
}

fn org_policies(msp_id: &str) -> BTreeMap<String, ConfigPolicy> {
    let mut policies = BTreeMap::new();
    for (key, role) in [
        (ADMINS_POLICY_KEY, "admin"),
        (READERS_POLICY_KEY, "member"),
        (WRITERS_POLICY_KEY, "member"),
    ] {
        policies.insert(
            key.to_string(),
            ConfigPolicy {
                version: 0,
                rule: signature_policy(role, msp_id),
                mod_policy: ADMINS_POLICY_KEY.into(),
            },
        );
    }
    policies
}

fn msp_value(org: &Organization) -> ConfigValue {
    let material = MspMaterial {
        msp_id: org.msp_id.clone(),
        root_certs: org.root_certs.clone(),
        admin_certs: org.admin_certs.clone(),
        tls_root_certs: org.tls_root_certs.clone(),
    };
    ConfigValue {
        version: 0,
        value: weft_proto::encode(&material),
        mod_policy: ADMINS_POLICY_KEY.into(),
    }
}

fn parse_anchor(address: &str) -> AnchorPeer {
    let bare = address.rsplit("://").next().unwrap_or(address);
    match bare.rsplit_once(':') {
        Some((host, port)) => AnchorPeer {
            host: host.to_string(),
            port: port.parse().unwrap_or(0),
        },
        None => AnchorPeer {
            host: bare.to_string(),
            port: 0,
        },
    }
}

/// Builds the configuration group of an ordering organization.
pub fn orderer_org_group(org: &Organization) -> ConfigGroup {
    ConfigGroup {
        version: 0,
        mod_policy: ADMINS_POLICY_KEY.into(),
        policies: org_policies(&org.msp_id),
        values: BTreeMap::from([(MSP_KEY.to_string(), msp_value(org))]),
        ..Default::default()
    }
}

/// Builds the configuration group of an application organization, anchor
/// peers included when the definition carries any.
pub fn application_org_group(org: &Organization) -> ConfigGroup {
    let mut group = orderer_org_group(org);
    if !org.anchor_peers.is_empty() {
        let anchors = AnchorPeers {
            anchor_peers: org.anchor_peers.iter().map(|a| parse_anchor(a)).collect(),
        };
        group.values.insert(
            ANCHOR_PEERS_KEY.to_string(),
            ConfigValue {
                version: 0,
                value: weft_proto::encode(&anchors),
                mod_policy: ADMINS_POLICY_KEY.into(),
            },
        );
    }
    group
}

fn channel_group_mut(config: &mut Config) -> Result<&mut ConfigGroup, ConfigTxError> {
    config
        .channel_group
        .as_mut()
        .ok_or_else(|| ConfigTxError::MissingGroup("channel".into()))
}

fn subgroup_mut<'a>(
    parent: &'a mut ConfigGroup,
    key: &str,
) -> Result<&'a mut ConfigGroup, ConfigTxError> {
    parent
        .groups
        .get_mut(key)
        .ok_or_else(|| ConfigTxError::MissingGroup(key.into()))
}

fn union_orderer_addresses(
    channel: &mut ConfigGroup,
    additions: &[String],
) -> Result<(), ConfigTxError> {
    let entry = channel
        .values
        .entry(ORDERER_ADDRESSES_KEY.to_string())
        .or_insert_with(|| ConfigValue {
            version: 0,
            value: weft_proto::encode(&OrdererAddresses::default()),
            mod_policy: ADMINS_POLICY_KEY.into(),
        });
    let mut addresses: OrdererAddresses =
        weft_proto::decode(&entry.value).map_err(ConfigTxError::Decode)?;
    for addition in additions {
        if !addresses.addresses.iter().any(|a| a == addition) {
            addresses.addresses.push(addition.clone());
        }
    }
    entry.value = weft_proto::encode(&addresses);
    Ok(())
}

fn remove_orderer_addresses(
    channel: &mut ConfigGroup,
    removals: &[String],
) -> Result<(), ConfigTxError> {
    let entry = match channel.values.get_mut(ORDERER_ADDRESSES_KEY) {
        Some(entry) => entry,
        None => return Ok(()),
    };
    let mut addresses: OrdererAddresses =
        weft_proto::decode(&entry.value).map_err(ConfigTxError::Decode)?;
    addresses
        .addresses
        .retain(|address| !removals.iter().any(|r| r == address));
    entry.value = weft_proto::encode(&addresses);
    Ok(())
}

/// Computes the update admitting the requested organizations into
/// `channel_id`'s configuration.
///
/// The current tree is cloned and mutated; the result is the minimal delta
/// between the two. Requesting a topology that is already in place yields
/// [`Computed::NoChange`].
pub fn add_org_update(
    channel_id: &str,
    current: &Config,
    request: &AddOrg,
) -> Result<Computed, ConfigTxError> {
    let mut modified = current.clone();
    let channel = channel_group_mut(&mut modified)?;

    if !request.orderer_addresses.is_empty() {
        union_orderer_addresses(channel, &request.orderer_addresses)?;
    }

    if !request.orderer_orgs.is_empty() {
        let orderer = subgroup_mut(channel, ORDERER_GROUP_KEY)?;
        for org in &request.orderer_orgs {
            orderer
                .groups
                .insert(org.name.clone(), orderer_org_group(org));
        }
    }

    for (consortium, orgs) in &request.consortium_orgs {
        let consortiums = subgroup_mut(channel, CONSORTIUMS_GROUP_KEY)?;
        let group = consortiums
            .groups
            .entry(consortium.clone())
            .or_insert_with(|| ConfigGroup {
                version: 0,
                mod_policy: ADMINS_POLICY_KEY.into(),
                ..Default::default()
            });
        for org in orgs {
            group.groups.insert(org.name.clone(), orderer_org_group(org));
        }
    }

    if !request.application_orgs.is_empty() {
        let application = subgroup_mut(channel, APPLICATION_GROUP_KEY)?;
        for org in &request.application_orgs {
            application
                .groups
                .insert(org.name.clone(), application_org_group(org));
        }
    }

    debug!(channel = channel_id, "computing add-org update");
    compute(channel_id, current, &modified)
}

/// Computes the update removing `org_name` (and any listed orderer
/// addresses) from `channel_id`'s configuration.
///
/// The organization's group is removed from whichever parents carry it:
/// the ordering group, every consortium, and the application group. A
/// request naming an organization that is already absent yields
/// [`Computed::NoChange`].
pub fn del_org_update(
    channel_id: &str,
    current: &Config,
    org_name: &str,
    orderer_addresses: &[String],
) -> Result<Computed, ConfigTxError> {
    let mut modified = current.clone();
    let channel = channel_group_mut(&mut modified)?;

    if !orderer_addresses.is_empty() {
        remove_orderer_addresses(channel, orderer_addresses)?;
    }

    if let Some(orderer) = channel.groups.get_mut(ORDERER_GROUP_KEY) {
        orderer.groups.remove(org_name);
    }
    if let Some(consortiums) = channel.groups.get_mut(CONSORTIUMS_GROUP_KEY) {
        for consortium in consortiums.groups.values_mut() {
            consortium.groups.remove(org_name);
        }
    }
    if let Some(application) = channel.groups.get_mut(APPLICATION_GROUP_KEY) {
        application.groups.remove(org_name);
    }

    debug!(channel = channel_id, org = org_name, "computing del-org update");
    compute(channel_id, current, &modified)
}
