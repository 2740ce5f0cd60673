//! Channel-creation configuration updates.

use std::collections::BTreeMap;

use weft_proto::common::{ConfigGroup, ConfigPolicy, ConfigUpdate, ConfigValue, Consortium};

use crate::org::{application_org_group, Organization};
use crate::{
    ADMINS_POLICY_KEY, APPLICATION_GROUP_KEY, CONSORTIUM_KEY, POLICY_ANY_READERS,
    POLICY_ANY_WRITERS, POLICY_MAJORITY_ADMINS, READERS_POLICY_KEY, WRITERS_POLICY_KEY,
};

/// Governance policies of a new application channel, as implicit-meta
/// expressions evaluated by the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelPolicies {
    pub admins: String,
    pub readers: String,
    pub writers: String,
}

impl Default for ChannelPolicies {
    fn default() -> Self {
        Self {
            admins: POLICY_MAJORITY_ADMINS.into(),
            readers: POLICY_ANY_READERS.into(),
            writers: POLICY_ANY_WRITERS.into(),
        }
    }
}

/// Parameters for creating an application channel under a consortium.
#[derive(Clone, Debug, Default)]
pub struct ChannelDefinition {
    /// The new channel's name.
    pub channel_id: String,
    /// Consortium the member organizations are drawn from.
    pub consortium: String,
    /// Member organizations (must be consortium members).
    pub organizations: Vec<Organization>,
    /// Channel governance policies; defaults apply when `None`.
    pub policies: Option<ChannelPolicies>,
}

fn implicit_policies(policies: &ChannelPolicies) -> BTreeMap<String, ConfigPolicy> {
    BTreeMap::from([
        (
            ADMINS_POLICY_KEY.to_string(),
            ConfigPolicy {
                version: 0,
                rule: policies.admins.clone(),
                mod_policy: ADMINS_POLICY_KEY.into(),
            },
        ),
        (
            READERS_POLICY_KEY.to_string(),
            ConfigPolicy {
                version: 0,
                rule: policies.readers.clone(),
                mod_policy: ADMINS_POLICY_KEY.into(),
            },
        ),
        (
            WRITERS_POLICY_KEY.to_string(),
            ConfigPolicy {
                version: 0,
                rule: policies.writers.clone(),
                mod_policy: ADMINS_POLICY_KEY.into(),
            },
        ),
    ])
}

/// Builds the configuration update that creates a new application channel.
///
/// The read-set references the consortium and the member organizations at
/// version zero; the write-set instantiates the application group (version
/// one, policies attached) with the full member definitions.
pub fn new_channel_update(definition: &ChannelDefinition) -> ConfigUpdate {
    let consortium_value = ConfigValue {
        version: 0,
        value: weft_proto::encode(&Consortium {
            name: definition.consortium.clone(),
        }),
        mod_policy: String::new(),
    };

    let mut read_app = ConfigGroup::default();
    let mut write_app = ConfigGroup {
        version: 1,
        mod_policy: ADMINS_POLICY_KEY.into(),
        policies: implicit_policies(&definition.policies.clone().unwrap_or_default()),
        ..Default::default()
    };
    for org in &definition.organizations {
        read_app
            .groups
            .insert(org.name.clone(), ConfigGroup::default());
        write_app
            .groups
            .insert(org.name.clone(), application_org_group(org));
    }

    let mut read_set = ConfigGroup::default();
    read_set
        .values
        .insert(CONSORTIUM_KEY.to_string(), consortium_value.clone());
    read_set
        .groups
        .insert(APPLICATION_GROUP_KEY.to_string(), read_app);

    let mut write_set = ConfigGroup::default();
    write_set
        .values
        .insert(CONSORTIUM_KEY.to_string(), consortium_value);
    write_set
        .groups
        .insert(APPLICATION_GROUP_KEY.to_string(), write_app);

    ConfigUpdate {
        channel_id: definition.channel_id.clone(),
        read_set: Some(read_set),
        write_set: Some(write_set),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_channel_update_references_and_instantiates() {
        let definition = ChannelDefinition {
            channel_id: "trades".into(),
            consortium: "defaultConsortium".into(),
            organizations: vec![Organization {
                name: "Org1MSP".into(),
                msp_id: "Org1MSP".into(),
                ..Default::default()
            }],
            policies: None,
        };

        let update = new_channel_update(&definition);
        assert_eq!(update.channel_id, "trades");

        let read = update.read_set.as_ref().unwrap();
        let write = update.write_set.as_ref().unwrap();

        let consortium: Consortium =
            weft_proto::decode(&read.values[CONSORTIUM_KEY].value).unwrap();
        assert_eq!(consortium.name, "defaultConsortium");

        // Read-set references the org bare; write-set carries it in full.
        assert!(read.groups[APPLICATION_GROUP_KEY].groups["Org1MSP"]
            .values
            .is_empty());
        assert!(write.groups[APPLICATION_GROUP_KEY].groups["Org1MSP"]
            .values
            .contains_key(crate::MSP_KEY));

        let app = &write.groups[APPLICATION_GROUP_KEY];
        assert_eq!(app.version, 1);
        assert_eq!(app.policies[ADMINS_POLICY_KEY].rule, POLICY_MAJORITY_ADMINS);
    }
}
