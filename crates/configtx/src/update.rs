//! Minimal structural delta between two configuration trees.
//!
//! The delta is expressed as a parallel read-set (versioned references the
//! update depends on) and write-set (the changed items at incremented
//! versions). Unchanged members referenced by a changed group appear as
//! version-only entries in both sets; members deleted from a group are
//! simply absent from the write-set of the version-bumped parent.

use std::collections::BTreeMap;

use weft_proto::common::{Config, ConfigGroup, ConfigPolicy, ConfigUpdate, ConfigValue};
use weft_types::error::ConfigTxError;

/// Outcome of a delta computation.
///
/// Computing an update against an already-satisfied target state is not an
/// error: it yields [`Computed::NoChange`], and callers skip signing and
/// broadcast for it.
#[derive(Clone, Debug, PartialEq)]
pub enum Computed {
    /// The trees differ; this update transforms the original into the
    /// modified tree.
    Update(ConfigUpdate),
    /// The trees are identical; there is nothing to broadcast.
    NoChange,
}

impl Computed {
    /// The contained update, if the computation found a difference.
    pub fn into_update(self) -> Option<ConfigUpdate> {
        match self {
            Computed::Update(update) => Some(update),
            Computed::NoChange => None,
        }
    }
}

/// Computes the minimal update transforming `original` into `updated`.
pub fn compute(
    channel_id: &str,
    original: &Config,
    updated: &Config,
) -> Result<Computed, ConfigTxError> {
    let original_group = original
        .channel_group
        .as_ref()
        .ok_or_else(|| ConfigTxError::MissingGroup("channel".into()))?;
    let updated_group = updated
        .channel_group
        .as_ref()
        .ok_or_else(|| ConfigTxError::MissingGroup("channel".into()))?;

    let (read_set, write_set, changed) = compute_group_update(original_group, updated_group);
    if !changed {
        return Ok(Computed::NoChange);
    }

    Ok(Computed::Update(ConfigUpdate {
        channel_id: channel_id.to_string(),
        read_set: Some(read_set),
        write_set: Some(write_set),
    }))
}

fn value_reference(version: u64) -> ConfigValue {
    ConfigValue {
        version,
        ..Default::default()
    }
}

fn policy_reference(version: u64) -> ConfigPolicy {
    ConfigPolicy {
        version,
        ..Default::default()
    }
}

fn group_reference(version: u64) -> ConfigGroup {
    ConfigGroup {
        version,
        ..Default::default()
    }
}

/// Returns (write_set, same_set, members_changed) for a values map.
fn compute_values_update(
    original: &BTreeMap<String, ConfigValue>,
    updated: &BTreeMap<String, ConfigValue>,
) -> (
    BTreeMap<String, ConfigValue>,
    BTreeMap<String, ConfigValue>,
    bool,
) {
    let mut write_set = BTreeMap::new();
    let mut same_set = BTreeMap::new();
    let mut members_changed = false;

    for (name, original_value) in original {
        match updated.get(name) {
            None => members_changed = true,
            Some(updated_value)
                if updated_value.mod_policy == original_value.mod_policy
                    && updated_value.value == original_value.value =>
            {
                same_set.insert(name.clone(), value_reference(original_value.version));
            }
            Some(updated_value) => {
                write_set.insert(
                    name.clone(),
                    ConfigValue {
                        version: original_value.version + 1,
                        value: updated_value.value.clone(),
                        mod_policy: updated_value.mod_policy.clone(),
                    },
                );
            }
        }
    }

    for (name, updated_value) in updated {
        if original.contains_key(name) {
            continue;
        }
        members_changed = true;
        write_set.insert(
            name.clone(),
            ConfigValue {
                version: 0,
                value: updated_value.value.clone(),
                mod_policy: updated_value.mod_policy.clone(),
            },
        );
    }

    (write_set, same_set, members_changed)
}

/// Returns (write_set, same_set, members_changed) for a policies map.
fn compute_policies_update(
    original: &BTreeMap<String, ConfigPolicy>,
    updated: &BTreeMap<String, ConfigPolicy>,
) -> (
    BTreeMap<String, ConfigPolicy>,
    BTreeMap<String, ConfigPolicy>,
    bool,
) {
    let mut write_set = BTreeMap::new();
    let mut same_set = BTreeMap::new();
    let mut members_changed = false;

    for (name, original_policy) in original {
        match updated.get(name) {
            None => members_changed = true,
            Some(updated_policy)
                if updated_policy.mod_policy == original_policy.mod_policy
                    && updated_policy.rule == original_policy.rule =>
            {
                same_set.insert(name.clone(), policy_reference(original_policy.version));
            }
            Some(updated_policy) => {
                write_set.insert(
                    name.clone(),
                    ConfigPolicy {
                        version: original_policy.version + 1,
                        rule: updated_policy.rule.clone(),
                        mod_policy: updated_policy.mod_policy.clone(),
                    },
                );
            }
        }
    }

    for (name, updated_policy) in updated {
        if original.contains_key(name) {
            continue;
        }
        members_changed = true;
        write_set.insert(
            name.clone(),
            ConfigPolicy {
                version: 0,
                rule: updated_policy.rule.clone(),
                mod_policy: updated_policy.mod_policy.clone(),
            },
        );
    }

    (write_set, same_set, members_changed)
}

/// Returns (read_set, write_set, same_set, members_changed) for a groups map.
#[allow(clippy::type_complexity)]
fn compute_groups_update(
    original: &BTreeMap<String, ConfigGroup>,
    updated: &BTreeMap<String, ConfigGroup>,
) -> (
    BTreeMap<String, ConfigGroup>,
    BTreeMap<String, ConfigGroup>,
    BTreeMap<String, ConfigGroup>,
    bool,
) {
    let mut read_set = BTreeMap::new();
    let mut write_set = BTreeMap::new();
    let mut same_set = BTreeMap::new();
    let mut members_changed = false;

    for (name, original_group) in original {
        match updated.get(name) {
            None => members_changed = true,
            Some(updated_group) => {
                let (group_read, group_write, group_changed) =
                    compute_group_update(original_group, updated_group);
                if group_changed {
                    read_set.insert(name.clone(), group_read);
                    write_set.insert(name.clone(), group_write);
                } else {
                    same_set.insert(name.clone(), group_read);
                }
            }
        }
    }

    for (name, updated_group) in updated {
        if original.contains_key(name) {
            continue;
        }
        members_changed = true;
        write_set.insert(
            name.clone(),
            ConfigGroup {
                version: 0,
                ..updated_group.clone()
            },
        );
    }

    (read_set, write_set, same_set, members_changed)
}

/// Returns (read_set, write_set, changed) for one group.
fn compute_group_update(
    original: &ConfigGroup,
    updated: &ConfigGroup,
) -> (ConfigGroup, ConfigGroup, bool) {
    let (write_values, same_values, values_members_changed) =
        compute_values_update(&original.values, &updated.values);
    let (write_policies, same_policies, policies_members_changed) =
        compute_policies_update(&original.policies, &updated.policies);
    let (read_groups, write_groups, same_groups, groups_members_changed) =
        compute_groups_update(&original.groups, &updated.groups);

    let membership_changed = values_members_changed
        || policies_members_changed
        || groups_members_changed
        || original.mod_policy != updated.mod_policy;

    if !membership_changed {
        // Only in-place member updates, if any; the group version holds.
        if write_values.is_empty()
            && write_policies.is_empty()
            && read_groups.is_empty()
            && write_groups.is_empty()
        {
            return (
                group_reference(original.version),
                group_reference(original.version),
                false,
            );
        }
        return (
            ConfigGroup {
                version: original.version,
                groups: read_groups,
                ..Default::default()
            },
            ConfigGroup {
                version: original.version,
                groups: write_groups,
                values: write_values,
                policies: write_policies,
                ..Default::default()
            },
            true,
        );
    }

    // The membership itself changed: the group version bumps and the
    // write-set enumerates the full surviving membership, unchanged members
    // as version-only references in both sets.
    let mut read_groups = read_groups;
    let mut write_groups = write_groups;
    for (name, reference) in same_groups {
        read_groups.insert(name.clone(), reference.clone());
        write_groups.insert(name, reference);
    }
    let mut read_values = BTreeMap::new();
    let mut write_values = write_values;
    for (name, reference) in same_values {
        read_values.insert(name.clone(), reference.clone());
        write_values.insert(name, reference);
    }
    let mut read_policies = BTreeMap::new();
    let mut write_policies = write_policies;
    for (name, reference) in same_policies {
        read_policies.insert(name.clone(), reference.clone());
        write_policies.insert(name, reference);
    }

    (
        ConfigGroup {
            version: original.version,
            groups: read_groups,
            values: read_values,
            policies: read_policies,
            ..Default::default()
        },
        ConfigGroup {
            version: original.version + 1,
            groups: write_groups,
            values: write_values,
            policies: write_policies,
            mod_policy: updated.mod_policy.clone(),
        },
        true,
    )
}

/// Applies `update` to `original`, reproducing the modified tree.
///
/// This is the inverse of [`compute`]: for any pair of trees,
/// `apply_update(original, compute(original, modified))` equals `modified`
/// in every changed field and is byte-identical elsewhere.
pub fn apply_update(original: &Config, update: &ConfigUpdate) -> Config {
    let write_set = match update.write_set.as_ref() {
        Some(write_set) => write_set,
        None => return original.clone(),
    };
    Config {
        sequence: original.sequence + 1,
        channel_group: Some(apply_group(original.channel_group.as_ref(), write_set)),
    }
}

fn is_value_reference(write: &ConfigValue, original: Option<&ConfigValue>) -> bool {
    write.value.is_empty()
        && write.mod_policy.is_empty()
        && original.map(|o| o.version) == Some(write.version)
}

fn is_policy_reference(write: &ConfigPolicy, original: Option<&ConfigPolicy>) -> bool {
    write.rule.is_empty()
        && write.mod_policy.is_empty()
        && original.map(|o| o.version) == Some(write.version)
}

fn is_group_reference(write: &ConfigGroup, original: Option<&ConfigGroup>) -> bool {
    write.groups.is_empty()
        && write.values.is_empty()
        && write.policies.is_empty()
        && write.mod_policy.is_empty()
        && original.map(|o| o.version) == Some(write.version)
}

fn apply_group(original: Option<&ConfigGroup>, write: &ConfigGroup) -> ConfigGroup {
    let original = match original {
        Some(original) => original,
        // A group new to the tree arrives in full.
        None => return write.clone(),
    };

    if write.version == original.version {
        // Same membership; apply in-place member updates over the original.
        let mut result = original.clone();
        for (name, value) in &write.values {
            result.values.insert(name.clone(), value.clone());
        }
        for (name, policy) in &write.policies {
            result.policies.insert(name.clone(), policy.clone());
        }
        for (name, group) in &write.groups {
            let applied = apply_group(original.groups.get(name), group);
            result.groups.insert(name.clone(), applied);
        }
        return result;
    }

    // Membership changed; the write-set enumerates the surviving members.
    let mut result = ConfigGroup {
        version: write.version,
        mod_policy: if write.mod_policy.is_empty() {
            original.mod_policy.clone()
        } else {
            write.mod_policy.clone()
        },
        ..Default::default()
    };
    for (name, value) in &write.values {
        let resolved = if is_value_reference(value, original.values.get(name)) {
            original.values[name].clone()
        } else {
            value.clone()
        };
        result.values.insert(name.clone(), resolved);
    }
    for (name, policy) in &write.policies {
        let resolved = if is_policy_reference(policy, original.policies.get(name)) {
            original.policies[name].clone()
        } else {
            policy.clone()
        };
        result.policies.insert(name.clone(), resolved);
    }
    for (name, group) in &write.groups {
        let resolved = if is_group_reference(group, original.groups.get(name)) {
            original.groups[name].clone()
        } else {
            apply_group(original.groups.get(name), group)
        };
        result.groups.insert(name.clone(), resolved);
    }
    result
}
