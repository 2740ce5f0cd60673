//! # Weft ConfigTx
//!
//! Channel-configuration governance: mutating a channel's hierarchical
//! configuration tree (adding/removing organizations and orderer
//! addresses), computing the minimal read-set/write-set delta between two
//! trees, applying a delta, and collecting multi-organization signatures
//! over a pending update.
//!
//! Trees are never mutated in place: every operation clones the current
//! tree, edits the clone, and diffs it against the original.

pub mod block;
pub mod create;
pub mod org;
pub mod sign;
pub mod update;

pub use org::{AddOrg, Organization};
pub use sign::{collect_signatures, sign_update};
pub use update::{apply_update, compute, Computed};

/// Key of the ordering-organizations group under the channel group.
pub const ORDERER_GROUP_KEY: &str = "Orderer";
/// Key of the application-organizations group under the channel group.
pub const APPLICATION_GROUP_KEY: &str = "Application";
/// Key of the consortiums group (system channel only).
pub const CONSORTIUMS_GROUP_KEY: &str = "Consortiums";
/// Key of the orderer-addresses value under the channel group.
pub const ORDERER_ADDRESSES_KEY: &str = "OrdererAddresses";
/// Key of the consortium-name value carried by channel-creation updates.
pub const CONSORTIUM_KEY: &str = "Consortium";
/// Key of an organization group's membership material value.
pub const MSP_KEY: &str = "MSP";
/// Key of an application organization's anchor-peers value.
pub const ANCHOR_PEERS_KEY: &str = "AnchorPeers";

/// Implicit-meta policy rules, as interpreted by the ordering platform.
pub const POLICY_MAJORITY_ADMINS: &str = "MAJORITY Admins";
pub const POLICY_ANY_READERS: &str = "ANY Readers";
pub const POLICY_ANY_WRITERS: &str = "ANY Writers";

/// Policy names present on every group.
pub const ADMINS_POLICY_KEY: &str = "Admins";
pub const READERS_POLICY_KEY: &str = "Readers";
pub const WRITERS_POLICY_KEY: &str = "Writers";
