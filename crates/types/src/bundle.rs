//! The identity bundle exchanged when on-boarding an organization.
//!
//! A joining organization exports this bundle; the organizations already on
//! the channel consume it to admit the newcomer. Certificate maps are
//! base64 strings in JSON, matching the staging files produced by the
//! CA-bootstrap tooling.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Certificate and endpoint material describing one organization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityBundle {
    /// Organization name.
    pub org: String,
    /// The MSP id the organization's certificates map to.
    pub msp_id: String,
    /// Ordering-node addresses contributed by the organization.
    #[serde(default)]
    pub orderers: Vec<String>,
    /// Anchor-peer addresses published to the channel.
    #[serde(default)]
    pub anchors: Vec<String>,
    /// Peer addresses that will join the channel.
    #[serde(default)]
    pub channel_peers: Vec<String>,
    /// Admin certificates by file name.
    #[serde(with = "b64_map", default)]
    pub admin_certs: BTreeMap<String, Vec<u8>>,
    /// CA root certificates by file name.
    #[serde(with = "b64_map", default)]
    pub ca_certs: BTreeMap<String, Vec<u8>>,
    /// TLS CA root certificates by file name.
    #[serde(with = "b64_map", default)]
    pub tls_ca_certs: BTreeMap<String, Vec<u8>>,
}

impl IdentityBundle {
    /// Parses a bundle from its JSON encoding.
    pub fn from_json(data: &[u8]) -> Result<Self, String> {
        serde_json::from_slice(data).map_err(|e| e.to_string())
    }

    /// Serializes the bundle to JSON.
    pub fn to_json(&self) -> Vec<u8> {
        // Serialization of string/byte maps cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// The first admin certificate, when present.
    pub fn admin_cert(&self) -> Option<&[u8]> {
        self.admin_certs.values().next().map(Vec::as_slice)
    }

    /// The first CA root certificate, when present.
    pub fn ca_cert(&self) -> Option<&[u8]> {
        self.ca_certs.values().next().map(Vec::as_slice)
    }

    /// The first TLS CA root certificate, when present.
    pub fn tls_ca_cert(&self) -> Option<&[u8]> {
        self.tls_ca_certs.values().next().map(Vec::as_slice)
    }
}

mod b64_map {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Vec<u8>>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        let encoded: BTreeMap<&str, String> = map
            .iter()
            .map(|(k, v)| (k.as_str(), BASE64.encode(v)))
            .collect();
        encoded.serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<BTreeMap<String, Vec<u8>>, D::Error> {
        let encoded = BTreeMap::<String, String>::deserialize(de)?;
        encoded
            .into_iter()
            .map(|(k, v)| {
                BASE64
                    .decode(v.as_bytes())
                    .map(|bytes| (k, bytes))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
