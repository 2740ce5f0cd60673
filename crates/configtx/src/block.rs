//! Extracting configuration state from delivered blocks.

use weft_proto::common::{Block, Config, ConfigEnvelope, Envelope, LastConfig, Payload};
use weft_types::error::ConfigTxError;

/// Decodes the configuration carried by a configuration block.
pub fn config_from_block(block: &Block) -> Result<Config, ConfigTxError> {
    let data = block
        .data
        .as_ref()
        .ok_or_else(|| ConfigTxError::NotAConfigBlock("block has no data".into()))?;
    let envelope_bytes = data
        .data
        .first()
        .ok_or_else(|| ConfigTxError::NotAConfigBlock("block has no envelopes".into()))?;

    let envelope: Envelope = weft_proto::decode(envelope_bytes).map_err(ConfigTxError::Decode)?;
    let payload: Payload = weft_proto::decode(&envelope.payload).map_err(ConfigTxError::Decode)?;
    let config_envelope: ConfigEnvelope =
        weft_proto::decode(&payload.data).map_err(ConfigTxError::Decode)?;

    config_envelope
        .config
        .ok_or_else(|| ConfigTxError::NotAConfigBlock("envelope carries no config".into()))
}

/// Reads the last-config pointer from a block's metadata.
pub fn last_config_index(block: &Block) -> Result<u64, ConfigTxError> {
    let metadata = block
        .metadata
        .as_ref()
        .ok_or_else(|| ConfigTxError::Decode("block has no metadata".into()))?;
    let slot = metadata
        .metadata
        .get(weft_proto::BLOCK_METADATA_LAST_CONFIG)
        .ok_or_else(|| ConfigTxError::Decode("block has no last-config metadata".into()))?;
    let last_config: LastConfig = weft_proto::decode(slot).map_err(ConfigTxError::Decode)?;
    Ok(last_config.index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_proto::common::{BlockData, BlockMetadata, ConfigGroup};

    #[test]
    fn config_roundtrips_through_a_block() {
        let config = Config {
            sequence: 4,
            channel_group: Some(ConfigGroup {
                version: 2,
                ..Default::default()
            }),
        };
        let payload = Payload {
            header: None,
            data: weft_proto::encode(&ConfigEnvelope {
                config: Some(config.clone()),
                last_update: None,
            }),
        };
        let envelope = Envelope {
            payload: weft_proto::encode(&payload),
            signature: vec![],
        };
        let block = Block {
            header: None,
            data: Some(BlockData {
                data: vec![weft_proto::encode(&envelope)],
            }),
            metadata: Some(BlockMetadata {
                metadata: vec![vec![], weft_proto::encode(&LastConfig { index: 9 })],
            }),
        };

        assert_eq!(config_from_block(&block).unwrap(), config);
        assert_eq!(last_config_index(&block).unwrap(), 9);
    }

    #[test]
    fn empty_block_is_rejected() {
        let block = Block::default();
        assert!(matches!(
            config_from_block(&block),
            Err(ConfigTxError::NotAConfigBlock(_))
        ));
    }
}
