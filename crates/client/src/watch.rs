//! Commit watching: scan a live filtered-block stream for one transaction.

use std::time::Duration;

use tracing::{debug, warn};
use weft_proto::peer::TxValidationCode;
use weft_types::error::WatchError;
use weft_types::identity::SigningIdentity;
use weft_types::Endpoint;

use crate::deliver::filtered_stream;
use crate::envelope::{seek_envelope, seek_newest_onward};

/// Waits for `tx_id` to appear in `committer`'s filtered-block stream and
/// returns its validity flag.
///
/// The stream starts at the newest block, so the watch must be opened
/// before (or immediately after) broadcast. Expiry of `timeout` yields
/// [`WatchError::Timeout`], a distinct outcome from an invalid commit:
/// the transaction may still commit later, so callers treat it as
/// *unknown*. The background receive loop is torn down before this
/// function returns, on every path.
pub async fn wait_for_commit(
    signer: &dyn SigningIdentity,
    channel_id: &str,
    tx_id: &str,
    committer: &Endpoint,
    timeout: Duration,
) -> Result<bool, WatchError> {
    let request = seek_envelope(signer, channel_id, seek_newest_onward())
        .map_err(|e| WatchError::Stream(e.to_string()))?;
    let mut stream = filtered_stream(committer, request).await?;

    let outcome = tokio::time::timeout(timeout, async {
        loop {
            let block = stream.next().await?;
            debug!(number = block.number, channel = channel_id, "scanning filtered block");
            for tx in &block.filtered_transactions {
                if tx.tx_id == tx_id {
                    return Ok(tx.tx_validation_code == TxValidationCode::Valid as i32);
                }
            }
        }
    })
    .await;

    stream.close();

    match outcome {
        Ok(result) => result,
        Err(_) => {
            warn!(tx_id, "commit watch expired");
            Err(WatchError::Timeout)
        }
    }
}
