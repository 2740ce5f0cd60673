//! Sequential endpoint failover: try candidates strictly in the supplied
//! order, first success wins, aggregate the last error once the list is
//! exhausted. Used identically for endorsement, broadcast, and block
//! fetches; candidates are never raced in parallel.

use std::future::Future;

use tracing::warn;
use weft_types::error::{BroadcastError, EndorseError, WatchError};
use weft_types::Endpoint;

/// Errors produced by failover-capable operations.
pub trait FailoverError: std::fmt::Display + Sized {
    /// The aggregate error once every candidate failed.
    fn all_endpoints_failed(attempts: usize, last: Option<Self>) -> Self;

    /// Whether the next candidate should be tried after this error.
    /// Validation-class failures are surfaced immediately instead.
    fn retryable(&self) -> bool {
        true
    }
}

fn describe_last<E: std::fmt::Display>(last: Option<E>) -> String {
    match last {
        Some(err) => err.to_string(),
        None => "no candidates provided".to_string(),
    }
}

impl FailoverError for EndorseError {
    fn all_endpoints_failed(attempts: usize, last: Option<Self>) -> Self {
        EndorseError::AllEndpointsFailed {
            attempts,
            last: describe_last(last),
        }
    }

    fn retryable(&self) -> bool {
        // A divergent or malformed response is a property of the proposal,
        // not of the endpoint that reported it.
        matches!(self, Self::Connectivity(_) | Self::Rpc(..))
    }
}

impl FailoverError for BroadcastError {
    fn all_endpoints_failed(attempts: usize, last: Option<Self>) -> Self {
        BroadcastError::AllEndpointsFailed {
            attempts,
            last: describe_last(last),
        }
    }
}

impl FailoverError for WatchError {
    fn all_endpoints_failed(attempts: usize, last: Option<Self>) -> Self {
        WatchError::AllEndpointsFailed {
            attempts,
            last: describe_last(last),
        }
    }
}

/// Runs `attempt` against each endpoint in order, returning the first
/// success. Retryable errors move on to the next candidate; fatal ones
/// surface immediately.
pub async fn try_each<T, E, F, Fut>(endpoints: &[Endpoint], mut attempt: F) -> Result<T, E>
where
    E: FailoverError,
    F: FnMut(Endpoint) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last = None;
    for endpoint in endpoints {
        match attempt(endpoint.clone()).await {
            Ok(value) => return Ok(value),
            Err(err) if err.retryable() => {
                warn!(endpoint = %endpoint.address, error = %err, "endpoint failed, trying next candidate");
                last = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(E::all_endpoints_failed(endpoints.len(), last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_types::error::ErrorCode;

    fn endpoints(n: usize) -> Vec<Endpoint> {
        (0..n)
            .map(|i| Endpoint::insecure(format!("node{i}:7050")))
            .collect()
    }

    #[tokio::test]
    async fn first_success_wins_and_later_candidates_are_skipped() {
        let candidates = endpoints(3);
        let mut tried = Vec::new();
        let result: Result<String, BroadcastError> = try_each(&candidates, |ep| {
            tried.push(ep.address.clone());
            async move {
                if ep.address.starts_with("node1") {
                    Ok(ep.address)
                } else {
                    Err(BroadcastError::Rpc(ep.address, "boom".into()))
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "node1:7050");
        assert_eq!(tried, vec!["node0:7050", "node1:7050"]);
    }

    #[tokio::test]
    async fn exhaustion_aggregates_the_last_error() {
        let candidates = endpoints(2);
        let result: Result<(), BroadcastError> = try_each(&candidates, |ep| async move {
            Err(BroadcastError::Rpc(ep.address, "down".into()))
        })
        .await;
        match result.unwrap_err() {
            BroadcastError::AllEndpointsFailed { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(last.contains("node1:7050"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn fatal_errors_stop_the_scan() {
        let candidates = endpoints(3);
        let mut tried = 0usize;
        let result: Result<(), EndorseError> = try_each(&candidates, |_| {
            tried += 1;
            async { Err(EndorseError::PayloadMismatch) }
        })
        .await;
        assert_eq!(result.unwrap_err().code(), "ENDORSE_PAYLOAD_MISMATCH");
        assert_eq!(tried, 1);
    }
}
