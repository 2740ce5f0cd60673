//! Connection factory: resolves an [`Endpoint`] to a live gRPC channel.

use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint as TonicEndpoint};
use weft_types::config::DEFAULT_CONNECT_TIMEOUT;
use weft_types::error::ConnectivityError;
use weft_types::Endpoint;

/// Opens a channel to `endpoint`, applying its timeout (default 3 s when
/// unset) to both connection establishment and each request.
///
/// When the endpoint carries a TLS trust anchor, the peer's certificate
/// chain is validated against it, honoring the SNI override; otherwise the
/// connection is plaintext (test setups only). No retry happens here;
/// failover across candidates is the caller's job.
pub async fn connect(endpoint: &Endpoint) -> Result<Channel, ConnectivityError> {
    let timeout = endpoint.timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
    let scheme = if endpoint.tls_ca.is_some() {
        "https"
    } else {
        "http"
    };
    let uri = format!("{scheme}://{}", endpoint.address);

    let mut builder = TonicEndpoint::from_shared(uri)
        .map_err(|e| ConnectivityError::InvalidAddress(endpoint.address.clone(), e.to_string()))?
        .connect_timeout(timeout)
        .timeout(timeout);

    if let Some(tls_ca) = &endpoint.tls_ca {
        let mut tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(tls_ca));
        if let Some(name) = &endpoint.sni_override {
            tls = tls.domain_name(name.clone());
        }
        builder = builder
            .tls_config(tls)
            .map_err(|e| ConnectivityError::Tls(endpoint.address.clone(), e.to_string()))?;
    }

    builder
        .connect()
        .await
        .map_err(|e| ConnectivityError::Connect(endpoint.address.clone(), e.to_string()))
}
