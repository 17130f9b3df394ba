//! Cache lookup by content digest.

use crate::core::{ContentDigest, Phase, ScanError};
use crate::transport::{RemoteRequest, RemoteResponse, Transport};
use crate::workflow::config::ClientConfig;

/// Asks the service whether it already holds a verdict for a digest.
#[derive(Debug, Clone, Copy)]
pub struct HashProbe<'a> {
    config: &'a ClientConfig,
    transport: &'a dyn Transport,
}

impl<'a> HashProbe<'a> {
    /// Creates a probe over the given configuration and transport.
    pub fn new(config: &'a ClientConfig, transport: &'a dyn Transport) -> Self {
        Self { config, transport }
    }

    /// Builds the `GET {base}/hash/{hex}` request.
    pub fn request(&self, digest: &ContentDigest) -> RemoteRequest {
        let url = self.config.endpoint(&format!("hash/{}", digest.to_hex()));
        RemoteRequest::get(url, Phase::HashLookup).with_header("apikey", self.config.api_key())
    }

    /// Issues the lookup and returns the response whatever its status.
    ///
    /// Classifying the status (hit, miss, unexpected) is left to the caller.
    ///
    /// # Errors
    ///
    /// Only transport failures are errors; they are not retried.
    pub async fn lookup(&self, digest: &ContentDigest) -> Result<RemoteResponse, ScanError> {
        tracing::info!(digest = %digest, "Looking up scan result by file hash");
        let response = self.transport.send(self.request(digest)).await?;
        tracing::info!(status = %response.status_text(), "Hash lookup answered");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DigestAlgorithm;
    use crate::transport::{Method, MockTransport, RequestBody};

    #[test]
    fn test_request_shape() {
        let config = ClientConfig::new("test-key").with_base_url("https://api.example.test/v4");
        let transport = MockTransport::new();
        let probe = HashProbe::new(&config, &transport);

        let digest = ContentDigest::compute(DigestAlgorithm::Md5, b"hello world");
        let request = probe.request(&digest);

        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.url,
            "https://api.example.test/v4/hash/5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(request.header("apikey"), Some("test-key"));
        assert_eq!(request.body, RequestBody::Empty);
    }

    #[tokio::test]
    async fn test_lookup_returns_any_status() {
        let config = ClientConfig::new("test-key");
        let transport = MockTransport::new().with_response(503, "down for maintenance");
        let digest = ContentDigest::compute(DigestAlgorithm::Md5, b"x");

        let response = HashProbe::new(&config, &transport).lookup(&digest).await.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.body_text(), "down for maintenance");
    }

    #[tokio::test]
    async fn test_lookup_transport_error_is_fatal() {
        let config = ClientConfig::new("test-key");
        let transport = MockTransport::new()
            .with_connection_failure("dns error")
            .with_response(200, "{}");
        let digest = ContentDigest::compute(DigestAlgorithm::Md5, b"x");

        let err = HashProbe::new(&config, &transport).lookup(&digest).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(transport.request_count(), 1);
    }
}
