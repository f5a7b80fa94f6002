//! Client for the Moondream vision API.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::ClientConfig;
use super::error::VisionError;
use super::image::encode_image;
use super::types::{
    BoundingBox, CaptionLength, CaptionRequest, CaptionResponse, DetectResponse, ObjectRequest,
    Point, PointResponse, QueryRequest, QueryResponse, Traced,
};

/// Client for captioning, querying, detecting and pointing at objects in images.
///
/// Cheap to share: the configuration is read-only and the underlying
/// connection pool is reused by every operation, including concurrent ones.
pub struct VisionClient {
    config: ClientConfig,
    client: Client,
}

impl fmt::Debug for VisionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionClient")
            .field("config", &self.config)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl VisionClient {
    /// Create a new client with the given API key and configuration.
    ///
    /// Fails only if the key or the configured auth header cannot be sent as
    /// an HTTP header, or the TLS backend cannot be initialized.
    pub fn new(api_key: impl AsRef<str>, config: ClientConfig) -> Result<Self, VisionError> {
        let name = HeaderName::from_bytes(config.auth_header.as_bytes()).map_err(|e| {
            VisionError::Config(format!("invalid auth header '{}': {}", config.auth_header, e))
        })?;
        let mut value = HeaderValue::from_str(api_key.as_ref())
            .map_err(|_| VisionError::Config("API key is not a valid header value".to_string()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| VisionError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create a new client with default configuration.
    pub fn with_defaults(api_key: impl AsRef<str>) -> Result<Self, VisionError> {
        Self::new(api_key, ClientConfig::default())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Generate a caption for an image.
    pub async fn caption(
        &self,
        cancel: &CancellationToken,
        image_path: impl AsRef<Path>,
        length: CaptionLength,
        stream: bool,
    ) -> Result<String, VisionError> {
        let image_url = encode_image(image_path)?;
        let req = CaptionRequest {
            image_url: &image_url,
            length,
            stream,
        };

        let resp: CaptionResponse = self.execute(cancel, "/caption", &req).await?;
        Ok(resp.caption)
    }

    /// Ask a question about an image.
    pub async fn query(
        &self,
        cancel: &CancellationToken,
        image_path: impl AsRef<Path>,
        question: &str,
    ) -> Result<String, VisionError> {
        let image_url = encode_image(image_path)?;
        let req = QueryRequest {
            image_url: &image_url,
            question,
        };

        let resp: QueryResponse = self.execute(cancel, "/query", &req).await?;
        Ok(resp.answer)
    }

    /// Detect every instance of `object` in an image.
    pub async fn detect(
        &self,
        cancel: &CancellationToken,
        image_path: impl AsRef<Path>,
        object: &str,
    ) -> Result<Vec<BoundingBox>, VisionError> {
        let image_url = encode_image(image_path)?;
        let req = ObjectRequest {
            image_url: &image_url,
            object,
        };

        let resp: DetectResponse = self.execute(cancel, "/detect", &req).await?;
        Ok(resp.objects)
    }

    /// Locate a point on every instance of `object` in an image.
    pub async fn point(
        &self,
        cancel: &CancellationToken,
        image_path: impl AsRef<Path>,
        object: &str,
    ) -> Result<Vec<Point>, VisionError> {
        let image_url = encode_image(image_path)?;
        let req = ObjectRequest {
            image_url: &image_url,
            object,
        };

        let resp: PointResponse = self.execute(cancel, "/point", &req).await?;
        Ok(resp.points)
    }

    /// POST `payload` to `endpoint` and decode the response, retrying
    /// transient failures with linear backoff.
    ///
    /// Client errors (4xx) and cancellation end the loop immediately. Server
    /// errors, transport failures and undecodable success bodies are retried
    /// until `max_retries` is spent, after which the last failure is returned
    /// inside [`VisionError::RetriesExhausted`].
    async fn execute<Req, Resp>(
        &self,
        cancel: &CancellationToken,
        endpoint: &str,
        payload: &Req,
    ) -> Result<Resp, VisionError>
    where
        Req: Serialize,
        Resp: DeserializeOwned + Traced,
    {
        let body = serde_json::to_vec(payload).map_err(VisionError::Serialization)?;
        let url = self.config.endpoint_url(endpoint);
        let max_attempts = self.config.max_attempts();

        let mut attempt: u32 = 0;
        loop {
            if attempt > 0 {
                let delay = self.config.backoff_for(attempt);
                tokio::select! {
                    _ = cancel.cancelled() => return Err(VisionError::Cancelled),
                    _ = sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                return Err(VisionError::Cancelled);
            }

            debug!(endpoint, attempt = attempt + 1, max_attempts, "Sending vision request");

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(VisionError::Cancelled),
                result = self.send_once::<Resp>(&url, body.clone()) => result,
            };

            match result {
                Ok(resp) => {
                    if let Some(request_id) = resp.request_id() {
                        debug!(endpoint, request_id, "Vision request succeeded");
                    }
                    return Ok(resp);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt + 1 >= max_attempts => {
                    return Err(VisionError::RetriesExhausted {
                        attempts: max_attempts,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    attempt += 1;
                    warn!(
                        endpoint,
                        attempt,
                        max_attempts,
                        error = %e,
                        backoff_ms = self.config.backoff_for(attempt).as_millis() as u64,
                        "Vision request failed, retrying"
                    );
                }
            }
        }
    }

    /// Send a single attempt and decode its body.
    async fn send_once<Resp: DeserializeOwned>(
        &self,
        url: &str,
        body: Vec<u8>,
    ) -> Result<Resp, VisionError> {
        let response = self.client.post(url).body(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.as_u16() >= 400 {
            return Err(VisionError::api(status.as_u16(), &bytes));
        }

        serde_json::from_slice(&bytes).map_err(VisionError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_defaults() {
        let client = VisionClient::with_defaults("test-api-key").unwrap();
        assert_eq!(client.config().base_url, "https://api.moondream.ai/v1");
        assert_eq!(client.config().max_retries, 3);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = VisionClient::with_defaults("super-secret-key").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_invalid_api_key_rejected() {
        let err = VisionClient::with_defaults("bad\nkey").unwrap_err();
        assert!(matches!(err, VisionError::Config(_)));
    }

    #[test]
    fn test_invalid_auth_header_rejected() {
        let config = ClientConfig::default().with_auth_header("not a header");
        let err = VisionClient::new("key", config).unwrap_err();
        assert!(matches!(err, VisionError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_image_fails_before_network() {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:9");
        let client = VisionClient::new("key", config).unwrap();
        let cancel = CancellationToken::new();

        let err = client
            .query(&cancel, "/no/such/image.jpg", "what is this?")
            .await
            .unwrap_err();
        assert!(matches!(err, VisionError::FileRead { .. }));
    }

    #[tokio::test]
    async fn test_unbuildable_request_is_not_retried() {
        use std::io::Write;
        use std::time::{Duration, Instant};

        let mut image = tempfile::NamedTempFile::new().unwrap();
        image.write_all(b"img").unwrap();

        let config = ClientConfig::default()
            .with_base_url("not a url")
            .with_max_retries(3)
            .with_retry_delay(Duration::from_secs(10));
        let client = VisionClient::new("key", config).unwrap();
        let cancel = CancellationToken::new();

        let start = Instant::now();
        let err = client
            .caption(&cancel, image.path(), CaptionLength::Short, false)
            .await
            .unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(5));
        match err {
            VisionError::Network(e) => assert!(e.is_builder()),
            other => panic!("expected builder error, got {:?}", other),
        }
    }
}
