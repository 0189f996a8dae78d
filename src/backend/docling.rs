//! docling-serve client.
//!
//! docling-serve exposes a single synchronous convert endpoint: POST the
//! PDF bytes, receive the full document tree as the response body. No
//! submit/poll handshake and, for a local instance, no authentication;
//! when an API key is configured it is forwarded as `X-Api-Key`.

use super::{BackendClient, HybridRequest, HybridResponse};
use crate::config::{BackendKind, HybridSettings};
use crate::error::{Error, Result};
use futures::future::BoxFuture;
use serde_json::Value;

/// Convert endpoint path on the docling-serve instance.
const CONVERT_PATH: &str = "/v1/convert/file";

/// Header carrying the optional API key.
const API_KEY_HEADER: &str = "X-Api-Key";

const BACKEND_NAME: &str = "docling";

/// Client for a docling-serve instance.
pub struct DoclingClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl DoclingClient {
    /// Create a client from settings.
    ///
    /// docling ships a default local URL, so only an invalid timeout can
    /// make construction fail.
    pub fn new(settings: &HybridSettings) -> Result<Self> {
        settings.validate()?;

        let base_url = settings
            .effective_url(BackendKind::Docling)
            .ok_or_else(|| Error::Config("docling requires a URL".into()))?;

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            base_url,
            api_key: settings.effective_api_key(),
            http,
        })
    }

    /// The normalized base URL this client submits to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn convert_inner(&self, request: &HybridRequest) -> Result<HybridResponse> {
        let mut builder = self
            .http
            .post(format!("{}{}", self.base_url, CONVERT_PATH))
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(request.pdf_bytes().to_vec());

        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend {
                backend: BACKEND_NAME,
                message: format!("convert request failed with status {}: {}", status, body),
            });
        }

        let json: Value = response.json().await.map_err(|e| Error::Backend {
            backend: BACKEND_NAME,
            message: format!("malformed response body: {}", e),
        })?;

        Ok(HybridResponse::new(json))
    }
}

impl BackendClient for DoclingClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Docling
    }

    fn convert_async<'a>(
        &'a self,
        request: &'a HybridRequest,
    ) -> BoxFuture<'a, Result<HybridResponse>> {
        Box::pin(self.convert_inner(request))
    }

    fn shutdown(&self) {
        log::debug!("docling client shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DOCLING_DEFAULT_URL;

    #[test]
    fn test_default_url() {
        let client = DoclingClient::new(&HybridSettings::new()).unwrap();
        assert_eq!(client.base_url(), DOCLING_DEFAULT_URL);
        assert_eq!(client.kind(), BackendKind::Docling);
    }

    #[test]
    fn test_url_override_normalized() {
        let settings = HybridSettings::new().with_url("http://docling.internal:9000/");
        let client = DoclingClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "http://docling.internal:9000");
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let settings = HybridSettings::new().with_timeout(std::time::Duration::ZERO);
        assert!(matches!(
            DoclingClient::new(&settings),
            Err(Error::Config(_))
        ));
    }
}
