//! Azure Document Intelligence client.
//!
//! Talks to the Azure Document Intelligence REST API (prebuilt-layout
//! model). The protocol is submit-then-poll:
//!
//! 1. POST the PDF to the analyze endpoint; the job handle comes back in
//!    the `Operation-Location` response header.
//! 2. GET that location at a fixed interval until the reported status is
//!    terminal (`succeeded` or `failed`), up to a fixed attempt ceiling.
//! 3. Return the `analyzeResult` subtree.
//!
//! Authentication is a static `Ocp-Apim-Subscription-Key` header. Endpoint
//! and key are required at construction; missing either is a configuration
//! error, not a runtime fault.

use super::{BackendClient, HybridRequest, HybridResponse};
use crate::config::{BackendKind, HybridSettings, API_KEY_ENV_VAR};
use crate::error::{Error, Result};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Azure Document Intelligence REST API version (GA).
const API_VERSION: &str = "2024-11-30";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Header naming the polling location after submission.
const OPERATION_LOCATION_HEADER: &str = "Operation-Location";

/// Wait between poll attempts.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Poll attempt ceiling before the job is declared timed out.
const MAX_POLL_ATTEMPTS: u32 = 120;

const BACKEND_NAME: &str = "azure";

/// Client for Azure Document Intelligence.
pub struct AzureClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl AzureClient {
    /// Create a client from settings.
    ///
    /// Fails fast with a configuration error when the endpoint URL or API
    /// key (explicit or via the `AZURE_API_KEY` environment variable) is
    /// absent, or when the timeout is invalid.
    pub fn new(settings: &HybridSettings) -> Result<Self> {
        settings.validate()?;

        let base_url = settings.effective_url(BackendKind::Azure).ok_or_else(|| {
            Error::Config(
                "Azure Document Intelligence requires a URL. Set one with \
                 HybridSettings::with_url (e.g. https://your-resource.cognitiveservices.azure.com)"
                    .into(),
            )
        })?;

        let api_key = settings.effective_api_key().ok_or_else(|| {
            Error::Config(format!(
                "Azure Document Intelligence requires an API key. Set one with \
                 HybridSettings::with_api_key or the {} environment variable",
                API_KEY_ENV_VAR
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            http,
        })
    }

    /// The normalized base URL this client submits to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/prebuilt-layout:analyze?api-version={}",
            self.base_url, API_VERSION
        )
    }

    /// Submit the PDF for analysis and return the operation URL to poll.
    async fn submit_analysis(&self, pdf_bytes: &[u8]) -> Result<String> {
        let response = self
            .http
            .post(self.analyze_url())
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(pdf_bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend {
                backend: BACKEND_NAME,
                message: format!("analyze request failed with status {}: {}", status, body),
            });
        }

        let operation_url = response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        operation_url.ok_or_else(|| Error::Backend {
            backend: BACKEND_NAME,
            message: format!("response missing {} header", OPERATION_LOCATION_HEADER),
        })
    }

    /// Poll the operation URL until the analysis reaches a terminal status.
    ///
    /// Waiting suspends the task; dropping the future cancels the loop and
    /// releases the connection.
    async fn poll_for_result(&self, operation_url: &str) -> Result<Value> {
        for _attempt in 0..MAX_POLL_ATTEMPTS {
            let response = self
                .http
                .get(operation_url)
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Backend {
                    backend: BACKEND_NAME,
                    message: format!("poll failed with status {}: {}", status, body),
                });
            }

            let root: Value = response.json().await.map_err(|e| Error::Backend {
                backend: BACKEND_NAME,
                message: format!("malformed poll response body: {}", e),
            })?;

            match root.get("status").and_then(Value::as_str).unwrap_or("") {
                "succeeded" => {
                    return root
                        .get("analyzeResult")
                        .cloned()
                        .ok_or_else(|| Error::Backend {
                            backend: BACKEND_NAME,
                            message: "response missing analyzeResult".into(),
                        });
                }
                "failed" => {
                    let detail = root
                        .get("error")
                        .map(Value::to_string)
                        .unwrap_or_else(|| "unknown error".into());
                    return Err(Error::AnalysisFailed {
                        backend: BACKEND_NAME,
                        detail,
                    });
                }
                // "running" or "notStarted": wait and retry.
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }

        Err(Error::PollTimeout {
            backend: BACKEND_NAME,
            attempts: MAX_POLL_ATTEMPTS,
        })
    }

    /// Wrap an `analyzeResult` tree, indexing its pages by page number.
    fn build_response(analyze_result: Value) -> HybridResponse {
        let mut page_index = BTreeMap::new();

        if let Some(pages) = analyze_result.get("pages").and_then(Value::as_array) {
            for page in pages {
                let page_number = page
                    .get("pageNumber")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as u32;
                if page_number > 0 {
                    page_index.insert(page_number, page.clone());
                }
            }
        }

        HybridResponse::new(analyze_result).with_page_index(page_index)
    }
}

impl BackendClient for AzureClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Azure
    }

    fn convert_async<'a>(
        &'a self,
        request: &'a HybridRequest,
    ) -> BoxFuture<'a, Result<HybridResponse>> {
        Box::pin(async move {
            let operation_url = self.submit_analysis(request.pdf_bytes()).await?;
            log::debug!("submitted analysis, operation URL: {}", operation_url);

            let result = self.poll_for_result(&operation_url).await?;
            log::debug!("analysis completed");

            Ok(Self::build_response(result))
        })
    }

    fn shutdown(&self) {
        // Dropping the reqwest client releases its connection pool; nothing
        // else is held.
        log::debug!("azure client shut down");
    }
}
