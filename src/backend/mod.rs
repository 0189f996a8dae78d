//! Remote backend protocol layer.
//!
//! One [`BackendClient`] implementation per external document-AI service.
//! Clients speak the backend's native HTTP protocol and return the
//! backend-native JSON tree wrapped in a [`HybridResponse`]; converting
//! that tree into the common content model is the job of the matching
//! schema transformer, not the client.

mod azure;
mod docling;
mod registry;

pub use azure::AzureClient;
pub use docling::DoclingClient;
pub use registry::ClientRegistry;

use crate::config::BackendKind;
use crate::error::{Error, Result};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::BTreeMap;

/// Output formats a backend can be asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Structured JSON tree (the only format the engine consumes)
    Json,

    /// Markdown rendition
    Markdown,

    /// HTML rendition
    Html,
}

/// An immutable analysis request for a remote backend.
#[derive(Debug, Clone)]
pub struct HybridRequest {
    pdf_bytes: Vec<u8>,
    formats: Vec<OutputFormat>,
    pages: Option<Vec<usize>>,
}

impl HybridRequest {
    /// Request analysis of the whole document.
    pub fn all_pages(pdf_bytes: Vec<u8>, formats: Vec<OutputFormat>) -> Self {
        Self {
            pdf_bytes,
            formats,
            pages: None,
        }
    }

    /// Request analysis of a page subset (0-based indices).
    pub fn for_pages(pdf_bytes: Vec<u8>, formats: Vec<OutputFormat>, pages: Vec<usize>) -> Self {
        Self {
            pdf_bytes,
            formats,
            pages: Some(pages),
        }
    }

    /// Raw PDF bytes to analyze.
    pub fn pdf_bytes(&self) -> &[u8] {
        &self.pdf_bytes
    }

    /// Requested output formats.
    pub fn formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    /// The requested page subset, or `None` for all pages.
    pub fn page_subset(&self) -> Option<&[usize]> {
        self.pages.as_deref()
    }
}

/// A backend-native analysis result.
///
/// Holds the loosely structured JSON tree the backend returned, plus an
/// optional index from 1-based page number into that tree. Consumed exactly
/// once by a schema transformer.
#[derive(Debug, Clone)]
pub struct HybridResponse {
    json: Value,
    page_index: Option<BTreeMap<u32, Value>>,
}

impl HybridResponse {
    /// Wrap a backend-native JSON tree.
    pub fn new(json: Value) -> Self {
        Self {
            json,
            page_index: None,
        }
    }

    /// Attach a per-page-number index into the tree.
    pub fn with_page_index(mut self, index: BTreeMap<u32, Value>) -> Self {
        self.page_index = Some(index);
        self
    }

    /// The backend-native JSON tree.
    pub fn json(&self) -> &Value {
        &self.json
    }

    /// The indexed subtree for a 1-based page number, if an index exists.
    pub fn page(&self, page_number: u32) -> Option<&Value> {
        self.page_index.as_ref().and_then(|idx| idx.get(&page_number))
    }
}

/// A client for one remote document-AI backend.
///
/// The async variant is the primary implementation; the blocking variant
/// has identical semantics and must not be called from inside an async
/// runtime. Dropping the future returned by [`convert_async`] cancels any
/// in-flight request or poll loop and releases its connection.
///
/// [`convert_async`]: BackendClient::convert_async
pub trait BackendClient: Send + Sync {
    /// Which backend this client talks to.
    fn kind(&self) -> BackendKind;

    /// Submit a request and resolve to the backend-native result.
    fn convert_async<'a>(
        &'a self,
        request: &'a HybridRequest,
    ) -> BoxFuture<'a, Result<HybridResponse>>;

    /// Blocking variant of [`convert_async`](BackendClient::convert_async).
    fn convert(&self, request: &HybridRequest) -> Result<HybridResponse> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Io)?;
        runtime.block_on(self.convert_async(request))
    }

    /// Release network resources. Called once by the registry at shutdown.
    fn shutdown(&self) {}
}
