//! # doctriage
//!
//! Hybrid PDF content extraction for Rust.
//!
//! doctriage takes a parsed PDF document and produces one sequence of
//! semantic content objects (paragraphs, headings, tables, figures,
//! formulas) per page. Each page is triaged between two processing paths:
//! a local structural pipeline, and a remote document-AI backend whose
//! native response schema is normalized into the same content model.
//!
//! ## Quick Start
//!
//! ```no_run
//! use doctriage::{
//!     BackendKind, HybridOrchestrator, HybridSettings, InputDocument, PageInfo, PageSelection,
//!     ProcessConfig,
//! };
//!
//! fn main() -> doctriage::Result<()> {
//!     let bytes = std::fs::read("document.pdf")?;
//!     let document = InputDocument::new("document.pdf", bytes, vec![PageInfo::letter(); 4]);
//!
//!     let config = ProcessConfig::new(BackendKind::Azure).with_hybrid(
//!         HybridSettings::new()
//!             .with_url("https://your-resource.cognitiveservices.azure.com")
//!             .with_api_key("your-key"),
//!     );
//!
//!     let orchestrator = HybridOrchestrator::new();
//!     let pages = orchestrator.process_blocking(&document, &config, &PageSelection::All)?;
//!
//!     for (index, page) in pages.iter().enumerate() {
//!         println!("page {}: {} objects", index, page.len());
//!     }
//!
//!     doctriage::shutdown_clients();
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Per-page triage**: content-derived routing between local and remote
//!   processing, with a swappable scoring policy
//! - **Backend clients**: Azure Document Intelligence (submit-then-poll)
//!   and docling-serve, cached per process
//! - **Schema normalization**: every backend's geometry and element kinds
//!   converge on one point-based, bottom-left-origin content model
//! - **Fallback**: remotely-routed pages are reprocessed locally when the
//!   backend fails
//! - **Cross-page passes**: header/footer removal, list continuation,
//!   neighbor-table merging, document-wide heading levels

pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod local;
pub mod model;
pub mod orchestrator;
pub mod transform;
pub mod triage;

// Re-export commonly used types
pub use backend::{BackendClient, ClientRegistry, HybridRequest, HybridResponse, OutputFormat};
pub use config::{BackendKind, HybridSettings, ProcessConfig, TriageMode};
pub use error::{Error, Result, Stage};
pub use filter::{ContentFilter, PassthroughFilter};
pub use model::{
    BoundingBox, ContentKind, ContentObject, InputDocument, PageInfo, PageSelection, TableCell,
    TableGrid,
};
pub use orchestrator::HybridOrchestrator;
pub use transform::{AzureTransformer, DoclingTransformer, SchemaTransformer};
pub use triage::{
    TriageDecision, TriageEngine, TriageResult, TriageScorer, TriageSignals,
};

/// Process a document with a default orchestrator over all pages.
pub async fn process(
    document: &InputDocument,
    config: &ProcessConfig,
) -> Result<Vec<Vec<ContentObject>>> {
    HybridOrchestrator::new()
        .process(document, config, &PageSelection::All)
        .await
}

/// Blocking variant of [`process`]. Must not be called from inside an
/// async runtime.
pub fn process_blocking(
    document: &InputDocument,
    config: &ProcessConfig,
) -> Result<Vec<Vec<ContentObject>>> {
    HybridOrchestrator::new().process_blocking(document, config, &PageSelection::All)
}

/// Shut down the process-wide client registry.
///
/// Releases every cached backend client's network resources. Intended to
/// run once, when all processing is complete.
pub fn shutdown_clients() {
    ClientRegistry::global().shutdown();
}
