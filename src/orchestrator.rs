//! Hybrid orchestrator.
//!
//! Top-level coordinator for one document run. Phases run strictly in
//! order: filter, triage, partition, the two processing paths, merge, and
//! the cross-page passes. The local path is sequential (its passes share
//! the run context); the remote path issues a single batched request for
//! all of its pages, with at most one backend call in flight per document.

use crate::backend::{BackendClient, ClientRegistry, HybridRequest, OutputFormat};
use crate::config::ProcessConfig;
use crate::error::{Error, Result, Stage};
use crate::filter::{ContentFilter, PassthroughFilter};
use crate::local::{self, RunContext};
use crate::model::{ContentObject, InputDocument, PageSelection};
use crate::transform::transformer_for;
use crate::triage::{TriageDecision, TriageEngine, TriageLogger, TriageResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Coordinates filtering, triage, both processing paths, merge, and
/// post-processing for whole documents.
pub struct HybridOrchestrator {
    filter: Box<dyn ContentFilter>,
    triage: TriageEngine,
    client_override: Option<Arc<dyn BackendClient>>,
}

impl HybridOrchestrator {
    /// Orchestrator with the default filter and triage policy.
    pub fn new() -> Self {
        Self {
            filter: Box::new(PassthroughFilter),
            triage: TriageEngine::new(),
            client_override: None,
        }
    }

    /// Replace the page content filter.
    pub fn with_filter(mut self, filter: Box<dyn ContentFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the triage engine.
    pub fn with_triage_engine(mut self, triage: TriageEngine) -> Self {
        self.triage = triage;
        self
    }

    /// Use a specific backend client instead of the process-wide registry.
    pub fn with_client(mut self, client: Arc<dyn BackendClient>) -> Self {
        self.client_override = Some(client);
        self
    }

    /// Process a document, returning one content sequence per page.
    ///
    /// Every page of the document appears in the result; pages outside the
    /// selection hold an empty sequence. On any whole-document failure the
    /// error names the stage that produced it and no partial result is
    /// returned.
    pub async fn process(
        &self,
        document: &InputDocument,
        config: &ProcessConfig,
        selection: &PageSelection,
    ) -> Result<Vec<Vec<ContentObject>>> {
        let total_pages = document.page_count();
        log::info!(
            "starting hybrid processing for {} ({} pages)",
            document.name,
            total_pages
        );

        let mut ctx = RunContext::new(document);

        // Phase 1: filter every in-scope page.
        let filtered = self
            .filter_all_pages(document, config, selection)
            .map_err(|e| e.at_stage(Stage::Filter))?;

        // Phase 2: triage.
        let triage_results =
            self.triage
                .triage_all_pages(&filtered, selection, &config.hybrid);
        log_triage_summary(&triage_results);
        if let Some(dir) = &config.triage_log_dir {
            TriageLogger::new().write_or_warn(
                dir,
                &document.name,
                config.backend.as_str(),
                &triage_results,
            );
        }

        // Phase 3: partition by decision.
        let local_pages = pages_with_decision(&triage_results, TriageDecision::Local);
        let remote_pages = pages_with_decision(&triage_results, TriageDecision::Remote);
        log::info!(
            "routing: {} pages local, {} pages to {} backend",
            local_pages.len(),
            remote_pages.len(),
            config.backend
        );

        // Phase 4: both paths. Local runs sequentially; remote is one
        // batched request.
        let local_results = local::process_pages(&mut ctx, &filtered, &local_pages);

        let remote_results = match self
            .process_remote(document, &remote_pages, config, &mut ctx)
            .await
        {
            Ok(results) => results,
            // Phase 5: fallback. Configuration errors stay fatal; only
            // remote-side failures are eligible.
            Err(err) if config.hybrid.fallback_to_local && err.is_recoverable() => {
                log::warn!("remote processing failed: {}", err);
                log::info!("falling back to local processing for remote pages");
                local::process_pages(&mut ctx, &filtered, &remote_pages)
            }
            Err(err) => return Err(err.at_stage(Stage::Remote)),
        };

        // Phase 6: merge by page index.
        let mut contents = merge_results(total_pages, selection, local_results, remote_results);

        // Phase 7: cross-page passes on the full merged document.
        local::apply_cross_page_passes(&mut ctx, &mut contents);

        Ok(contents)
    }

    /// Blocking variant of [`process`](HybridOrchestrator::process).
    ///
    /// Must not be called from inside an async runtime.
    pub fn process_blocking(
        &self,
        document: &InputDocument,
        config: &ProcessConfig,
        selection: &PageSelection,
    ) -> Result<Vec<Vec<ContentObject>>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Io)?;
        runtime.block_on(self.process(document, config, selection))
    }

    fn filter_all_pages(
        &self,
        document: &InputDocument,
        config: &ProcessConfig,
        selection: &PageSelection,
    ) -> Result<BTreeMap<usize, Vec<ContentObject>>> {
        let mut filtered = BTreeMap::new();

        for page in 0..document.page_count() {
            if !selection.contains(page) {
                filtered.insert(page, Vec::new());
                continue;
            }
            filtered.insert(page, self.filter.filter(document, page, config)?);
        }

        Ok(filtered)
    }

    /// Process the remote page set: one batched request, then the matching
    /// schema transformer, then id assignment for the backend-born objects.
    async fn process_remote(
        &self,
        document: &InputDocument,
        pages: &[usize],
        config: &ProcessConfig,
        ctx: &mut RunContext,
    ) -> Result<BTreeMap<usize, Vec<ContentObject>>> {
        if pages.is_empty() {
            return Ok(BTreeMap::new());
        }

        log::info!(
            "processing {} pages via {} backend",
            pages.len(),
            config.backend
        );

        let client = match &self.client_override {
            Some(client) => Arc::clone(client),
            None => ClientRegistry::global().get_or_create(config.backend, &config.hybrid)?,
        };

        // Only JSON is requested: downstream artifacts are generated from
        // the content model, not from backend renditions.
        let request = HybridRequest::all_pages(document.bytes.clone(), vec![OutputFormat::Json]);
        let response = client.convert_async(&request).await?;

        let page_heights = document.page_heights_by_number(pages);
        let transformer = transformer_for(client.kind());
        let transformed = transformer.transform(&response, &page_heights)?;

        let mut results = BTreeMap::new();
        for &page in pages {
            let contents = transformed.get(page).cloned().unwrap_or_default();
            results.insert(page, local::assign_ids(ctx, contents)?);
        }

        Ok(results)
    }
}

impl Default for HybridOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

fn pages_with_decision(
    results: &BTreeMap<usize, TriageResult>,
    decision: TriageDecision,
) -> Vec<usize> {
    results
        .values()
        .filter(|r| r.decision == decision)
        .map(|r| r.page)
        .collect()
}

/// Merge both paths by page index: local wins, then remote, then empty.
fn merge_results(
    total_pages: usize,
    selection: &PageSelection,
    mut local_results: BTreeMap<usize, Vec<ContentObject>>,
    mut remote_results: BTreeMap<usize, Vec<ContentObject>>,
) -> Vec<Vec<ContentObject>> {
    (0..total_pages)
        .map(|page| {
            if !selection.contains(page) {
                return Vec::new();
            }
            local_results
                .remove(&page)
                .or_else(|| remote_results.remove(&page))
                .unwrap_or_default()
        })
        .collect()
}

fn log_triage_summary(results: &BTreeMap<usize, TriageResult>) {
    let local = results
        .values()
        .filter(|r| r.decision == TriageDecision::Local)
        .count();
    let remote = results.len() - local;
    log::info!("triage summary: local={}, remote={}", local, remote);

    for result in results.values() {
        log::debug!(
            "page {}: {:?} (confidence={:.2})",
            result.page,
            result.decision,
            result.confidence
        );
    }
}
