//! Page triage: deciding, per page, whether local structural processing or
//! a remote document-AI backend should handle it.
//!
//! Triage is purely computational. Signal extraction and scoring are pure
//! functions of a page's filtered content, so auto mode scores pages in
//! parallel; the scoring policy itself is a replaceable strategy behind
//! [`TriageScorer`].

mod logger;

pub use logger::TriageLogger;

use crate::model::{ContentKind, ContentObject, PageSelection};
use crate::config::{HybridSettings, TriageMode};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Routing decision for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageDecision {
    /// Process with the local structural pipeline
    Local,

    /// Send to the remote backend
    Remote,
}

/// Page-level features feeding the routing decision.
///
/// Signals are computed once per page and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageSignals {
    /// Number of text-bearing objects (lines, paragraphs, headings)
    pub text_objects: usize,

    /// Number of tables
    pub table_count: usize,

    /// Largest cell count among the page's tables
    pub max_table_cells: usize,

    /// Whether any table carries merged (spanning) cells
    pub has_merged_cells: bool,

    /// Number of figures
    pub figure_count: usize,

    /// Number of formulas
    pub formula_count: usize,

    /// Figure area as a fraction of all content area
    pub image_area_ratio: f64,
}

impl TriageSignals {
    /// Signals for a page that was not scored (full mode).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Extract signals from a page's filtered content.
    pub fn from_contents(contents: &[ContentObject]) -> Self {
        let mut signals = Self::default();
        let mut total_area = 0.0f64;
        let mut figure_area = 0.0f64;

        for object in contents {
            let area = object.bbox.width().max(0.0) * object.bbox.height().max(0.0);
            total_area += area;

            match &object.kind {
                ContentKind::TextLine(_) | ContentKind::Paragraph(_) | ContentKind::Heading(_) => {
                    signals.text_objects += 1;
                }
                ContentKind::List(_) => signals.text_objects += 1,
                ContentKind::Table(table) => {
                    signals.table_count += 1;
                    signals.max_table_cells = signals.max_table_cells.max(table.cells.len());
                    signals.has_merged_cells |= table.has_merged_cells();
                }
                ContentKind::Figure(_) => {
                    signals.figure_count += 1;
                    figure_area += area;
                }
                ContentKind::Formula(_) => signals.formula_count += 1,
            }
        }

        if total_area > 0.0 {
            signals.image_area_ratio = figure_area / total_area;
        }
        signals
    }
}

/// Immutable outcome of triaging one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResult {
    /// 0-based page index
    pub page: usize,

    /// Routing decision
    pub decision: TriageDecision,

    /// Decision confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Signal record the decision was derived from
    pub signals: TriageSignals,
}

impl TriageResult {
    /// A page routed to the local pipeline.
    pub fn local(page: usize, confidence: f64, signals: TriageSignals) -> Self {
        Self {
            page,
            decision: TriageDecision::Local,
            confidence,
            signals,
        }
    }

    /// A page routed to the remote backend.
    pub fn remote(page: usize, confidence: f64, signals: TriageSignals) -> Self {
        Self {
            page,
            decision: TriageDecision::Remote,
            confidence,
            signals,
        }
    }
}

/// Scoring strategy mapping signals to a decision and confidence.
///
/// Implementations must be pure: identical signals yield identical output.
pub trait TriageScorer: Send + Sync {
    /// Score one page's signals.
    fn score(&self, signals: &TriageSignals) -> (TriageDecision, f64);
}

/// Default scoring policy.
///
/// Routes a page remote when its content suggests structure the local
/// passes handle poorly: complex or merged-cell tables, image-dominated
/// layouts, formula-heavy pages, or pages with too little recognized text
/// to anchor local detection. The weights are tunable policy, not contract.
#[derive(Debug, Clone, Default)]
pub struct DefaultScorer;

impl DefaultScorer {
    const COMPLEX_TABLE_CELLS: usize = 12;
    const SPARSE_TEXT_OBJECTS: usize = 3;
    const IMAGE_HEAVY_RATIO: f64 = 0.5;
    const DECISION_THRESHOLD: f64 = 0.5;

    fn remote_score(&self, signals: &TriageSignals) -> f64 {
        let mut score: f64 = 0.0;

        if signals.has_merged_cells {
            score += 0.35;
        }
        if signals.max_table_cells >= Self::COMPLEX_TABLE_CELLS {
            score += 0.25;
        } else if signals.table_count > 0 {
            score += 0.1;
        }
        if signals.image_area_ratio >= Self::IMAGE_HEAVY_RATIO {
            score += 0.3;
        }
        if signals.formula_count > 0 {
            score += 0.15;
        }
        if signals.text_objects <= Self::SPARSE_TEXT_OBJECTS {
            score += 0.2;
        }

        score.min(1.0)
    }
}

impl TriageScorer for DefaultScorer {
    fn score(&self, signals: &TriageSignals) -> (TriageDecision, f64) {
        let score = self.remote_score(signals);
        if score >= Self::DECISION_THRESHOLD {
            (TriageDecision::Remote, score)
        } else {
            (TriageDecision::Local, 1.0 - score)
        }
    }
}

/// The triage engine: one entry point over a swappable scoring strategy.
pub struct TriageEngine {
    scorer: Box<dyn TriageScorer>,
}

impl TriageEngine {
    /// Engine with the default scoring policy.
    pub fn new() -> Self {
        Self {
            scorer: Box::new(DefaultScorer),
        }
    }

    /// Engine with a custom scoring policy.
    pub fn with_scorer(scorer: Box<dyn TriageScorer>) -> Self {
        Self { scorer }
    }

    /// Triage every in-scope page of a document.
    ///
    /// `filtered_by_page` holds the filtered content of each page. Pages
    /// outside `selection` are not triaged and do not appear in the result.
    /// Full mode assigns every in-scope page to the remote backend with
    /// confidence 1.0 and empty signals, without scoring.
    pub fn triage_all_pages(
        &self,
        filtered_by_page: &BTreeMap<usize, Vec<ContentObject>>,
        selection: &PageSelection,
        settings: &HybridSettings,
    ) -> BTreeMap<usize, TriageResult> {
        let in_scope: Vec<(usize, &Vec<ContentObject>)> = filtered_by_page
            .iter()
            .filter(|(page, _)| selection.contains(**page))
            .map(|(page, contents)| (*page, contents))
            .collect();

        if settings.mode == TriageMode::Full {
            log::info!("triage mode=full: all {} pages to backend", in_scope.len());
            return in_scope
                .into_iter()
                .map(|(page, _)| (page, TriageResult::remote(page, 1.0, TriageSignals::empty())))
                .collect();
        }

        in_scope
            .into_par_iter()
            .map(|(page, contents)| {
                let signals = TriageSignals::from_contents(contents);
                let (decision, confidence) = self.scorer.score(&signals);
                log::debug!(
                    "page {}: {:?} (confidence={:.2})",
                    page,
                    decision,
                    confidence
                );
                (page, TriageResult { page, decision, confidence, signals })
            })
            .collect()
    }
}

impl Default for TriageEngine {
    fn default() -> Self {
        Self::new()
    }
}
