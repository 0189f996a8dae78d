//! Integration tests for the hybrid orchestrator.

use doctriage::backend::{BackendClient, HybridRequest, HybridResponse};
use doctriage::model::TextLine;
use doctriage::{
    BackendKind, BoundingBox, ContentObject, Error, HybridOrchestrator, HybridSettings,
    InputDocument, PageInfo, PageSelection, ProcessConfig, Stage, TriageDecision, TriageEngine,
    TriageMode, TriageScorer, TriageSignals,
};
use futures::future::BoxFuture;
use serde_json::json;
use std::sync::Arc;

/// Mock backend speaking the docling schema.
struct MockBackend {
    response: Result<serde_json::Value, String>,
}

impl MockBackend {
    fn succeeding(response: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(response),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Err(message.to_string()),
        })
    }
}

impl BackendClient for MockBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Docling
    }

    fn convert_async<'a>(
        &'a self,
        _request: &'a HybridRequest,
    ) -> BoxFuture<'a, doctriage::Result<HybridResponse>> {
        Box::pin(async move {
            match &self.response {
                Ok(json) => Ok(HybridResponse::new(json.clone())),
                Err(message) => Err(Error::Backend {
                    backend: "docling",
                    message: message.clone(),
                }),
            }
        })
    }
}

/// Scorer that keeps every page on the local path.
struct AlwaysLocal;

impl TriageScorer for AlwaysLocal {
    fn score(&self, _signals: &TriageSignals) -> (TriageDecision, f64) {
        (TriageDecision::Local, 1.0)
    }
}

fn line(page: usize, top: f64, text: &str) -> ContentObject {
    ContentObject::text_line(
        BoundingBox::new(page, 72.0, top - 11.0, 500.0, top),
        TextLine::new(text, 11.0),
    )
}

fn document(pages: usize) -> InputDocument {
    let raw = (0..pages)
        .map(|p| {
            vec![
                line(p, 700.0, &format!("Opening line of page {}.", p)),
                line(p, 686.0, "More text continuing the paragraph."),
            ]
        })
        .collect();
    InputDocument::new("sample.pdf", b"%PDF-1.7 test".to_vec(), vec![PageInfo::letter(); pages])
        .with_raw_contents(raw)
}

fn docling_page_one() -> serde_json::Value {
    json!({
        "texts": [
            {
                "label": "section_header",
                "text": "Remote Heading",
                "prov": [{"page_no": 1, "bbox": {"l": 72.0, "t": 80.0, "r": 400.0, "b": 100.0, "coord_origin": "TOPLEFT"}}]
            },
            {
                "label": "text",
                "text": "Remote body paragraph.",
                "prov": [{"page_no": 1, "bbox": {"l": 72.0, "t": 120.0, "r": 400.0, "b": 140.0, "coord_origin": "TOPLEFT"}}]
            }
        ]
    })
}

fn full_remote_config() -> ProcessConfig {
    ProcessConfig::new(BackendKind::Docling)
        .with_hybrid(HybridSettings::new().with_mode(TriageMode::Full))
}

#[tokio::test]
async fn out_of_scope_pages_are_empty_but_present() {
    let orchestrator =
        HybridOrchestrator::new().with_client(MockBackend::succeeding(docling_page_one()));
    let document = document(4);

    let result = orchestrator
        .process(
            &document,
            &full_remote_config(),
            &PageSelection::Pages(vec![0]),
        )
        .await
        .unwrap();

    assert_eq!(result.len(), 4);
    assert!(!result[0].is_empty());
    for page in &result[1..] {
        assert!(page.is_empty());
    }
}

#[tokio::test]
async fn remote_content_reaches_merged_result() {
    let orchestrator =
        HybridOrchestrator::new().with_client(MockBackend::succeeding(docling_page_one()));
    let document = document(1);

    let result = orchestrator
        .process(&document, &full_remote_config(), &PageSelection::All)
        .await
        .unwrap();

    let texts: Vec<String> = result[0].iter().map(|o| o.plain_text()).collect();
    assert!(texts.contains(&"Remote Heading".to_string()));
    assert!(texts.contains(&"Remote body paragraph.".to_string()));

    // Backend-born objects get ids from the shared run counter.
    assert!(result[0].iter().all(|o| o.id.is_some()));
}

#[tokio::test]
async fn fallback_result_equals_local_only_result() {
    let document = document(2);

    // Remote path fails on every page; fallback reprocesses them locally.
    let with_fallback = HybridOrchestrator::new()
        .with_client(MockBackend::failing("status 503"))
        .process(&document, &full_remote_config(), &PageSelection::All)
        .await
        .unwrap();

    // Reference: the local path alone over the same pages.
    let local_only = HybridOrchestrator::new()
        .with_triage_engine(TriageEngine::with_scorer(Box::new(AlwaysLocal)))
        .with_client(MockBackend::failing("never called"))
        .process(
            &document,
            &ProcessConfig::new(BackendKind::Docling),
            &PageSelection::All,
        )
        .await
        .unwrap();

    let fallback_json = serde_json::to_value(&with_fallback).unwrap();
    let local_json = serde_json::to_value(&local_only).unwrap();
    assert_eq!(fallback_json, local_json);
}

#[tokio::test]
async fn disabled_fallback_fails_whole_document() {
    let config = ProcessConfig::new(BackendKind::Docling).with_hybrid(
        HybridSettings::new()
            .with_mode(TriageMode::Full)
            .with_fallback(false),
    );

    let result = HybridOrchestrator::new()
        .with_client(MockBackend::failing("status 503"))
        .process(&document(2), &config, &PageSelection::All)
        .await;

    match result {
        Err(Error::Processing { stage, .. }) => assert_eq!(stage, Stage::Remote),
        other => panic!("expected remote-stage failure, got {:?}", other),
    }
}

#[tokio::test]
async fn local_path_produces_paragraphs() {
    let orchestrator = HybridOrchestrator::new()
        .with_triage_engine(TriageEngine::with_scorer(Box::new(AlwaysLocal)))
        .with_client(MockBackend::failing("never called"));

    let result = orchestrator
        .process(
            &document(1),
            &ProcessConfig::new(BackendKind::Docling),
            &PageSelection::All,
        )
        .await
        .unwrap();

    assert_eq!(result[0].len(), 1);
    assert_eq!(result[0][0].kind_name(), "paragraph");
    assert!(result[0][0]
        .plain_text()
        .contains("More text continuing the paragraph."));
}

#[tokio::test]
async fn triage_log_written_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let config = full_remote_config().with_triage_log_dir(dir.path());

    HybridOrchestrator::new()
        .with_client(MockBackend::succeeding(docling_page_one()))
        .process(&document(2), &config, &PageSelection::All)
        .await
        .unwrap();

    let log_path = dir.path().join("sample.triage.json");
    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(log_path).unwrap()).unwrap();
    assert_eq!(json["document"], "sample.pdf");
    assert_eq!(json["backend"], "docling");
    assert_eq!(json["pages"].as_array().unwrap().len(), 2);
    // Full mode: every page remote at full confidence.
    for page in json["pages"].as_array().unwrap() {
        assert_eq!(page["decision"], "remote");
        assert_eq!(page["confidence"], 1.0);
    }
}

#[tokio::test]
async fn auto_triage_is_deterministic_across_runs() {
    let document = document(3);
    let config = ProcessConfig::new(BackendKind::Docling);
    let orchestrator =
        HybridOrchestrator::new().with_client(MockBackend::succeeding(docling_page_one()));

    let first = orchestrator
        .process(&document, &config, &PageSelection::All)
        .await
        .unwrap();
    let second = orchestrator
        .process(&document, &config, &PageSelection::All)
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}
