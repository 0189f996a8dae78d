//! Structured triage log output.
//!
//! One JSON file per processed document, recording the backend and every
//! page's routing decision. Written only when an output directory is
//! configured; write failures are logged and never abort processing.

use super::TriageResult;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Serialized form of one document's triage outcome.
#[derive(Debug, Serialize)]
struct TriageLogFile<'a> {
    document: &'a str,
    backend: &'a str,
    created_at: DateTime<Utc>,
    pages: Vec<&'a TriageResult>,
}

/// Writes per-document triage logs.
#[derive(Debug, Default)]
pub struct TriageLogger;

impl TriageLogger {
    /// Create a logger.
    pub fn new() -> Self {
        Self
    }

    /// Write the triage log for one document and return the file path.
    pub fn write_to_file(
        &self,
        output_dir: &Path,
        document_name: &str,
        backend: &str,
        results: &BTreeMap<usize, TriageResult>,
    ) -> Result<PathBuf> {
        let record = TriageLogFile {
            document: document_name,
            backend,
            created_at: Utc::now(),
            pages: results.values().collect(),
        };

        fs::create_dir_all(output_dir)?;
        let file_name = format!("{}.triage.json", stem_of(document_name));
        let path = output_dir.join(file_name);
        fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
        Ok(path)
    }

    /// Write the triage log, demoting any failure to a warning.
    pub fn write_or_warn(
        &self,
        output_dir: &Path,
        document_name: &str,
        backend: &str,
        results: &BTreeMap<usize, TriageResult>,
    ) {
        if let Err(err) = self.write_to_file(output_dir, document_name, backend, results) {
            log::warn!("failed to write triage log for {}: {}", document_name, err);
        }
    }
}

fn stem_of(document_name: &str) -> &str {
    let base = document_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(document_name);
    base.strip_suffix(".pdf").unwrap_or(base)
}
