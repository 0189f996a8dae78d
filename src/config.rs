//! Configuration for hybrid processing.
//!
//! String-valued knobs (backend names, triage modes) are parsed and
//! validated here, at the boundary; the rest of the crate only ever sees
//! the canonical enum-typed shapes. Legacy option aliases are translated
//! by the same parsers and never leak past this module.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted for the API key when none is configured.
pub const API_KEY_ENV_VAR: &str = "AZURE_API_KEY";

/// Default timeout for backend HTTP calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default URL for a local docling-serve instance.
pub const DOCLING_DEFAULT_URL: &str = "http://localhost:5001";

/// A supported remote document-AI backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// docling-serve (single-request convert API)
    Docling,

    /// Azure Document Intelligence (submit-then-poll API)
    Azure,
}

impl BackendKind {
    /// Parse a backend name.
    ///
    /// Accepts the deprecated alias `docling-fast` for [`BackendKind::Docling`].
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "docling" => Ok(BackendKind::Docling),
            "docling-fast" => {
                log::warn!("backend name 'docling-fast' is deprecated, use 'docling'");
                Ok(BackendKind::Docling)
            }
            "azure" => Ok(BackendKind::Azure),
            other => Err(Error::Config(format!(
                "unsupported backend '{}'. Supported values: docling, azure",
                other
            ))),
        }
    }

    /// Canonical backend name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Docling => "docling",
            BackendKind::Azure => "azure",
        }
    }

    /// Default URL for backends that ship one; Azure requires an explicit
    /// endpoint.
    pub fn default_url(&self) -> Option<&'static str> {
        match self {
            BackendKind::Docling => Some(DOCLING_DEFAULT_URL),
            BackendKind::Azure => None,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage mode for the hybrid engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriageMode {
    /// Score each page from its content and route accordingly
    #[default]
    Auto,

    /// Skip scoring; route every in-scope page to the remote backend
    Full,
}

impl TriageMode {
    /// Parse a triage mode name.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(TriageMode::Auto),
            "full" => Ok(TriageMode::Full),
            other => Err(Error::Config(format!(
                "unsupported triage mode '{}'. Supported values: auto, full",
                other
            ))),
        }
    }
}

/// Settings for remote backend communication and triage behavior.
#[derive(Debug, Clone)]
pub struct HybridSettings {
    /// Backend URL override; falls back to the backend's default URL
    pub url: Option<String>,

    /// API key for backends requiring key-based authentication
    pub api_key: Option<String>,

    /// HTTP call timeout
    pub timeout: Duration,

    /// Re-run remotely-routed pages locally when the remote path fails
    pub fallback_to_local: bool,

    /// Triage mode
    pub mode: TriageMode,
}

impl Default for HybridSettings {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            fallback_to_local: true,
            mode: TriageMode::Auto,
        }
    }
}

impl HybridSettings {
    /// Create settings with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the HTTP call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable local fallback.
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback_to_local = fallback;
        self
    }

    /// Set the triage mode.
    pub fn with_mode(mut self, mode: TriageMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate values that must hold for any backend.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".into()));
        }
        Ok(())
    }

    /// Effective URL for a backend: the configured override, else the
    /// backend's default, with any trailing slash removed.
    pub fn effective_url(&self, backend: BackendKind) -> Option<String> {
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| backend.default_url())
            .map(|u| u.trim_end_matches('/').to_string())
    }

    /// Effective API key: the configured key, else the environment fallback.
    pub fn effective_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok().filter(|k| !k.is_empty()))
    }
}

/// Full configuration for one hybrid processing run.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// The remote backend to route REMOTE pages to
    pub backend: BackendKind,

    /// Backend and triage settings
    pub hybrid: HybridSettings,

    /// Directory for the per-document triage log, or `None` to skip logging
    pub triage_log_dir: Option<PathBuf>,
}

impl ProcessConfig {
    /// Create a configuration for a backend with default settings.
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            hybrid: HybridSettings::default(),
            triage_log_dir: None,
        }
    }

    /// Replace the hybrid settings.
    pub fn with_hybrid(mut self, hybrid: HybridSettings) -> Self {
        self.hybrid = hybrid;
        self
    }

    /// Set the triage log directory.
    pub fn with_triage_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.triage_log_dir = Some(dir.into());
        self
    }
}
