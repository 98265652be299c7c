//! Extraction scripts as swappable capabilities
//!
//! The orchestration core never inspects a script's internals, only the
//! tagged result it settles to. Site-specific scripts are loaded from disk
//! at startup; a missing or empty file degrades to a stub source that
//! reports its own failure through the normal contract instead of taking
//! the application down.

use std::path::Path;

use tracing::{error, info};

/// One injectable extraction script.
pub trait Extractor: Send + Sync {
    /// Name used for logs and timeout errors, e.g. "listExtraction".
    fn name(&self) -> &str;

    /// Script source executed in the page context.
    fn source(&self) -> &str;
}

pub struct ScriptExtractor {
    name: String,
    source: String,
}

impl ScriptExtractor {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Loads the script from `path`, falling back to a degraded stub when
    /// the file is missing or empty.
    pub fn from_file(name: impl Into<String>, path: &Path) -> Self {
        let name = name.into();
        match std::fs::read_to_string(path) {
            Ok(source) if !source.trim().is_empty() => {
                info!(name, path = %path.display(), "extraction script loaded");
                Self { name, source }
            }
            Ok(_) => {
                error!(name, path = %path.display(), "extraction script is empty");
                Self::degraded(name)
            }
            Err(err) => {
                error!(name, path = %path.display(), %err, "failed to load extraction script");
                Self::degraded(name)
            }
        }
    }

    fn degraded(name: String) -> Self {
        let source = format!(
            "(() => ({{ success: false, error: \"{name} script load failed\" }}))()"
        );
        Self { name, source }
    }
}

impl Extractor for ScriptExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> &str {
        &self.source
    }
}
