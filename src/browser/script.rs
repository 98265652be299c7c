//! Timed script injection
//!
//! Injects an extraction script into the current page and validates its
//! boxed return value against the tagged result contract, racing execution
//! against a per-call timeout.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::browser::registry::SessionRegistry;
use crate::domain::extraction::ExtractionResult;
use crate::error::CoreError;

pub struct ScriptRunner {
    registry: Arc<SessionRegistry>,
}

impl ScriptRunner {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Runs `source` in the page loaded in session `id`. `label` names the
    /// script in logs and timeout errors ("listExtraction" etc.).
    pub async fn execute(
        &self,
        id: &str,
        source: &str,
        label: &str,
        timeout: Duration,
    ) -> Result<ExtractionResult, CoreError> {
        let handle = self.registry.get(id).await?;
        info!(id, label, timeout_secs = timeout.as_secs(), "executing script");

        let value = match tokio::time::timeout(timeout, handle.execute_script(source)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(id, label, "script execution timed out");
                return Err(CoreError::ExecutionTimeout {
                    label: label.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        ExtractionResult::from_script_value(value)
    }
}
