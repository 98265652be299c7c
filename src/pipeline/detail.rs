//! Detail extraction: navigate, inject, split specs and prices
//!
//! Turns an item-page URL into specification fields and current pricing
//! fields. A missing sub-object is not an error; it defaults to empty,
//! because a differently-shaped product page is still a valid page.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use crate::browser::navigation::NavigationController;
use crate::browser::script::ScriptRunner;
use crate::domain::item::PriceInfo;
use crate::error::CoreError;
use crate::extractor::Extractor;

/// Verbatim specs and prices sub-objects from the detail script.
#[derive(Debug, Clone)]
pub struct DetailData {
    pub specs: Value,
    pub prices: Value,
}

impl DetailData {
    /// Lenient typed view of the pricing fields for the tracker.
    pub fn price_info(&self) -> PriceInfo {
        serde_json::from_value(self.prices.clone()).unwrap_or_default()
    }
}

pub struct DetailOrchestrator {
    navigation: Arc<NavigationController>,
    scripts: Arc<ScriptRunner>,
    extractor: Arc<dyn Extractor>,
    execution_timeout: Duration,
    post_navigation_delay: Duration,
}

impl DetailOrchestrator {
    pub fn new(
        navigation: Arc<NavigationController>,
        scripts: Arc<ScriptRunner>,
        extractor: Arc<dyn Extractor>,
        execution_timeout: Duration,
        post_navigation_delay: Duration,
    ) -> Self {
        Self {
            navigation,
            scripts,
            extractor,
            execution_timeout,
            post_navigation_delay,
        }
    }

    pub async fn fetch_detail(
        &self,
        session_id: &str,
        item_url: &str,
    ) -> Result<DetailData, CoreError> {
        self.navigation.navigate(session_id, item_url).await?;

        if !self.post_navigation_delay.is_zero() {
            tokio::time::sleep(self.post_navigation_delay).await;
        }

        let result = self
            .scripts
            .execute(
                session_id,
                self.extractor.source(),
                self.extractor.name(),
                self.execution_timeout,
            )
            .await?;

        let data = result.into_data()?;
        let empty = Value::Object(serde_json::Map::new());
        let specs = data.get("specs").cloned().unwrap_or_else(|| empty.clone());
        let prices = data.get("prices").cloned().unwrap_or(empty);
        info!(session_id, url = item_url, "detail extraction succeeded");
        Ok(DetailData { specs, prices })
    }
}
