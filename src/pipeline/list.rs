//! List extraction: navigate, inject, download cover images
//!
//! Turns a listing-page URL into normalized book records whose transient
//! remote image URLs have been replaced by local cache filenames. The
//! replacement is mandatory even when a download fails, so a raw remote
//! URL never reaches the UI layer.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::browser::navigation::NavigationController;
use crate::browser::script::ScriptRunner;
use crate::domain::item::BookItem;
use crate::error::CoreError;
use crate::extractor::Extractor;
use crate::images::acquire::ImageAcquisition;
use crate::images::fetch::ImageSession;
use crate::limiter::run_limited;

pub struct ListOrchestrator {
    navigation: Arc<NavigationController>,
    scripts: Arc<ScriptRunner>,
    images: Arc<ImageAcquisition>,
    extractor: Arc<dyn Extractor>,
    execution_timeout: Duration,
    post_navigation_delay: Duration,
    download_concurrency: usize,
}

impl ListOrchestrator {
    pub fn new(
        navigation: Arc<NavigationController>,
        scripts: Arc<ScriptRunner>,
        images: Arc<ImageAcquisition>,
        extractor: Arc<dyn Extractor>,
        execution_timeout: Duration,
        post_navigation_delay: Duration,
        download_concurrency: usize,
    ) -> Self {
        Self {
            navigation,
            scripts,
            images,
            extractor,
            execution_timeout,
            post_navigation_delay,
            download_concurrency,
        }
    }

    pub async fn fetch_list(
        &self,
        session_id: &str,
        page_url: &str,
        session: Arc<dyn ImageSession>,
    ) -> Result<Vec<BookItem>, CoreError> {
        let page = self.navigation.navigate(session_id, page_url).await?;

        if !self.post_navigation_delay.is_zero() {
            // Let client-side rendering finish before scraping.
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
        let mut items: Vec<BookItem> = match data {
            serde_json::Value::Null => Vec::new(),
            other => serde_json::from_value(other).map_err(|err| {
                CoreError::InvalidExtractionResult {
                    detail: format!("list payload is not an item array: {err}"),
                }
            })?,
        };
        info!(session_id, count = items.len(), "list extraction succeeded");

        self.download_images(&mut items, &page.loaded_url, session).await;
        Ok(items)
    }

    /// Downloads every item's cover image with bounded concurrency, then
    /// swaps `image_url` for `local_image_filename` (or just drops it).
    async fn download_images(
        &self,
        items: &mut [BookItem],
        referer: &str,
        session: Arc<dyn ImageSession>,
    ) {
        let pending: Vec<(usize, String)> = items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| item.image_url.clone().map(|url| (idx, url)))
            .collect();
        if pending.is_empty() {
            return;
        }

        info!(
            count = pending.len(),
            limit = self.download_concurrency,
            "starting image download batch"
        );
        let tasks: Vec<_> = pending
            .iter()
            .map(|(idx, url)| {
                let images = Arc::clone(&self.images);
                let session = Arc::clone(&session);
                let url = url.clone();
                let referer = referer.to_string();
                let idx = *idx;
                async move {
                    let filename = images.acquire(&url, Some(&referer), session.as_ref()).await;
                    Ok((idx, filename))
                }
            })
            .collect();

        let results = run_limited(tasks, self.download_concurrency).await;

        let mut failed = 0usize;
        for outcome in results.into_iter().flatten() {
            let (idx, filename) = outcome;
            if filename.is_none() {
                failed += 1;
            }
            items[idx].local_image_filename = filename;
        }
        // The remote URL is transient regardless of download outcome.
        for (idx, _) in &pending {
            items[*idx].image_url = None;
        }
        if failed > 0 {
            warn!(failed, "some cover images could not be downloaded");
        }
    }
}
