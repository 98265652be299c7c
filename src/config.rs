//! Application configuration
//!
//! Loaded once at startup from a JSON file supplied by the shell and
//! consumed read-only by the core. Field names match the on-disk format
//! the shell has always used (camelCase keys, millisecond timeouts).

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;
use url::Url;

/// One configured webview session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebviewConfig {
    pub id: String,
    #[serde(rename = "initialUrl")]
    pub initial_url: String,
    /// Browser storage partition; sessions sharing a partition share
    /// cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(
        rename = "listDataBaseUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub list_data_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Stage timeouts, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub navigation: u64,
    #[serde(rename = "listExtraction")]
    pub list_extraction: u64,
    #[serde(rename = "detailExtraction")]
    pub detail_extraction: u64,
    #[serde(rename = "postNavigationDelay")]
    pub post_navigation_delay: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation: 90_000,
            list_extraction: 75_000,
            detail_extraction: 75_000,
            post_navigation_delay: 1_500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub webviews: Vec<WebviewConfig>,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(rename = "imageDownloadConcurrency", default = "default_concurrency")]
    pub image_download_concurrency: usize,
}

fn default_concurrency() -> usize {
    8
}

impl AppConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config JSON {}", path.display()))?;
        config.validate()?;
        info!(
            webviews = config.webviews.len(),
            "configuration loaded and validated"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.webviews.is_empty() {
            bail!("config requires a non-empty 'webviews' array");
        }
        for webview in &self.webviews {
            if webview.id.is_empty() {
                bail!("every webview requires a non-empty 'id'");
            }
            Url::parse(&webview.initial_url).with_context(|| {
                format!("webview \"{}\" has an invalid 'initialUrl'", webview.id)
            })?;
            if let Some(base) = &webview.list_data_base_url {
                Url::parse(base).with_context(|| {
                    format!("webview \"{}\" has an invalid 'listDataBaseUrl'", webview.id)
                })?;
            }
        }
        if self.image_download_concurrency == 0 {
            bail!("'imageDownloadConcurrency' must be a positive integer");
        }
        Ok(())
    }

    /// The session the tracker and default fetches run through.
    pub fn primary_webview(&self) -> &WebviewConfig {
        // validate() guarantees at least one entry.
        &self.webviews[0]
    }
}
