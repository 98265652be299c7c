//! Image acquisition with caching and content-type validation
//!
//! `acquire` never errors: every failure path logs, cleans up any partial
//! file, and resolves to `None`, so a broken image can never fail the list
//! fetch that wanted it.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::images::cache::{cache_filename, has_image_extension};
use crate::images::fetch::ImageSession;

pub struct ImageAcquisition {
    download_dir: PathBuf,
}

impl ImageAcquisition {
    /// Creates the service, making sure the download directory exists.
    /// Failure here is fatal at startup: without the cache directory no
    /// image can ever be stored.
    pub fn new(download_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let download_dir = download_dir.into();
        std::fs::create_dir_all(&download_dir).map_err(|err| {
            anyhow::anyhow!(
                "cannot create image download directory {}: {err}",
                download_dir.display()
            )
        })?;
        Ok(Self { download_dir })
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Fetches `remote_url` through `session` and persists it under its
    /// content-addressed name, returning the local filename. Cache hits
    /// skip the network entirely.
    pub async fn acquire(
        &self,
        remote_url: &str,
        referer: Option<&str>,
        session: &dyn ImageSession,
    ) -> Option<String> {
        let url = match Url::parse(remote_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                warn!(url = remote_url, scheme = url.scheme(), "unsupported image scheme");
                return None;
            }
            Err(err) => {
                warn!(url = remote_url, %err, "invalid image url");
                return None;
            }
        };

        let filename = cache_filename(&url);
        let filepath = self.download_dir.join(&filename);

        if fs::metadata(&filepath).await.is_ok() {
            debug!(%filename, "image cache hit");
            return Some(filename);
        }

        let mut response = match session.fetch_image(&url, referer).await {
            Ok(response) => response,
            Err(err) => {
                warn!(url = remote_url, %err, "image request failed");
                return None;
            }
        };

        if !response.is_success() {
            warn!(url = remote_url, status = response.status, "image request not OK");
            return None;
        }

        // Permissive fallback for misconfigured servers: a non-image
        // content type is tolerated only when the URL itself carries an
        // allow-listed image extension.
        let content_type = response.content_type.clone().unwrap_or_default();
        if !content_type.starts_with("image/") && !has_image_extension(&url) {
            warn!(url = remote_url, content_type, "response is not an image");
            return None;
        }

        let mut file = match fs::File::create(&filepath).await {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %filepath.display(), %err, "cannot create image file");
                return None;
            }
        };

        while let Some(chunk) = response.body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    warn!(url = remote_url, %err, "image stream error");
                    Self::cleanup(&filepath).await;
                    return None;
                }
            };
            if let Err(err) = file.write_all(&chunk).await {
                warn!(path = %filepath.display(), %err, "image write error");
                Self::cleanup(&filepath).await;
                return None;
            }
        }

        if let Err(err) = file.flush().await {
            warn!(path = %filepath.display(), %err, "image flush error");
            Self::cleanup(&filepath).await;
            return None;
        }

        debug!(%filename, "image saved");
        Some(filename)
    }

    /// Deletes a partially written file. A file that is already gone is
    /// not an error.
    async fn cleanup(filepath: &Path) {
        if let Err(err) = fs::remove_file(filepath).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %filepath.display(), %err, "partial image cleanup failed");
            }
        }
    }
}
