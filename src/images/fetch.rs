//! Session-scoped image fetching
//!
//! Downloads go through the browsing session that referenced the image so
//! cookies and auth context match the page. [`ImageSession`] is the seam;
//! the production implementation wraps a cookie-keeping reqwest client per
//! configured session partition.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use url::Url;

/// Standard browser-like request headers for image fetches.
const IMAGE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";

/// Response handed back from a session fetch, body still streaming.
pub struct ImageResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: BoxStream<'static, std::io::Result<Bytes>>,
}

impl ImageResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A browsing session capable of fetching images with the page's cookie
/// and auth context.
#[async_trait]
pub trait ImageSession: Send + Sync {
    async fn fetch_image(&self, url: &Url, referer: Option<&str>) -> anyhow::Result<ImageResponse>;
}

/// Cookie-keeping HTTP session standing in for one browser partition.
pub struct ReqwestImageSession {
    client: reqwest::Client,
}

impl ReqwestImageSession {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageSession for ReqwestImageSession {
    async fn fetch_image(&self, url: &Url, referer: Option<&str>) -> anyhow::Result<ImageResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(IMAGE_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(IMAGE_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("image"));
        headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("no-cors"));
        headers.insert("Sec-Fetch-Site", HeaderValue::from_static("same-origin"));
        if let Some(referer) = referer.filter(|r| r.starts_with("http")) {
            if let Ok(value) = HeaderValue::from_str(referer) {
                headers.insert(REFERER, value);
            }
        }

        let response = self.client.get(url.clone()).headers(headers).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();

        Ok(ImageResponse {
            status,
            content_type,
            body,
        })
    }
}
