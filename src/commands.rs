//! Entry points the shell's IPC handlers and HTTP bridge dispatch to
//!
//! Responses carry the `{ success, ... }` envelope the renderer and the
//! HTTP clients have always consumed: failures come back as a tagged
//! envelope with an error string, never as a transport-level error.

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::context::AppContext;
use crate::domain::item::{BookCategory, BookItem};

#[derive(Debug, Serialize)]
pub struct ListFetchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<BookItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetailFetchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Scrapes a listing page in the given session.
pub async fn fetch_list_data(
    ctx: &AppContext,
    session_id: &str,
    page_url: &str,
) -> ListFetchResponse {
    let session = ctx.image_session(session_id).await;
    match ctx.list.fetch_list(session_id, page_url, session).await {
        Ok(items) => ListFetchResponse {
            success: true,
            data: Some(items),
            error: None,
        },
        Err(err) => {
            error!(session_id, page_url, error = %err, "list fetch failed");
            ListFetchResponse {
                success: false,
                data: None,
                error: Some(err.to_string()),
            }
        }
    }
}

/// Scrapes an item page for specs and current prices.
pub async fn fetch_detail_data(
    ctx: &AppContext,
    session_id: &str,
    item_url: &str,
) -> DetailFetchResponse {
    match ctx.detail.fetch_detail(session_id, item_url).await {
        Ok(detail) => DetailFetchResponse {
            success: true,
            details: Some(detail.specs),
            prices: Some(detail.prices),
            error: None,
        },
        Err(err) => {
            error!(session_id, item_url, error = %err, "detail fetch failed");
            DetailFetchResponse {
                success: false,
                details: None,
                prices: None,
                error: Some(err.to_string()),
            }
        }
    }
}

/// Returns the persisted tracker dataset for the UI.
pub async fn load_tracked_books(ctx: &AppContext) -> Vec<BookCategory> {
    ctx.store.snapshot().await
}

/// Replaces the tracker dataset after a user edit and persists it.
/// Returns whether the write succeeded.
pub async fn save_tracked_books(ctx: &AppContext, categories: Vec<BookCategory>) -> bool {
    ctx.store.replace(categories).await;
    match ctx.store.save().await {
        Ok(()) => true,
        Err(err) => {
            error!(error = %err, "failed to save tracker dataset");
            false
        }
    }
}
