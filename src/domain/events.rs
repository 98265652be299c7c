//! Outbound events for a live UI to react to incrementally
//!
//! The sink is an optional collaborator: the tracker emits one
//! `priceUpdate` per tracked book per check cycle, and a missing UI simply
//! gets the no-op sink. Absence has no effect on correctness.

use serde::Serialize;

use crate::domain::item::TrackedBook;

/// Per-book notification emitted during a price check cycle.
#[derive(Debug, Clone, Serialize)]
pub struct PriceUpdate {
    /// Product page URL of the book (its natural key).
    pub link: String,
    /// Latest state of the book after the fetch, when it succeeded.
    #[serde(rename = "bookData", skip_serializing_if = "Option::is_none")]
    pub book: Option<TrackedBook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Receiver for core events. Implemented by the shell (IPC broadcast,
/// HTTP push); must not block.
pub trait EventSink: Send + Sync {
    fn price_update(&self, update: PriceUpdate);
}

/// Sink used when no UI is attached.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn price_update(&self, _update: PriceUpdate) {}
}
