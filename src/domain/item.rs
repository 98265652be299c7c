//! Book records, tracked books and their price history
//!
//! Wire shapes match the persisted dataset format: book fields are
//! snake_case, history entries are camelCase. Prices are opaque,
//! locale-formatted display strings ("16,99 lei") and are never parsed
//! to numbers inside the core.

use serde::{Deserialize, Serialize};

/// One scraped product from a listing page.
///
/// `image_url` is transient: it is populated by the list-extraction script
/// and replaced by `local_image_filename` (or dropped) during image
/// acquisition, so a raw remote URL is never forwarded to the UI layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Absolute URL of the product page; natural key for tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_image_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
}

/// Current pricing fields as returned by the detail-extraction script.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    #[serde(default)]
    pub current_price: Option<String>,
    #[serde(default)]
    pub old_price: Option<String>,
    #[serde(default)]
    pub voucher_price: Option<String>,
    #[serde(default)]
    pub voucher_code: Option<String>,
}

/// One timestamped price observation in a tracked book's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub current_price: Option<String>,
    #[serde(default)]
    pub old_price: Option<String>,
    #[serde(default)]
    pub voucher_price: Option<String>,
    #[serde(default)]
    pub voucher_code: Option<String>,
}

impl PriceSnapshot {
    pub fn now(prices: &PriceInfo) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            current_price: prices.current_price.clone(),
            old_price: prices.old_price.clone(),
            voucher_price: prices.voucher_price.clone(),
            voucher_code: prices.voucher_code.clone(),
        }
    }
}

/// A user-selected book being monitored for price changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackedBook {
    #[serde(flatten)]
    pub book: BookItem,
    /// Chronological, append-only time series. Every check cycle appends a
    /// snapshot whether or not the price moved; retention is the caller's
    /// concern.
    #[serde(rename = "priceHistory", default)]
    pub price_history: Vec<PriceSnapshot>,
}

impl TrackedBook {
    /// Appends a snapshot, keeping the history chronological. Entries are
    /// never reordered or dropped here.
    pub fn push_snapshot(&mut self, snapshot: PriceSnapshot) {
        debug_assert!(
            self.price_history
                .last()
                .map_or(true, |last| last.timestamp <= snapshot.timestamp),
            "snapshot timestamps must be non-decreasing"
        );
        self.price_history.push(snapshot);
    }

    /// Whether the fetched prices differ from the last-known display
    /// fields. Used for logging and the priceUpdate event, not to decide
    /// whether to append history.
    pub fn prices_changed(&self, fetched: &PriceInfo) -> bool {
        self.book.current_price != fetched.current_price
            || self.book.old_price != fetched.old_price
            || self.book.voucher_price != fetched.voucher_price
            || self.book.voucher_code != fetched.voucher_code
    }

    /// Overwrites the display fields with the latest fetch.
    pub fn apply_prices(&mut self, fetched: &PriceInfo) {
        self.book.current_price = fetched.current_price.clone();
        self.book.old_price = fetched.old_price.clone();
        self.book.voucher_price = fetched.voucher_price.clone();
        self.book.voucher_code = fetched.voucher_code.clone();
    }
}

/// One category/group in the persisted tracker dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub books: Vec<TrackedBook>,
    #[serde(rename = "isCollapsed", default)]
    pub is_collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl BookCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            books: Vec::new(),
            is_collapsed: false,
            color: None,
        }
    }
}

/// Default dataset used when nothing has been persisted yet.
pub fn default_dataset() -> Vec<BookCategory> {
    vec![BookCategory::new("Untitled")]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(current: &str) -> PriceInfo {
        PriceInfo {
            current_price: Some(current.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn history_is_append_only_and_chronological() {
        let mut tracked = TrackedBook::default();
        for i in 0..5 {
            let mut snap = PriceSnapshot::now(&prices("16,99 lei"));
            snap.timestamp = 1_000 + i;
            tracked.push_snapshot(snap);
        }
        assert_eq!(tracked.price_history.len(), 5);
        let timestamps: Vec<i64> = tracked.price_history.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![1000, 1001, 1002, 1003, 1004]);

        // Earlier entries untouched by the latest append
        let before = tracked.price_history[..4].to_vec();
        let mut last = PriceSnapshot::now(&prices("14,49 lei"));
        last.timestamp = 2_000;
        tracked.push_snapshot(last);
        assert_eq!(&tracked.price_history[..4], &before[..]);
    }

    #[test]
    fn change_detection_covers_all_four_fields() {
        let mut tracked = TrackedBook::default();
        tracked.apply_prices(&prices("16,99 lei"));
        assert!(!tracked.prices_changed(&prices("16,99 lei")));
        assert!(tracked.prices_changed(&prices("12,00 lei")));

        let with_voucher = PriceInfo {
            current_price: Some("16,99 lei".to_string()),
            voucher_code: Some("CARTE10".to_string()),
            ..Default::default()
        };
        assert!(tracked.prices_changed(&with_voucher));
    }

    #[test]
    fn tracked_book_round_trips_original_json_shape() {
        let json = serde_json::json!({
            "title": "Ion",
            "link": "https://example.com/carte/ion",
            "current_price": "24,75 lei",
            "priceHistory": [
                { "timestamp": 1700000000000_i64, "currentPrice": "24,75 lei" }
            ]
        });
        let tracked: TrackedBook = serde_json::from_value(json).unwrap();
        assert_eq!(tracked.book.title.as_deref(), Some("Ion"));
        assert_eq!(tracked.price_history.len(), 1);
        assert_eq!(
            tracked.price_history[0].current_price.as_deref(),
            Some("24,75 lei")
        );

        let out = serde_json::to_value(&tracked).unwrap();
        assert!(out.get("priceHistory").is_some());
        assert_eq!(out["priceHistory"][0]["currentPrice"], "24,75 lei");
    }
}
