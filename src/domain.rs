//! Domain model for scraped books, price history and extraction results

pub mod events;
pub mod extraction;
pub mod item;

pub use events::{EventSink, NullSink, PriceUpdate};
pub use extraction::ExtractionResult;
pub use item::{BookCategory, BookItem, PriceInfo, PriceSnapshot, TrackedBook};
