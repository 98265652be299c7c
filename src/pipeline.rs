//! Extraction orchestrators: listing pages and item detail pages

pub mod detail;
pub mod list;

pub use detail::{DetailData, DetailOrchestrator};
pub use list::ListOrchestrator;
