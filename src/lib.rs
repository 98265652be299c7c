//! Bookwatch - webview orchestration and price-tracking engine
//!
//! This crate drives sandboxed browser views through navigation and timed
//! script injection to scrape book listings and pricing detail, downloads
//! cover images into a content-addressed local cache, and tracks price
//! history for user-curated items on a boosted/normal polling schedule.
//!
//! The GUI shell (window management, IPC marshalling, HTTP bridge) lives
//! outside this crate; it implements [`browser::BrowserHandle`] for its
//! embedded views and calls the entry points in [`commands`].

// Module declarations
pub mod browser;
pub mod commands;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod images;
pub mod limiter;
pub mod logging;
pub mod pipeline;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for easier access from the shell
pub use context::AppContext;
pub use error::CoreError;
