//! Image acquisition: content-addressed caching, session-scoped download
//! and safe serving of cached files

pub mod acquire;
pub mod cache;
pub mod fetch;

pub use acquire::ImageAcquisition;
pub use cache::{cache_filename, resolve_cached_path};
pub use fetch::{ImageResponse, ImageSession, ReqwestImageSession};
