//! Browser view abstraction: handles, session registry, navigation and
//! script injection
//!
//! The embedded browser engine itself lives in the shell; this module owns
//! everything from the handle seam inward.

pub mod handle;
pub mod navigation;
pub mod registry;
pub mod script;

pub use handle::{BrowserHandle, Liveness, PageEvent, ERR_ABORTED};
pub use navigation::{LoadedPage, NavigationController};
pub use registry::SessionRegistry;
pub use script::ScriptRunner;
