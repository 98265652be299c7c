//! Capability seam for one live sandboxed browser view
//!
//! The shell implements [`BrowserHandle`] on top of its embedded browser
//! view and registers it with the [`crate::browser::SessionRegistry`] when
//! the view attaches. Page lifecycle signals arrive as a broadcast stream;
//! dropping a receiver is the listener teardown, so a raced-out waiter can
//! never fire late into unrelated state.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::CoreError;

/// Benign load-failure code: the navigation was superseded or aborted by a
/// subsequent one. Never treated as a failure.
pub const ERR_ABORTED: i32 = -3;

/// Liveness of the underlying view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Destroyed,
    Crashed,
}

impl Liveness {
    pub fn is_alive(self) -> bool {
        matches!(self, Liveness::Alive)
    }
}

/// Page lifecycle signals emitted by a view.
#[derive(Debug, Clone)]
pub enum PageEvent {
    LoadFinished {
        main_frame: bool,
    },
    LoadFailed {
        code: i32,
        description: String,
        url: String,
        main_frame: bool,
    },
    Destroyed,
    Crashed,
}

/// One live sandboxed browser view.
///
/// Liveness can change across any suspension point, so callers re-fetch
/// handles from the registry immediately before each use and are prepared
/// for a handle to die mid-operation.
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    fn id(&self) -> &str;

    fn liveness(&self) -> Liveness;

    /// URL currently loaded in the view.
    fn current_url(&self) -> String;

    /// Subscribes to page lifecycle signals. Only events emitted after the
    /// subscription are observed.
    fn events(&self) -> broadcast::Receiver<PageEvent>;

    /// Instructs the view to start loading `url`. Completion is signalled
    /// through the event stream, not this call.
    fn load_url(&self, url: &str) -> Result<(), CoreError>;

    /// Injects `source` into the current page and awaits its structured
    /// return value.
    async fn execute_script(&self, source: &str) -> Result<Value, CoreError>;
}
