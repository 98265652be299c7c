//! In-memory registry of live browser sessions
//!
//! Maps logical session ids to view handles and owns liveness tracking:
//! a watcher task per registration consumes the handle's event stream and
//! deregisters it the moment the view is destroyed or crashes, so callers
//! never deregister manually.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::browser::handle::{BrowserHandle, PageEvent};
use crate::error::CoreError;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<dyn BrowserHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a handle under `id`. Last registration wins: an existing
    /// mapping is overwritten with a warning, which is the defined policy
    /// for a view that re-attaches under the same id.
    pub async fn register(self: &Arc<Self>, id: &str, handle: Arc<dyn BrowserHandle>) {
        let mut events = handle.events();
        {
            let mut sessions = self.sessions.write().await;
            if sessions.insert(id.to_string(), Arc::clone(&handle)).is_some() {
                warn!(id, "replacing existing webview registration");
            } else {
                info!(id, "webview registered");
            }
        }

        // Watch for the view's own death signals and drop the mapping.
        let registry: Weak<Self> = Arc::downgrade(self);
        let watched_id = id.to_string();
        let watched = Arc::downgrade(&handle);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(PageEvent::Destroyed) | Ok(PageEvent::Crashed) => break,
                    Ok(_) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            if let Some(registry) = registry.upgrade() {
                registry.deregister_if_same(&watched_id, &watched).await;
            }
        });
    }

    /// Returns the live handle for `id`, or [`CoreError::SessionUnavailable`]
    /// when the id is unknown or the handle is no longer alive.
    pub async fn get(&self, id: &str) -> Result<Arc<dyn BrowserHandle>, CoreError> {
        let sessions = self.sessions.read().await;
        let handle = sessions
            .get(id)
            .ok_or_else(|| CoreError::session_unavailable(id, "not registered"))?;
        if !handle.liveness().is_alive() {
            return Err(CoreError::session_unavailable(
                id,
                format!("{:?}", handle.liveness()).to_lowercase(),
            ));
        }
        Ok(Arc::clone(handle))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Removes the mapping only if it still points at the watched handle,
    /// so a dead view never evicts its last-registration-wins replacement.
    /// The map keeps an `Arc` of whatever is registered, so a failed
    /// upgrade proves the watched handle is no longer the current one.
    async fn deregister_if_same(&self, id: &str, watched: &Weak<dyn BrowserHandle>) {
        let mut sessions = self.sessions.write().await;
        let same = match (sessions.get(id), watched.upgrade()) {
            (Some(current), Some(watched)) => Arc::ptr_eq(current, &watched),
            (Some(_), None) | (None, _) => false,
        };
        if same {
            sessions.remove(id);
            debug!(id, "webview deregistered after destroy/crash");
        }
    }
}
