//! Navigation with a finish/fail/timeout race
//!
//! Drives a view to a target URL and resolves only once the main frame has
//! finished loading. Three outcomes race: load finished, load failed with a
//! non-benign code, and the timeout. A benign abort (a later navigation
//! superseding this one) is ignored and the wait continues. The event
//! receiver is dropped on every exit path, which is the listener teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::browser::handle::{PageEvent, ERR_ABORTED};
use crate::browser::registry::SessionRegistry;
use crate::error::CoreError;

/// Pause after load-finished before reading the final URL, to avoid racing
/// an in-flight redirect.
const SETTLE_DELAY: Duration = Duration::from_millis(50);

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// URL the view ended up on, which can differ from the requested one
    /// after redirects.
    pub loaded_url: String,
}

pub struct NavigationController {
    registry: Arc<SessionRegistry>,
    timeout: Duration,
}

impl NavigationController {
    pub fn new(registry: Arc<SessionRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub async fn navigate(&self, id: &str, target_url: &str) -> Result<LoadedPage, CoreError> {
        let handle = self.registry.get(id).await?;
        info!(id, url = target_url, timeout_secs = self.timeout.as_secs(), "navigating webview");

        // Subscribe before issuing the load so no signal can be missed.
        let mut events = handle.events();
        handle.load_url(target_url)?;

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                () = &mut deadline => {
                    warn!(id, url = target_url, "navigation timed out");
                    return Err(CoreError::NavigationTimeout {
                        timeout_secs: self.timeout.as_secs(),
                    });
                }
                event = events.recv() => match event {
                    Ok(PageEvent::LoadFinished { main_frame: true }) => {
                        tokio::time::sleep(SETTLE_DELAY).await;
                        if !handle.liveness().is_alive() {
                            return Err(CoreError::session_unavailable(
                                id,
                                "destroyed after load finished",
                            ));
                        }
                        let loaded_url = handle.current_url();
                        info!(id, %loaded_url, "navigation finished");
                        return Ok(LoadedPage { loaded_url });
                    }
                    Ok(PageEvent::LoadFailed { code, description, url, main_frame: true }) => {
                        if code == ERR_ABORTED {
                            warn!(id, %url, "navigation aborted (-3), still waiting");
                            continue;
                        }
                        return Err(CoreError::NavigationFailed { code, description });
                    }
                    Ok(PageEvent::Destroyed) | Ok(PageEvent::Crashed) => {
                        return Err(CoreError::session_unavailable(id, "died while loading"));
                    }
                    // Subframe signals are not ours to judge.
                    Ok(PageEvent::LoadFinished { main_frame: false })
                    | Ok(PageEvent::LoadFailed { main_frame: false, .. }) => {
                        debug!(id, "ignoring subframe load signal");
                        continue;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(id, missed, "navigation event stream lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        return Err(CoreError::session_unavailable(id, "event stream closed"));
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::handle::Liveness;
    use crate::test_support::FakeHandle;

    async fn controller_with(handle: &Arc<FakeHandle>) -> NavigationController {
        let registry = SessionRegistry::new();
        registry.register(handle.id_str(), handle.clone()).await;
        NavigationController::new(registry, Duration::from_secs(90))
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_on_main_frame_finish() {
        let handle = FakeHandle::new("main");
        let controller = controller_with(&handle).await;

        let nav = tokio::spawn(async move {
            controller.navigate("main", "https://example.com/list").await
        });
        tokio::task::yield_now().await;

        handle.set_current_url("https://example.com/list?page=1");
        handle.emit(PageEvent::LoadFinished { main_frame: true });

        let page = nav.await.unwrap().unwrap();
        assert_eq!(page.loaded_url, "https://example.com/list?page=1");
        assert_eq!(handle.load_requests(), vec!["https://example.com/list"]);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_at_configured_deadline() {
        let handle = FakeHandle::new("main");
        let registry = SessionRegistry::new();
        registry.register("main", handle.clone()).await;
        let controller = NavigationController::new(registry, Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        let err = controller.navigate("main", "https://example.com").await.unwrap_err();
        assert!(matches!(err, CoreError::NavigationTimeout { timeout_secs: 5 }));
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn second_navigate_after_timeout_sees_no_stale_listeners() {
        let handle = FakeHandle::new("main");
        let registry = SessionRegistry::new();
        registry.register("main", handle.clone()).await;
        let controller = NavigationController::new(registry, Duration::from_millis(100));

        let err = controller.navigate("main", "https://example.com/a").await.unwrap_err();
        assert!(matches!(err, CoreError::NavigationTimeout { .. }));

        // A single finish signal must complete exactly one navigation.
        let nav = tokio::spawn(async move {
            controller.navigate("main", "https://example.com/b").await
        });
        tokio::task::yield_now().await;
        handle.set_current_url("https://example.com/b");
        handle.emit(PageEvent::LoadFinished { main_frame: true });
        assert!(nav.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn benign_abort_keeps_waiting() {
        let handle = FakeHandle::new("main");
        let controller = controller_with(&handle).await;

        let nav = tokio::spawn(async move {
            controller.navigate("main", "https://example.com").await
        });
        tokio::task::yield_now().await;

        handle.emit(PageEvent::LoadFailed {
            code: ERR_ABORTED,
            description: "ERR_ABORTED".to_string(),
            url: "https://example.com".to_string(),
            main_frame: true,
        });
        tokio::task::yield_now().await;
        handle.set_current_url("https://example.com/final");
        handle.emit(PageEvent::LoadFinished { main_frame: true });

        assert_eq!(nav.await.unwrap().unwrap().loaded_url, "https://example.com/final");
    }

    #[tokio::test(start_paused = true)]
    async fn hard_failure_rejects_with_code() {
        let handle = FakeHandle::new("main");
        let controller = controller_with(&handle).await;

        let nav = tokio::spawn(async move {
            controller.navigate("main", "https://example.com").await
        });
        tokio::task::yield_now().await;
        handle.emit(PageEvent::LoadFailed {
            code: -105,
            description: "ERR_NAME_NOT_RESOLVED".to_string(),
            url: "https://example.com".to_string(),
            main_frame: true,
        });

        let err = nav.await.unwrap().unwrap_err();
        assert!(matches!(err, CoreError::NavigationFailed { code: -105, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn subframe_signals_are_ignored() {
        let handle = FakeHandle::new("main");
        let controller = controller_with(&handle).await;

        let nav = tokio::spawn(async move {
            controller.navigate("main", "https://example.com").await
        });
        tokio::task::yield_now().await;
        handle.emit(PageEvent::LoadFailed {
            code: -105,
            description: "iframe dns".to_string(),
            url: "https://ads.example.com".to_string(),
            main_frame: false,
        });
        handle.emit(PageEvent::LoadFinished { main_frame: false });
        tokio::task::yield_now().await;
        handle.emit(PageEvent::LoadFinished { main_frame: true });

        assert!(nav.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn view_dying_mid_wait_is_session_unavailable() {
        let handle = FakeHandle::new("main");
        let controller = controller_with(&handle).await;

        let nav = tokio::spawn(async move {
            controller.navigate("main", "https://example.com").await
        });
        tokio::task::yield_now().await;
        handle.set_liveness(Liveness::Crashed);
        handle.emit(PageEvent::Crashed);

        let err = nav.await.unwrap().unwrap_err();
        assert!(matches!(err, CoreError::SessionUnavailable { .. }));
    }
}
