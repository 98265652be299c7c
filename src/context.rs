//! Application context: explicit wiring of every core component
//!
//! One context object is constructed at startup and passed by reference to
//! everything that needs it. There are no hidden singletons; tests build a
//! context around fakes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::browser::navigation::NavigationController;
use crate::browser::registry::SessionRegistry;
use crate::browser::script::ScriptRunner;
use crate::config::AppConfig;
use crate::domain::events::EventSink;
use crate::extractor::Extractor;
use crate::images::acquire::ImageAcquisition;
use crate::images::fetch::{ImageSession, ReqwestImageSession};
use crate::pipeline::detail::DetailOrchestrator;
use crate::pipeline::list::ListOrchestrator;
use crate::tracker::engine::PriceTracker;
use crate::tracker::schedule::TrackerSchedule;
use crate::tracker::store::TrackerStore;

pub struct AppContext {
    pub config: AppConfig,
    pub registry: Arc<SessionRegistry>,
    pub store: Arc<TrackerStore>,
    pub list: Arc<ListOrchestrator>,
    pub detail: Arc<DetailOrchestrator>,
    sink: Arc<dyn EventSink>,
    schedule: TrackerSchedule,
    /// One browsing session per configured partition for image fetches;
    /// the shell can override per session id.
    image_sessions: RwLock<HashMap<String, Arc<dyn ImageSession>>>,
    default_image_session: Arc<dyn ImageSession>,
}

impl AppContext {
    pub async fn new(
        config: AppConfig,
        download_dir: &Path,
        tracker_path: &Path,
        list_extractor: Arc<dyn Extractor>,
        detail_extractor: Arc<dyn Extractor>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        let registry = SessionRegistry::new();
        let navigation = Arc::new(NavigationController::new(
            Arc::clone(&registry),
            Duration::from_millis(config.timeouts.navigation),
        ));
        let scripts = Arc::new(ScriptRunner::new(Arc::clone(&registry)));
        let images = Arc::new(ImageAcquisition::new(download_dir)?);

        let list = Arc::new(ListOrchestrator::new(
            Arc::clone(&navigation),
            Arc::clone(&scripts),
            images,
            list_extractor,
            Duration::from_millis(config.timeouts.list_extraction),
            Duration::from_millis(config.timeouts.post_navigation_delay),
            config.image_download_concurrency,
        ));
        let detail = Arc::new(DetailOrchestrator::new(
            navigation,
            scripts,
            detail_extractor,
            Duration::from_millis(config.timeouts.detail_extraction),
            Duration::from_millis(config.timeouts.post_navigation_delay),
        ));

        let store = Arc::new(TrackerStore::new(tracker_path));
        store.load().await;

        Ok(Arc::new(Self {
            config,
            registry,
            store,
            list,
            detail,
            sink,
            schedule: TrackerSchedule::default(),
            image_sessions: RwLock::new(HashMap::new()),
            default_image_session: Arc::new(ReqwestImageSession::new()?),
        }))
    }

    /// Associates a browsing session with a webview id for image fetches.
    pub async fn register_image_session(&self, id: &str, session: Arc<dyn ImageSession>) {
        self.image_sessions
            .write()
            .await
            .insert(id.to_string(), session);
    }

    /// Session used to fetch images referenced by pages in `id`. Falls
    /// back to the shared default session when none was registered.
    pub async fn image_session(&self, id: &str) -> Arc<dyn ImageSession> {
        self.image_sessions
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default_image_session))
    }

    /// Builds the tracker bound to the primary webview session.
    pub fn tracker(self: &Arc<Self>) -> Arc<PriceTracker> {
        PriceTracker::new(
            Arc::clone(&self.detail),
            Arc::clone(&self.store),
            Arc::clone(&self.sink),
            self.schedule.clone(),
            self.config.primary_webview().id.clone(),
        )
    }

    /// Same as [`Self::tracker`] with a non-default schedule.
    pub fn tracker_with_schedule(self: &Arc<Self>, schedule: TrackerSchedule) -> Arc<PriceTracker> {
        PriceTracker::new(
            Arc::clone(&self.detail),
            Arc::clone(&self.store),
            Arc::clone(&self.sink),
            schedule,
            self.config.primary_webview().id.clone(),
        )
    }
}
