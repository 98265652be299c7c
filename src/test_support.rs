//! Shared fakes for tests
//!
//! A scriptable browser handle, an in-memory image session with call
//! counting, and an event sink that records everything it sees. These keep
//! individual tests focused on behavior instead of wiring.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast;
use url::Url;

use crate::browser::handle::{BrowserHandle, Liveness, PageEvent};
use crate::domain::events::{EventSink, PriceUpdate};
use crate::error::CoreError;
use crate::images::fetch::{ImageResponse, ImageSession};

/// What the fake returns for the next `execute_script` call.
pub enum ScriptOutcome {
    Value(Value),
    /// Never settles; exercises execution timeouts.
    Hang,
    Error(String),
}

pub struct FakeHandle {
    id: String,
    liveness: Mutex<Liveness>,
    current_url: Mutex<String>,
    events_tx: broadcast::Sender<PageEvent>,
    load_requests: Mutex<Vec<String>>,
    script_queue: Mutex<VecDeque<ScriptOutcome>>,
    /// When set, every `load_url` immediately signals a main-frame finish.
    auto_finish: bool,
}

impl FakeHandle {
    pub fn new(id: &str) -> Arc<Self> {
        Self::build(id, false)
    }

    /// A handle whose navigations always succeed instantly.
    pub fn auto_finishing(id: &str) -> Arc<Self> {
        Self::build(id, true)
    }

    fn build(id: &str, auto_finish: bool) -> Arc<Self> {
        let (events_tx, _) = broadcast::channel(64);
        Arc::new(Self {
            id: id.to_string(),
            liveness: Mutex::new(Liveness::Alive),
            current_url: Mutex::new(String::new()),
            events_tx,
            load_requests: Mutex::new(Vec::new()),
            script_queue: Mutex::new(VecDeque::new()),
            auto_finish,
        })
    }

    pub fn id_str(&self) -> &str {
        &self.id
    }

    pub fn emit(&self, event: PageEvent) {
        // No receivers is fine; nothing is waiting.
        let _ = self.events_tx.send(event);
    }

    pub fn set_liveness(&self, liveness: Liveness) {
        *self.liveness.lock().unwrap() = liveness;
    }

    /// Marks the view destroyed and emits the matching signal.
    pub fn kill(&self) {
        self.set_liveness(Liveness::Destroyed);
        self.emit(PageEvent::Destroyed);
    }

    pub fn set_current_url(&self, url: &str) {
        *self.current_url.lock().unwrap() = url.to_string();
    }

    pub fn load_requests(&self) -> Vec<String> {
        self.load_requests.lock().unwrap().clone()
    }

    pub fn queue_script(&self, outcome: ScriptOutcome) {
        self.script_queue.lock().unwrap().push_back(outcome);
    }
}

#[async_trait]
impl BrowserHandle for FakeHandle {
    fn id(&self) -> &str {
        &self.id
    }

    fn liveness(&self) -> Liveness {
        *self.liveness.lock().unwrap()
    }

    fn current_url(&self) -> String {
        self.current_url.lock().unwrap().clone()
    }

    fn events(&self) -> broadcast::Receiver<PageEvent> {
        self.events_tx.subscribe()
    }

    fn load_url(&self, url: &str) -> Result<(), CoreError> {
        self.load_requests.lock().unwrap().push(url.to_string());
        if self.auto_finish {
            self.set_current_url(url);
            self.emit(PageEvent::LoadFinished { main_frame: true });
        }
        Ok(())
    }

    async fn execute_script(&self, _source: &str) -> Result<Value, CoreError> {
        let outcome = self.script_queue.lock().unwrap().pop_front();
        match outcome {
            Some(ScriptOutcome::Value(value)) => Ok(value),
            Some(ScriptOutcome::Hang) => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
            Some(ScriptOutcome::Error(message)) => {
                Err(CoreError::session_unavailable(&self.id, message))
            }
            None => Ok(Value::Null),
        }
    }
}

/// Canned response for one URL.
pub struct FakeResponse {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
    fail_midstream: bool,
}

impl FakeResponse {
    pub fn ok(content_type: &str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.to_vec(),
            fail_midstream: false,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
            fail_midstream: false,
        }
    }

    /// Delivers one chunk, then errors the stream.
    pub fn failing_midstream(mut self) -> Self {
        self.fail_midstream = true;
        self
    }
}

#[derive(Default)]
pub struct FakeImageSession {
    responses: Mutex<HashMap<String, FakeResponse>>,
    requests: AtomicUsize,
    last_referer: Mutex<Option<String>>,
}

impl FakeImageSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: FakeResponse) {
        self.responses.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn last_referer(&self) -> Option<String> {
        self.last_referer.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSession for FakeImageSession {
    async fn fetch_image(&self, url: &Url, referer: Option<&str>) -> anyhow::Result<ImageResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last_referer.lock().unwrap() = referer.map(str::to_string);

        let responses = self.responses.lock().unwrap();
        let canned = responses
            .get(url.as_str())
            .ok_or_else(|| anyhow::anyhow!("no canned response for {url}"))?;

        let mut chunks: Vec<std::io::Result<Bytes>> =
            vec![Ok(Bytes::from(canned.body.clone()))];
        if canned.fail_midstream {
            chunks.push(Err(std::io::Error::other("connection reset")));
        }

        Ok(ImageResponse {
            status: canned.status,
            content_type: canned.content_type.clone(),
            body: stream::iter(chunks).boxed(),
        })
    }
}

/// Event sink that records every update it receives.
#[derive(Default)]
pub struct CountingSink {
    updates: Mutex<Vec<PriceUpdate>>,
}

impl CountingSink {
    pub fn updates(&self) -> Vec<PriceUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl EventSink for CountingSink {
    fn price_update(&self, update: PriceUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}
