//! Price check cycles on a self-rescheduling timer
//!
//! One cycle visits every tracked book across every category, strictly
//! sequentially: the shared webview cannot serve two navigations at once.
//! A snapshot is appended on every successful fetch whether or not the
//! price moved (the history is a time series, not a change log). One
//! book's failure never aborts the cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::events::{EventSink, PriceUpdate};
use crate::domain::item::PriceSnapshot;
use crate::pipeline::detail::DetailOrchestrator;
use crate::tracker::schedule::TrackerSchedule;
use crate::tracker::store::TrackerStore;

pub struct PriceTracker {
    detail: Arc<DetailOrchestrator>,
    store: Arc<TrackerStore>,
    sink: Arc<dyn EventSink>,
    schedule: TrackerSchedule,
    /// Session the tracker drives its detail fetches through.
    session_id: String,
    cancel: CancellationToken,
    checking: AtomicBool,
}

impl PriceTracker {
    pub fn new(
        detail: Arc<DetailOrchestrator>,
        store: Arc<TrackerStore>,
        sink: Arc<dyn EventSink>,
        schedule: TrackerSchedule,
        session_id: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            detail,
            store,
            sink,
            schedule,
            session_id: session_id.into(),
            cancel: CancellationToken::new(),
            checking: AtomicBool::new(false),
        })
    }

    /// Starts the self-rescheduling loop. The first cycle runs after the
    /// startup delay; after each cycle the next one is scheduled per the
    /// boost/normal phase rule.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            let started = Instant::now();
            info!(
                delay_secs = tracker.schedule.startup_delay.as_secs(),
                "price tracker scheduled, first check pending"
            );
            tokio::select! {
                () = tokio::time::sleep(tracker.schedule.startup_delay) => {}
                () = tracker.cancel.cancelled() => return,
            }

            loop {
                if tracker.cancel.is_cancelled() {
                    break;
                }
                // An in-flight cycle runs to completion; stop() only
                // prevents the next one from being scheduled.
                tracker.run_cycle().await;

                let elapsed = started.elapsed();
                let interval = tracker.schedule.interval_after(elapsed);
                info!(
                    phase = tracker.schedule.phase_name(elapsed),
                    next_in_secs = interval.as_secs(),
                    "next price check scheduled"
                );
                tokio::select! {
                    () = tokio::time::sleep(interval) => {}
                    () = tracker.cancel.cancelled() => break,
                }
            }
            info!("price tracker stopped");
        })
    }

    /// Clears the pending schedule and prevents further cycles. Cooperative:
    /// a cycle already in flight finishes normally.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// One full check cycle over the persisted dataset. Guarded by a
    /// reentrancy flag: a cycle in progress suppresses starting another.
    pub async fn run_cycle(&self) {
        if self
            .checking
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("price check cycle skipped, previous cycle still running");
            return;
        }

        let started = Instant::now();
        let links = self.store.tracked_links().await;
        let mut checked = 0usize;
        let mut price_changes = 0usize;
        let mut errors = 0usize;
        let mut dirty = false;

        info!(items = links.len(), "starting price check cycle");
        for link in links {
            checked += 1;
            match self.detail.fetch_detail(&self.session_id, &link).await {
                Ok(detail) => {
                    let fetched = detail.price_info();
                    let snapshot = PriceSnapshot::now(&fetched);
                    let updated = self
                        .store
                        .update_book(&link, |book| {
                            if book.prices_changed(&fetched) {
                                info!(
                                    link,
                                    title = book.book.title.as_deref().unwrap_or("<untitled>"),
                                    "price change detected"
                                );
                            }
                            book.push_snapshot(snapshot.clone());
                            book.apply_prices(&fetched);
                        })
                        .await;
                    match updated {
                        Some(book) => {
                            // A successful fetch always dirties the dataset:
                            // the appended snapshot is a change even when the
                            // display fields are not.
                            dirty = true;
                            if book.price_history.len() >= 2 {
                                let n = book.price_history.len();
                                if book.price_history[n - 2].current_price
                                    != book.price_history[n - 1].current_price
                                {
                                    price_changes += 1;
                                }
                            }
                            self.sink.price_update(PriceUpdate {
                                link: link.clone(),
                                book: Some(book),
                                error: None,
                            });
                        }
                        None => {
                            // Removed by a user edit while we were fetching.
                            warn!(link, "tracked book disappeared mid-cycle");
                        }
                    }
                }
                Err(err) => {
                    errors += 1;
                    warn!(link, error = %err, "price fetch failed, item left untouched");
                    self.sink.price_update(PriceUpdate {
                        link: link.clone(),
                        book: None,
                        error: Some(err.to_string()),
                    });
                }
            }

            if !self.schedule.item_delay.is_zero() {
                tokio::time::sleep(self.schedule.item_delay).await;
            }
        }

        if dirty {
            if let Err(err) = self.store.save().await {
                error!(error = %err, "failed to persist tracker dataset after cycle");
            }
        }
        info!(
            checked,
            price_changes,
            errors,
            duration_ms = started.elapsed().as_millis() as u64,
            "price check cycle finished"
        );
        self.checking.store(false, Ordering::SeqCst);
    }
}
