//! Debounced search controller.
//!
//! Every query change cancels the pending timer and starts a new one. Only a
//! timer that survives the quiet period runs the ranker, over whatever the
//! working set holds at that moment. Results are published through a
//! `watch` channel as a `SearchSnapshot`.
//!
//! Timers are tokio tasks racing a `CancellationToken` against `sleep`. A
//! generation counter guards publication, so a pass that was overtaken never
//! replaces newer state.

use crate::config::SearchConfig;
use crate::interface::{SearchPhase, SearchResultSet, SearchSnapshot};
use crate::ranking::{rank_working_set, Query};
use crate::working_set::WorkingSet;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runtime used when the controller is driven from outside any tokio context.
/// Shared by every controller and never dropped.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

/// Current runtime if there is one, otherwise the global fallback
pub(crate) fn runtime_handle() -> tokio::runtime::Handle {
    tokio::runtime::Handle::try_current().unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
}

#[derive(Debug, Default)]
struct Pending {
    query: String,
    generation: u64,
    timer: Option<CancellationToken>,
}

struct Inner {
    working_set: Arc<WorkingSet>,
    config: SearchConfig,
    pending: Mutex<Pending>,
    snapshot: watch::Sender<SearchSnapshot>,
    passes: AtomicU64,
    shutdown: CancellationToken,
}

impl Inner {
    /// Cancel the live timer and start a new one for `query`
    fn arm(self: &Arc<Self>, query: String) {
        let token = self.shutdown.child_token();
        let generation = {
            let mut pending = self.pending.lock();
            if let Some(previous) = pending.timer.replace(token.clone()) {
                previous.cancel();
            }
            pending.generation += 1;
            pending.query.clone_from(&query);
            pending.generation
        };

        // Previous results stay visible until the new pass settles
        self.snapshot.send_modify(|s| {
            s.phase = SearchPhase::Debouncing;
            s.query = query;
            s.searching = true;
        });

        let inner = Arc::clone(self);
        let debounce = self.config.debounce;
        runtime_handle().spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "debounce timer cancelled");
                }
                _ = tokio::time::sleep(debounce) => {
                    inner.settle(generation);
                }
            }
        });
    }

    fn is_current(&self, generation: u64) -> bool {
        self.pending.lock().generation == generation
    }

    /// Timer fired uncancelled
    fn settle(&self, generation: u64) {
        let query = {
            let mut pending = self.pending.lock();
            if pending.generation != generation {
                return;
            }
            pending.timer = None;
            pending.query.clone()
        };

        let parsed = Query::parse(&query);
        if parsed.is_empty() {
            self.snapshot.send_if_modified(|s| {
                if !self.is_current(generation) {
                    return false;
                }
                s.phase = SearchPhase::Idle;
                s.results = Arc::new(SearchResultSet::default());
                s.searching = false;
                true
            });
            debug!(generation, "empty query, results cleared");
            return;
        }

        self.snapshot.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            s.phase = SearchPhase::Searching;
            true
        });

        let started = std::time::Instant::now();
        // Read the working set now, not when the timer started
        let view = self.working_set.view();
        let results = rank_working_set(&view.links, &view.collections, &parsed, &self.config);
        self.passes.fetch_add(1, Ordering::SeqCst);

        let links = results.links.len();
        let collections = results.collections.len();
        let published = self.snapshot.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            s.phase = SearchPhase::Settled;
            s.results = Arc::new(results);
            s.searching = false;
            s.loading = view.loading;
            s.error = view.error.clone();
            true
        });

        if published {
            debug!(
                generation,
                query = %query,
                links,
                collections,
                elapsed_us = started.elapsed().as_micros() as u64,
                "search settled"
            );
        } else {
            debug!(generation, "stale ranking pass discarded");
        }
    }

    fn on_working_set_changed(self: &Arc<Self>) {
        let view = self.working_set.view();
        self.snapshot.send_if_modified(|s| {
            let changed = s.loading != view.loading || s.error != view.error;
            s.loading = view.loading;
            s.error = view.error.clone();
            changed
        });

        let query = self.pending.lock().query.clone();
        if !query.trim().is_empty() {
            self.arm(query);
        }
    }
}

/// Drives debounced searches over a shared working set.
///
/// Dropping the controller cancels any pending timer and stops watching the
/// working set.
pub struct SearchController {
    inner: Arc<Inner>,
}

impl SearchController {
    pub fn new(working_set: Arc<WorkingSet>, config: SearchConfig) -> Self {
        let view = working_set.view();
        let (snapshot, _) = watch::channel(SearchSnapshot {
            loading: view.loading,
            error: view.error,
            ..SearchSnapshot::default()
        });

        let inner = Arc::new(Inner {
            working_set,
            config,
            pending: Mutex::new(Pending::default()),
            snapshot,
            passes: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        });

        Self::watch_working_set(&inner);
        Self { inner }
    }

    /// Re-arm the debounce whenever the working set changes
    fn watch_working_set(inner: &Arc<Inner>) {
        let mut revisions = inner.working_set.subscribe();
        let shutdown = inner.shutdown.clone();
        let weak: Weak<Inner> = Arc::downgrade(inner);

        runtime_handle().spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    changed = revisions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let Some(inner) = weak.upgrade() else { break };
                        inner.on_working_set_changed();
                    }
                }
            }
        });
    }

    /// Feed the latest query text. Unchanged text is ignored.
    pub fn on_query_change(&self, text: impl Into<String>) {
        let text = text.into();
        if self.inner.pending.lock().query == text {
            return;
        }
        self.inner.arm(text);
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn results(&self) -> Arc<SearchResultSet> {
        Arc::clone(&self.inner.snapshot.borrow().results)
    }

    pub fn is_searching(&self) -> bool {
        self.inner.snapshot.borrow().searching
    }

    /// Wait until no timer is pending and return the resulting snapshot
    pub async fn settled(&self) -> SearchSnapshot {
        let mut rx = self.inner.snapshot.subscribe();
        let settled = rx.wait_for(|s| !s.searching).await.map(|s| s.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    /// Number of ranking passes run so far
    pub fn ranking_passes(&self) -> u64 {
        self.inner.passes.load(Ordering::SeqCst)
    }

    pub fn working_set(&self) -> &Arc<WorkingSet> {
        &self.inner.working_set
    }

    pub fn config(&self) -> &SearchConfig {
        &self.inner.config
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}
