//! Per-document attribution cache.
//!
//! Owns one [`DocumentState`] per tracked document: the content snapshot,
//! the cached blame result with its per-prompt totals, the in-flight fetch,
//! the debounce timer, and the last known selection and viewport. Records
//! are created lazily on the first event that mentions a document and
//! destroyed on close.
//!
//! Every mutation happens inside the store lock and never across an await,
//! so generation and epoch checks observe a consistent record. Spawned
//! tasks re-enter through `complete_fetch` and `debounce_fired`.
//!
//! Used by: the event routes (mutation) and the query routes (reads).

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::blame::coordinator::{cancel_fetch_locked, resolve_waiters, InFlightFetch};
use crate::blame::debounce::clear_timer;
use crate::blame::provider::BlameProvider;
use crate::blame::state::{transition, Action, DocEvent};
use crate::models::{BlameResult, DocPhase, LineRange, StoreStats};

/// Tracking state for one document.
pub(crate) struct DocumentState {
    /// Last content snapshot received from the host
    pub(crate) content: String,
    /// Installed blame result, absent until a fetch lands
    pub(crate) cached: Option<BlameResult>,
    /// Per-prompt line totals, recomputed when `cached` changes
    pub(crate) totals: HashMap<String, usize>,
    /// Bumped on every invalidation; fetches must match it to install
    pub(crate) fetch_generation: u64,
    /// The outstanding fetch, at most one per document
    pub(crate) in_flight: Option<InFlightFetch>,
    /// Bumped whenever the timer is rearmed or cleared
    pub(crate) debounce_epoch: u64,
    /// Armed quiet-window timer task
    pub(crate) debounce_timer: Option<JoinHandle<()>>,
    /// Most recent selection reported by the host
    pub(crate) last_selection: Option<LineRange>,
    /// Most recent visible line range reported by the host
    pub(crate) viewport: Option<LineRange>,
    /// Lifecycle phase
    pub(crate) phase: DocPhase,
}

impl DocumentState {
    pub(crate) fn new() -> Self {
        Self {
            content: String::new(),
            cached: None,
            totals: HashMap::new(),
            fetch_generation: 0,
            in_flight: None,
            debounce_epoch: 0,
            debounce_timer: None,
            last_selection: None,
            viewport: None,
            phase: DocPhase::Empty,
        }
    }
}

/// Read-only view of one record, cloned out under the lock.
pub struct DocSnapshot {
    pub phase: DocPhase,
    pub cached: Option<BlameResult>,
    pub totals: HashMap<String, usize>,
    pub total_lines: usize,
    pub viewport: Option<LineRange>,
}

/// Keyed store of per-document attribution state.
pub struct BlameStore {
    pub(crate) provider: Arc<dyn BlameProvider>,
    pub(crate) docs: Mutex<HashMap<String, DocumentState>>,
    pub(crate) debounce: Duration,
    /// Identity source for fetches. Store-wide and never reused, unlike
    /// generations, which restart with every fresh record.
    pub(crate) next_fetch_id: AtomicU64,
}

pub type SharedStore = Arc<BlameStore>;

/// What a transition asked the store to tell the provider, reported back to
/// the caller once the lock is released.
#[derive(Default)]
pub(crate) struct EventEffects {
    pub(crate) phase: DocPhase,
    pub(crate) invalidated: bool,
    pub(crate) cancelled: bool,
}

enum Wait {
    Done(DocPhase),
    Pending(oneshot::Receiver<Option<BlameResult>>),
}

impl BlameStore {
    pub fn new(provider: Arc<dyn BlameProvider>, debounce: Duration) -> SharedStore {
        Arc::new(Self {
            provider,
            docs: Mutex::new(HashMap::new()),
            debounce,
            next_fetch_id: AtomicU64::new(1),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<String, DocumentState>> {
        self.docs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ensures a record exists for `document` and reports its phase.
    pub fn get_or_create(&self, document: &str) -> DocPhase {
        let mut docs = self.lock();
        docs.entry(document.to_string())
            .or_insert_with(DocumentState::new)
            .phase
    }

    /// Drops the cached result and supersedes any outstanding fetch.
    ///
    /// The in-flight provider call keeps running; bumping the generation
    /// guarantees its late result is discarded. Waiters resolve absent.
    pub fn invalidate(&self, document: &str) {
        let hit = {
            let mut docs = self.lock();
            match docs.get_mut(document) {
                Some(st) => {
                    invalidate_record(st);
                    st.phase = match st.phase {
                        DocPhase::Ready | DocPhase::Stale => DocPhase::Stale,
                        DocPhase::Loading | DocPhase::Empty => DocPhase::Empty,
                    };
                    true
                }
                None => false,
            }
        };
        if hit {
            self.provider.invalidate_cache(document);
        }
    }

    /// Removes a document record, aborting its fetch and timer.
    pub fn destroy(self: &Arc<Self>, document: &str) {
        let removed = {
            let mut docs = self.lock();
            docs.remove(document)
        };
        if let Some(mut st) = removed {
            let mut effects = EventEffects::default();
            let (_, actions) = transition(st.phase, DocEvent::Closed);
            for action in actions {
                self.run_action_on(document, &mut st, action, &mut effects);
            }
            debug!(document, "document state destroyed");
            self.provider.cancel_for_document(document);
        }
    }

    /// Document opened (or re-opened) with authoritative content.
    pub fn note_open(self: &Arc<Self>, document: &str, content: String) -> DocPhase {
        debug!(document, "document opened");
        self.apply_host_event(document, DocEvent::Opened, |st| st.content = content)
    }

    /// Buffer content changed; starts (or restarts) the quiet window.
    pub fn note_change(self: &Arc<Self>, document: &str, content: String) -> DocPhase {
        trace!(document, "document changed");
        self.apply_host_event(document, DocEvent::Changed, |st| st.content = content)
    }

    /// Buffer saved; refetches immediately instead of waiting out the
    /// quiet window. The saved content is authoritative, like open, so the
    /// snapshot always matches what the provider reads from disk.
    pub fn note_save(self: &Arc<Self>, document: &str, content: String) -> DocPhase {
        debug!(document, "document saved");
        self.apply_host_event(document, DocEvent::Saved, |st| st.content = content)
    }

    /// Viewport scrolled; only updates the anchor bias, never fetches.
    pub fn note_scroll(self: &Arc<Self>, document: &str, viewport: LineRange) -> DocPhase {
        self.apply_host_event(document, DocEvent::Scrolled, |st| {
            st.viewport = Some(viewport);
        })
    }

    /// Selection changed. A multi-line selection without usable data issues
    /// a high-priority fetch and waits for it, so the caller can render a
    /// complete summary in one round trip.
    pub async fn note_selection(
        self: &Arc<Self>,
        document: &str,
        range: LineRange,
        viewport: Option<LineRange>,
    ) -> DocPhase {
        let event = if range.is_multi_line() {
            DocEvent::SelectionMulti
        } else {
            DocEvent::SelectionSingle
        };

        let wait = {
            let mut docs = self.lock();
            let st = docs
                .entry(document.to_string())
                .or_insert_with(DocumentState::new);
            st.last_selection = Some(range);
            if let Some(vp) = viewport {
                st.viewport = Some(vp);
            }
            let effects = self.apply_event_on(document, st, event);
            if st.cached.is_some() {
                Wait::Done(effects.phase)
            } else if let Some(fetch) = st.in_flight.as_mut() {
                let (tx, rx) = oneshot::channel();
                fetch.waiters.push(tx);
                Wait::Pending(rx)
            } else {
                Wait::Done(effects.phase)
            }
        };

        match wait {
            Wait::Done(phase) => phase,
            Wait::Pending(rx) => {
                // Resolution value is re-read from the record; the channel
                // only signals that the fetch settled.
                let _ = rx.await;
                self.phase(document)
            }
        }
    }

    /// Current phase of a document, `Empty` for unknown documents.
    pub fn phase(&self, document: &str) -> DocPhase {
        let docs = self.lock();
        docs.get(document).map_or(DocPhase::Empty, |st| st.phase)
    }

    /// Clones out everything the query routes need in one lock hold.
    pub fn snapshot(&self, document: &str) -> Option<DocSnapshot> {
        let docs = self.lock();
        docs.get(document).map(|st| DocSnapshot {
            phase: st.phase,
            cached: st.cached.clone(),
            totals: st.totals.clone(),
            total_lines: st.content.lines().count(),
            viewport: st.viewport,
        })
    }

    /// Store occupancy counters, for the status endpoint and debugging.
    pub fn stats(&self) -> StoreStats {
        let docs = self.lock();
        StoreStats {
            open_documents: docs.len(),
            pending_fetches: docs.values().filter(|st| st.in_flight.is_some()).count(),
            armed_timers: docs.values().filter(|st| st.debounce_timer.is_some()).count(),
        }
    }

    /// Runs one transition on a record already under the lock and executes
    /// its actions.
    pub(crate) fn apply_event_on(
        self: &Arc<Self>,
        document: &str,
        st: &mut DocumentState,
        event: DocEvent,
    ) -> EventEffects {
        let (phase, actions) = transition(st.phase, event);
        st.phase = phase;
        let mut effects = EventEffects {
            phase,
            ..Default::default()
        };
        for action in actions {
            self.run_action_on(document, st, action, &mut effects);
        }
        effects
    }

    fn run_action_on(
        self: &Arc<Self>,
        document: &str,
        st: &mut DocumentState,
        action: Action,
        effects: &mut EventEffects,
    ) {
        match action {
            Action::Invalidate => {
                invalidate_record(st);
                effects.invalidated = true;
            }
            Action::ClearTimer => clear_timer(st),
            Action::RestartTimer => self.restart_timer_locked(document, st),
            Action::IssueFetch(priority) => self.ensure_fetch_locked(document, st, priority),
            Action::CancelFetch => {
                cancel_fetch_locked(st);
                effects.cancelled = true;
            }
        }
    }

    fn apply_host_event(
        self: &Arc<Self>,
        document: &str,
        event: DocEvent,
        update: impl FnOnce(&mut DocumentState),
    ) -> DocPhase {
        let effects = {
            let mut docs = self.lock();
            let st = docs
                .entry(document.to_string())
                .or_insert_with(DocumentState::new);
            update(st);
            self.apply_event_on(document, st, event)
        };
        if effects.invalidated {
            self.provider.invalidate_cache(document);
        }
        if effects.cancelled {
            self.provider.cancel_for_document(document);
        }
        effects.phase
    }
}

/// Drops the cached result, bumps the generation, and detaches the in-flight
/// fetch without aborting it.
fn invalidate_record(st: &mut DocumentState) {
    st.cached = None;
    st.totals.clear();
    st.fetch_generation += 1;
    if let Some(fetch) = st.in_flight.take() {
        // The provider task keeps running; its resolution fails the
        // generation check and is discarded.
        resolve_waiters(fetch.waiters, None);
    }
}
