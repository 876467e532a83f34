//! Fetch coordination: single-flight, generations, cancellation.
//!
//! At most one provider fetch is outstanding per document. Callers that ask
//! while one is running join it as waiters on a shared resolution; callers
//! that invalidate detach it, so its late result fails the generation check
//! and is discarded instead of clobbering newer data. Cancellation is
//! terminal: an aborted fetch resolves every waiter as absent and never
//! installs anything. Resolutions carry the fetch's store-wide id, so even a
//! task that outruns its abort cannot install over a replacement fetch whose
//! generation happens to match.
//!
//! All record mutation happens under the store lock and never across an
//! await; spawned fetch tasks re-enter through [`BlameStore::complete_fetch`].

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::blame::aggregate;
use crate::blame::state::DocEvent;
use crate::blame::store::{BlameStore, DocumentState};
use crate::models::{BlameResult, Priority};

/// One outstanding provider fetch. Waiters share its resolution.
pub(crate) struct InFlightFetch {
    /// Store-wide identity; a resolution must present it to install
    pub(crate) id: u64,
    /// Generation the fetch was issued at; must still be current to install
    pub(crate) generation: u64,
    /// Task driving the provider call
    pub(crate) task: JoinHandle<()>,
    /// Callers awaiting the resolution
    pub(crate) waiters: Vec<oneshot::Sender<Option<BlameResult>>>,
}

impl BlameStore {
    /// Requests attribution for a document, sharing any outstanding fetch.
    ///
    /// Takes the current content snapshot so the record always reflects what
    /// the host sees; the provider re-reads the document itself. Resolves
    /// absent when the fetch fails, is cancelled, or is superseded.
    pub async fn request_blame(
        self: &Arc<Self>,
        document: &str,
        content: &str,
        priority: Priority,
    ) -> Option<BlameResult> {
        let rx = {
            let mut docs = self.lock();
            let st = docs
                .entry(document.to_string())
                .or_insert_with(DocumentState::new);
            st.content = content.to_string();
            self.ensure_fetch_locked(document, st, priority);
            match st.in_flight.as_mut() {
                Some(fetch) => {
                    let (tx, rx) = oneshot::channel();
                    fetch.waiters.push(tx);
                    Some(rx)
                }
                None => None,
            }
        };
        match rx {
            Some(rx) => rx.await.unwrap_or(None),
            None => None,
        }
    }

    /// Aborts the outstanding fetch for a document, if any. Waiters resolve
    /// absent and the aborted fetch can never install a result.
    pub fn cancel_fetch(&self, document: &str) {
        let hit = {
            let mut docs = self.lock();
            match docs.get_mut(document) {
                Some(st) => {
                    cancel_fetch_locked(st);
                    true
                }
                None => false,
            }
        };
        if hit {
            self.provider.cancel_for_document(document);
        }
    }

    /// Aborts every outstanding fetch. Called at shutdown so connection
    /// draining never waits out a slow provider; waiters resolve absent.
    pub fn cancel_all_fetches(&self) {
        let documents: Vec<String> = self.lock().keys().cloned().collect();
        for document in &documents {
            self.cancel_fetch(document);
        }
    }

    /// Spawns a provider fetch unless one is already outstanding.
    ///
    /// The fetch is issued at the record's current generation; resolution
    /// re-enters through [`BlameStore::complete_fetch`].
    pub(crate) fn ensure_fetch_locked(
        self: &Arc<Self>,
        document: &str,
        st: &mut DocumentState,
        priority: Priority,
    ) {
        if st.in_flight.is_some() {
            // Single-flight: the outstanding fetch serves every caller.
            return;
        }

        let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let generation = st.fetch_generation;
        let store = Arc::clone(self);
        let provider = Arc::clone(&self.provider);
        let doc = document.to_string();
        let task = tokio::spawn(async move {
            let result = match provider.request_blame(&doc, priority).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(document = %doc, error = %e, "blame fetch failed");
                    None
                }
            };
            store.complete_fetch(&doc, id, generation, result);
        });

        st.in_flight = Some(InFlightFetch {
            id,
            generation,
            task,
            waiters: Vec::new(),
        });
    }

    /// Installs a resolved fetch, or discards it when it is no longer
    /// current.
    ///
    /// A result is installed only when its generation still matches the
    /// record and it is still the record's own outstanding fetch; a fetch
    /// for a closed document is dropped outright.
    pub(crate) fn complete_fetch(
        self: &Arc<Self>,
        document: &str,
        fetch_id: u64,
        generation: u64,
        result: Option<BlameResult>,
    ) {
        let mut docs = self.lock();
        let Some(st) = docs.get_mut(document) else {
            trace!(document, "fetch resolved after close, dropped");
            return;
        };

        if generation != st.fetch_generation {
            trace!(
                document,
                generation,
                current = st.fetch_generation,
                "stale blame result discarded"
            );
            self.apply_event_on(document, st, DocEvent::FetchDiscarded);
            return;
        }

        let Some(fetch) = st.in_flight.take_if(|f| f.id == fetch_id) else {
            // Cancelled, or a replacement fetch owns the record now.
            // Cancellation is terminal even against a task that outran its
            // abort; the generation alone cannot tell these apart.
            trace!(document, fetch_id, "resolution from a cancelled fetch dropped");
            return;
        };

        if let Some(ref blame) = result {
            st.totals = aggregate::totals_by_prompt(blame);
            st.cached = Some(blame.clone());
        }
        let event = if result.is_some() {
            DocEvent::FetchInstalled
        } else {
            DocEvent::FetchEmpty
        };
        self.apply_event_on(document, st, event);

        resolve_waiters(fetch.waiters, result);
    }
}

/// Aborts the fetch held by a record and resolves its waiters as absent.
pub(crate) fn cancel_fetch_locked(st: &mut DocumentState) {
    if let Some(fetch) = st.in_flight.take() {
        fetch.task.abort();
        resolve_waiters(fetch.waiters, None);
    }
}

/// Hands one resolution to every waiter. Waiters that gave up are skipped.
pub(crate) fn resolve_waiters(
    waiters: Vec<oneshot::Sender<Option<BlameResult>>>,
    result: Option<BlameResult>,
) {
    for tx in waiters {
        let _ = tx.send(result.clone());
    }
}
