//! Quiet-window debouncing of buffer edits.
//!
//! Every change restarts a per-document timer; only the timer that is still
//! current when it fires triggers the refetch, so a burst of edits collapses
//! into one provider call timed from the last keystroke. Epochs guard the
//! race where a timer fires while its replacement is being armed: a fired
//! timer whose epoch no longer matches the record is ignored.

use std::sync::Arc;

use tracing::trace;

use crate::blame::state::DocEvent;
use crate::blame::store::{BlameStore, DocumentState};

impl BlameStore {
    /// Aborts any armed timer and arms a fresh one from now.
    pub(crate) fn restart_timer_locked(self: &Arc<Self>, document: &str, st: &mut DocumentState) {
        if let Some(timer) = st.debounce_timer.take() {
            timer.abort();
        }
        st.debounce_epoch += 1;

        let epoch = st.debounce_epoch;
        let store = Arc::clone(self);
        let doc = document.to_string();
        let delay = self.debounce;
        st.debounce_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.debounce_fired(&doc, epoch);
        }));
    }

    /// Timer callback: refetches if this timer is still the current one.
    ///
    /// The refetch priority follows whether a multi-line selection is still
    /// active when the quiet window ends.
    pub(crate) fn debounce_fired(self: &Arc<Self>, document: &str, epoch: u64) {
        let mut docs = self.lock();
        let Some(st) = docs.get_mut(document) else {
            // Closed before the timer fired.
            return;
        };
        if epoch != st.debounce_epoch {
            trace!(
                document,
                epoch,
                current = st.debounce_epoch,
                "expired timer ignored"
            );
            return;
        }
        st.debounce_timer = None;

        let multi_line = st.last_selection.is_some_and(|r| r.is_multi_line());
        self.apply_event_on(document, st, DocEvent::DebounceFired { multi_line });
    }
}

/// Disarms the timer; a fired-but-unscheduled callback must miss the epoch.
pub(crate) fn clear_timer(st: &mut DocumentState) {
    if let Some(timer) = st.debounce_timer.take() {
        timer.abort();
    }
    st.debounce_epoch += 1;
}
