//! Per-document lifecycle transitions.
//!
//! Host events drive a small state machine over [`DocPhase`]. The transition
//! function is pure: it maps (phase, event) to the next phase plus the
//! follow-up actions the store must execute (invalidate, rearm the debounce
//! timer, issue a fetch). Keeping the decision table out of the store makes
//! the event handling testable without any async machinery.
//!
//! Used by: the blame store, which executes the returned actions under its
//! lock.

use crate::models::{DocPhase, Priority};

/// Discrete event applied to a document record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocEvent {
    /// Document opened, or re-opened with fresh content.
    Opened,
    /// Buffer content changed.
    Changed,
    /// Buffer saved to disk.
    Saved,
    /// Cursor moved or a single-line selection was made.
    SelectionSingle,
    /// A multi-line selection is active.
    SelectionMulti,
    /// Viewport scrolled.
    Scrolled,
    /// The quiet-window timer fired; `multi_line` reports whether a
    /// multi-line selection is still active, which decides the priority.
    DebounceFired { multi_line: bool },
    /// A current-generation fetch resolved with a result.
    FetchInstalled,
    /// A current-generation fetch resolved with no attribution.
    FetchEmpty,
    /// A superseded fetch resolved and was discarded.
    FetchDiscarded,
    /// Document closed by the host.
    Closed,
}

/// Follow-up work decided by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drop the cached result and bump the fetch generation.
    Invalidate,
    /// (Re)arm the quiet-window timer from now.
    RestartTimer,
    /// Disarm the quiet-window timer.
    ClearTimer,
    /// Ensure a fetch is outstanding at the given priority.
    IssueFetch(Priority),
    /// Abort the outstanding fetch and resolve its waiters as absent.
    CancelFetch,
}

/// Applies one event to a phase, returning the next phase and the actions to
/// execute.
pub fn transition(phase: DocPhase, event: DocEvent) -> (DocPhase, Vec<Action>) {
    use DocEvent::*;
    use DocPhase::*;

    match event {
        // A fresh open and an on-disk save both restart from authoritative
        // content: drop whatever was cached and fetch without waiting.
        Opened | Saved => (
            Loading,
            vec![
                Action::Invalidate,
                Action::ClearTimer,
                Action::IssueFetch(Priority::Normal),
            ],
        ),

        Changed => (Stale, vec![Action::Invalidate, Action::RestartTimer]),

        SelectionMulti => match phase {
            // Cached and current: answer from the cache, no fetch.
            Ready => (Ready, vec![]),
            // Someone is now waiting on the result; fetch (or join the
            // outstanding fetch) at interactive priority.
            Empty | Loading | Stale => (Loading, vec![Action::IssueFetch(Priority::High)]),
        },

        SelectionSingle => match phase {
            Empty => (Loading, vec![Action::IssueFetch(Priority::Normal)]),
            p => (p, vec![]),
        },

        Scrolled => (phase, vec![]),

        DebounceFired { multi_line } => {
            let priority = if multi_line { Priority::High } else { Priority::Normal };
            match phase {
                // A selection-triggered fetch already landed; refetch anyway
                // so the quiet window always ends with fresh data.
                Ready => (Ready, vec![Action::IssueFetch(priority)]),
                _ => (Loading, vec![Action::IssueFetch(priority)]),
            }
        }

        FetchInstalled => (Ready, vec![]),

        FetchEmpty => match phase {
            // A redundant refetch came back empty; the cached result is
            // still for the current generation, keep serving it.
            Ready => (Ready, vec![]),
            // Invalidated with the timer armed; the refetch will retry.
            Stale => (Stale, vec![]),
            Empty | Loading => (Empty, vec![]),
        },

        FetchDiscarded => (phase, vec![]),

        Closed => (Empty, vec![Action::CancelFetch, Action::ClearTimer]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DocEvent::*;
    use DocPhase::*;

    #[test]
    fn open_starts_loading_with_a_normal_fetch() {
        let (phase, actions) = transition(Empty, Opened);
        assert_eq!(phase, Loading);
        assert!(actions.contains(&Action::IssueFetch(Priority::Normal)));
        assert!(actions.contains(&Action::Invalidate));
    }

    #[test]
    fn change_invalidates_and_arms_the_timer() {
        for from in [Empty, Loading, Ready, Stale] {
            let (phase, actions) = transition(from, Changed);
            assert_eq!(phase, Stale);
            assert_eq!(actions, vec![Action::Invalidate, Action::RestartTimer]);
        }
    }

    #[test]
    fn every_change_restarts_the_timer() {
        // Three edits in a row: each one re-arms, none fetches.
        let mut phase = Ready;
        for _ in 0..3 {
            let (next, actions) = transition(phase, Changed);
            assert!(actions.contains(&Action::RestartTimer));
            assert!(!actions.iter().any(|a| matches!(a, Action::IssueFetch(_))));
            phase = next;
        }
        assert_eq!(phase, Stale);
    }

    #[test]
    fn save_skips_the_quiet_window() {
        let (phase, actions) = transition(Stale, Saved);
        assert_eq!(phase, Loading);
        assert!(actions.contains(&Action::ClearTimer));
        assert!(actions.contains(&Action::IssueFetch(Priority::Normal)));
    }

    #[test]
    fn multi_line_selection_on_ready_uses_the_cache() {
        let (phase, actions) = transition(Ready, SelectionMulti);
        assert_eq!(phase, Ready);
        assert!(actions.is_empty());
    }

    #[test]
    fn multi_line_selection_without_data_fetches_high_priority() {
        for from in [Empty, Loading, Stale] {
            let (phase, actions) = transition(from, SelectionMulti);
            assert_eq!(phase, Loading);
            assert_eq!(actions, vec![Action::IssueFetch(Priority::High)]);
        }
    }

    #[test]
    fn single_line_selection_only_fetches_from_empty() {
        let (phase, actions) = transition(Empty, SelectionSingle);
        assert_eq!(phase, Loading);
        assert_eq!(actions, vec![Action::IssueFetch(Priority::Normal)]);

        for from in [Loading, Ready, Stale] {
            let (phase, actions) = transition(from, SelectionSingle);
            assert_eq!(phase, from);
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn scroll_never_changes_anything() {
        for from in [Empty, Loading, Ready, Stale] {
            let (phase, actions) = transition(from, Scrolled);
            assert_eq!(phase, from);
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn debounce_priority_follows_the_selection() {
        let (_, actions) = transition(Stale, DebounceFired { multi_line: true });
        assert_eq!(actions, vec![Action::IssueFetch(Priority::High)]);

        let (phase, actions) = transition(Stale, DebounceFired { multi_line: false });
        assert_eq!(phase, Loading);
        assert_eq!(actions, vec![Action::IssueFetch(Priority::Normal)]);
    }

    #[test]
    fn debounce_on_ready_refetches_without_leaving_ready() {
        let (phase, actions) = transition(Ready, DebounceFired { multi_line: false });
        assert_eq!(phase, Ready);
        assert_eq!(actions, vec![Action::IssueFetch(Priority::Normal)]);
    }

    #[test]
    fn installed_fetch_lands_in_ready() {
        for from in [Empty, Loading, Ready, Stale] {
            let (phase, actions) = transition(from, FetchInstalled);
            assert_eq!(phase, Ready);
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn empty_fetch_keeps_a_ready_cache() {
        let (phase, _) = transition(Ready, FetchEmpty);
        assert_eq!(phase, Ready);
    }

    #[test]
    fn empty_fetch_without_data_lands_in_empty() {
        assert_eq!(transition(Loading, FetchEmpty).0, Empty);
        assert_eq!(transition(Empty, FetchEmpty).0, Empty);
        // Stale keeps waiting for the armed refetch.
        assert_eq!(transition(Stale, FetchEmpty).0, Stale);
    }

    #[test]
    fn discarded_fetch_is_a_no_op() {
        for from in [Empty, Loading, Ready, Stale] {
            let (phase, actions) = transition(from, FetchDiscarded);
            assert_eq!(phase, from);
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn close_cancels_everything() {
        let (phase, actions) = transition(Loading, Closed);
        assert_eq!(phase, Empty);
        assert_eq!(actions, vec![Action::CancelFetch, Action::ClearTimer]);
    }
}
