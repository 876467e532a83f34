//! Host event ingestion.
//!
//! POST /api/v1/events/{open,change,save,selection,scroll,close}
//!
//! The editor forwards document lifecycle events here; the store decides
//! whether each one invalidates the cache, arms the quiet-window timer, or
//! triggers a provider fetch. `selection` is the interactive path: it waits
//! for any fetch it started and returns the full selection summary in one
//! round trip.
//!
//! Used by: the editor extension's event forwarder

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::blame::SharedStore;
use crate::error::{AppError, Result};
use crate::models::{DocPhase, EventAck, SelectionSummary};
use crate::routes::selection::{build_summary, optional_viewport, validated_range};

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/api/v1/events/open", post(document_opened))
        .route("/api/v1/events/change", post(document_changed))
        .route("/api/v1/events/save", post(document_saved))
        .route("/api/v1/events/selection", post(selection_changed))
        .route("/api/v1/events/scroll", post(viewport_scrolled))
        .route("/api/v1/events/close", post(document_closed))
        .with_state(store)
}

#[derive(Debug, Deserialize)]
struct OpenEvent {
    document: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChangeEvent {
    document: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct SaveEvent {
    document: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct SelectionEvent {
    document: String,
    start_line: u32,
    end_line: u32,
    vis_start: Option<u32>,
    vis_end: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ScrollEvent {
    document: String,
    vis_start: u32,
    vis_end: u32,
}

#[derive(Debug, Deserialize)]
struct CloseEvent {
    document: String,
}

async fn document_opened(
    State(store): State<SharedStore>,
    Json(event): Json<OpenEvent>,
) -> Json<EventAck> {
    let state = store.note_open(&event.document, event.content);
    Json(EventAck {
        document: event.document,
        state,
    })
}

async fn document_changed(
    State(store): State<SharedStore>,
    Json(event): Json<ChangeEvent>,
) -> Json<EventAck> {
    let state = store.note_change(&event.document, event.content);
    Json(EventAck {
        document: event.document,
        state,
    })
}

async fn document_saved(
    State(store): State<SharedStore>,
    Json(event): Json<SaveEvent>,
) -> Json<EventAck> {
    let state = store.note_save(&event.document, event.content);
    Json(EventAck {
        document: event.document,
        state,
    })
}

async fn selection_changed(
    State(store): State<SharedStore>,
    Json(event): Json<SelectionEvent>,
) -> Result<Json<SelectionSummary>> {
    let range = validated_range(event.start_line, event.end_line)?;
    let viewport = optional_viewport(event.vis_start, event.vis_end)?;

    store.note_selection(&event.document, range, viewport).await;

    let snap = store
        .snapshot(&event.document)
        .ok_or_else(|| AppError::DocumentNotOpen(event.document.clone()))?;
    Ok(Json(build_summary(&event.document, &snap, range, viewport)))
}

async fn viewport_scrolled(
    State(store): State<SharedStore>,
    Json(event): Json<ScrollEvent>,
) -> Result<Json<EventAck>> {
    let viewport = validated_range(event.vis_start, event.vis_end)?;
    let state = store.note_scroll(&event.document, viewport);
    Ok(Json(EventAck {
        document: event.document,
        state,
    }))
}

async fn document_closed(
    State(store): State<SharedStore>,
    Json(event): Json<CloseEvent>,
) -> Json<EventAck> {
    store.destroy(&event.document);
    Json(EventAck {
        document: event.document,
        state: DocPhase::Empty,
    })
}
