//! Full-document blame endpoint.
//!
//! GET /api/v1/blame?document=<path>
//!
//! Returns the whole cached per-line attribution map in one response, so the
//! editor can paint gutter decorations for every AI-authored line without a
//! query per line. Reads the cache only; a document still loading answers
//! with an empty map and the host re-queries when data lands.
//!
//! Used by: the editor's full-document decoration pass

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::blame::SharedStore;
use crate::error::{AppError, Result};
use crate::models::BlameResponse;

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/api/v1/blame", get(get_blame))
        .with_state(store)
}

#[derive(Debug, Deserialize)]
struct BlameQuery {
    document: String,
}

async fn get_blame(
    State(store): State<SharedStore>,
    Query(query): Query<BlameQuery>,
) -> Result<Json<BlameResponse>> {
    let snap = store
        .snapshot(&query.document)
        .ok_or_else(|| AppError::DocumentNotOpen(query.document.clone()))?;

    let (subject_version, line_authors) = match snap.cached {
        Some(result) => (result.subject_version, result.line_authors),
        None => (String::new(), Default::default()),
    };
    Ok(Json(BlameResponse {
        document: query.document,
        state: snap.phase,
        total_lines: snap.total_lines,
        subject_version,
        line_authors,
    }))
}
