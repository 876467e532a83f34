//! Single-line status and document totals endpoints.
//!
//! GET /api/v1/line?document=&line=
//! GET /api/v1/totals?document=
//!
//! `line` answers "who wrote this line" for the status bar; `totals` reports
//! per-prompt line counts for the whole document. Both read the cache only.
//!
//! Used by: the status bar item and the document summary view

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::blame::SharedStore;
use crate::error::{AppError, Result};
use crate::models::{LineStatusResponse, TotalsResponse};

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/api/v1/line", get(get_line_status))
        .route("/api/v1/totals", get(get_totals))
        .with_state(store)
}

#[derive(Debug, Deserialize)]
struct LineQuery {
    document: String,
    line: u32,
}

#[derive(Debug, Deserialize)]
struct TotalsQuery {
    document: String,
}

async fn get_line_status(
    State(store): State<SharedStore>,
    Query(query): Query<LineQuery>,
) -> Result<Json<LineStatusResponse>> {
    if query.line == 0 {
        return Err(AppError::InvalidRange("line numbers start at 1".to_string()));
    }
    let snap = store
        .snapshot(&query.document)
        .ok_or_else(|| AppError::DocumentNotOpen(query.document.clone()))?;

    let attribution = snap
        .cached
        .as_ref()
        .and_then(|result| result.line(query.line))
        .cloned();
    Ok(Json(LineStatusResponse {
        document: query.document,
        state: snap.phase,
        line: query.line,
        attribution,
    }))
}

async fn get_totals(
    State(store): State<SharedStore>,
    Query(query): Query<TotalsQuery>,
) -> Result<Json<TotalsResponse>> {
    let snap = store
        .snapshot(&query.document)
        .ok_or_else(|| AppError::DocumentNotOpen(query.document.clone()))?;
    Ok(Json(TotalsResponse {
        document: query.document,
        state: snap.phase,
        total_lines: snap.total_lines,
        totals: snap.totals,
    }))
}
