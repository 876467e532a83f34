//! API route handlers - maps HTTP endpoints to store operations.
//!
//! Each submodule defines routes for a feature area:
//! - `events`: Host lifecycle events (open/change/save/selection/scroll/close)
//! - `selection`: Selection summaries and file-wide highlights
//! - `blame`: Full-document per-line map
//! - `line`: Single-line status and document totals
//! - `colors`: Stateless prompt-to-color lookup
//! - `status`: Service and store status

pub mod blame;
pub mod colors;
pub mod events;
pub mod line;
pub mod selection;
pub mod status;

use axum::Router;

use crate::blame::SharedStore;

pub fn create_router(store: SharedStore, repository: String, provider: String) -> Router {
    Router::new()
        .merge(events::routes(store.clone()))
        .merge(selection::routes(store.clone()))
        .merge(blame::routes(store.clone()))
        .merge(line::routes(store.clone()))
        .merge(colors::routes())
        .merge(status::routes(store, repository, provider))
}
