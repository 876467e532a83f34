//! Service status endpoint.
//!
//! GET /api/v1/status
//!
//! Reports the process id, the repository and provider the service is bound
//! to, and store occupancy counters:
//! - Tracked documents
//! - Outstanding provider fetches
//! - Armed quiet-window timers
//!
//! Used by: the `status` subcommand and health checks

use axum::{extract::State, routing::get, Json, Router};

use crate::blame::SharedStore;
use crate::models::ServiceStatus;

#[derive(Clone)]
struct StatusState {
    store: SharedStore,
    repository: String,
    provider: String,
}

pub fn routes(store: SharedStore, repository: String, provider: String) -> Router {
    Router::new()
        .route("/api/v1/status", get(get_status))
        .with_state(StatusState {
            store,
            repository,
            provider,
        })
}

async fn get_status(State(state): State<StatusState>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        pid: std::process::id(),
        repository: state.repository.clone(),
        provider: state.provider.clone(),
        debounce_ms: state.store.debounce.as_millis() as u64,
        store: state.store.stats(),
    })
}
