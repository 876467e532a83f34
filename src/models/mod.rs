//! Data transfer objects (DTOs) for API requests and responses.
//!
//! These structs are serialized to JSON for host editor consumption.
//! - `attribution`: DocPhase, LineAttribution, PromptRecord, BlameResult
//! - `selection`: SelectionSummary, HighlightsResponse, TotalsResponse

pub mod attribution;
pub mod selection;

pub use attribution::*;
pub use selection::*;
