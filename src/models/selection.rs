//! Selection and highlight response DTOs.
//!
//! Shapes returned by the query routes: per-selection prompt groups with
//! their palette colors and anchors, file-wide highlight buckets, the full
//! per-line map, single-line status, and document totals.

use std::collections::HashMap;

use serde::Serialize;

use super::attribution::{DocPhase, LineAttribution};

/// Everything the host needs to render the current selection.
#[derive(Debug, Serialize)]
pub struct SelectionSummary {
    /// Document the selection belongs to
    pub document: String,
    /// Lifecycle phase of the document record
    pub state: DocPhase,
    /// Total line count of the current buffer content
    pub total_lines: usize,
    /// Prompt groups in first-occurrence order (top to bottom of selection)
    pub groups: Vec<SelectionGroupView>,
}

/// One prompt's contribution to the selection, ready for display.
#[derive(Debug, Serialize)]
pub struct SelectionGroupView {
    /// Grouping key of the generation event
    pub prompt_id: String,
    /// Stable palette slot for the prompt
    pub color_index: usize,
    /// Hex color at that slot
    pub color: String,
    /// Selected lines attributed to this prompt, ascending
    pub lines_in_range: Vec<u32>,
    /// Representative line to jump to (prefers the visible region)
    pub anchor_line: u32,
    /// Lines this prompt authored anywhere in the file
    pub total_in_file: usize,
    /// `total_in_file` as a rounded percentage of the whole document
    pub percent_of_file: u32,
    /// Agent tool, "unknown" when the record is missing or malformed
    pub tool: String,
    /// Model identifier, "unknown" when missing or malformed
    pub model: String,
    /// Human who drove the session, empty when unrecorded
    pub human_author: String,
    /// Number of conversation turns in the prompt record
    pub message_count: usize,
    /// Relative age of the newest message, e.g. "2 hours ago"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
}

/// File-wide highlight lines for the prompts touched by a selection.
#[derive(Debug, Serialize)]
pub struct HighlightsResponse {
    /// Document the highlights belong to
    pub document: String,
    /// Lifecycle phase of the document record
    pub state: DocPhase,
    /// One bucket per palette slot, ascending by slot
    pub buckets: Vec<HighlightBucket>,
}

/// All lines sharing one palette color.
#[derive(Debug, Serialize)]
pub struct HighlightBucket {
    /// Palette slot
    pub color_index: usize,
    /// Hex color at that slot
    pub color: String,
    /// Lines to paint, ascending
    pub lines: Vec<u32>,
}

/// The whole cached per-line map for one document.
#[derive(Debug, Serialize)]
pub struct BlameResponse {
    /// Document the map belongs to
    pub document: String,
    /// Lifecycle phase of the document record
    pub state: DocPhase,
    /// Total line count of the current buffer content
    pub total_lines: usize,
    /// Content version the cached result was computed against
    pub subject_version: String,
    /// 1-indexed line number -> attribution; human lines are absent
    pub line_authors: HashMap<u32, LineAttribution>,
}

/// Attribution status of a single line.
#[derive(Debug, Serialize)]
pub struct LineStatusResponse {
    /// Document the line belongs to
    pub document: String,
    /// Lifecycle phase of the document record
    pub state: DocPhase,
    /// Queried line number (1-indexed)
    pub line: u32,
    /// Attribution when the line is AI-authored; absent for human lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<LineAttribution>,
}

/// Per-prompt line totals for a whole document.
#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    /// Document the totals belong to
    pub document: String,
    /// Lifecycle phase of the document record
    pub state: DocPhase,
    /// Total line count of the current buffer content
    pub total_lines: usize,
    /// prompt id -> number of lines it authored in the file
    pub totals: HashMap<String, usize>,
}

/// Palette lookup for a single prompt id.
#[derive(Debug, Serialize)]
pub struct ColorResponse {
    /// Prompt id the color was derived from
    pub prompt_id: String,
    /// Stable palette slot
    pub color_index: usize,
    /// Hex color at that slot
    pub color: String,
}

/// Acknowledgement returned by the event routes.
#[derive(Debug, Serialize)]
pub struct EventAck {
    /// Document the event applied to
    pub document: String,
    /// Phase after the event was applied
    pub state: DocPhase,
}

/// Store occupancy counters, for the status endpoint and debugging.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreStats {
    /// Number of tracked documents
    pub open_documents: usize,
    /// Documents with a provider fetch outstanding
    pub pending_fetches: usize,
    /// Documents with an armed debounce timer
    pub armed_timers: usize,
}

/// What the service is bound to and how busy it is.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    /// Process id of the running service
    pub pid: u32,
    /// Repository path the provider runs in
    pub repository: String,
    /// Provider program name
    pub provider: String,
    /// Quiet-window length in milliseconds
    pub debounce_ms: u64,
    /// Store occupancy counters
    pub store: StoreStats,
}
