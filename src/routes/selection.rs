//! Selection summary and highlight endpoints.
//!
//! GET /api/v1/selection?document=&start=&end=&vis_start=&vis_end=
//! GET /api/v1/highlights?document=&start=&end=
//!
//! Reads the cached result only; these never trigger a fetch. A document in
//! `loading` or `stale` answers with whatever state it has (usually no
//! groups) and the host re-queries when data lands.
//!
//! Used by: the hover panel (selection) and the editor decorations
//! (highlights)

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::blame::aggregate::{self, SelectionGroup};
use crate::blame::{color, DocSnapshot, SharedStore};
use crate::error::{AppError, Result};
use crate::models::{
    HighlightBucket, HighlightsResponse, LineRange, SelectionGroupView, SelectionSummary,
};

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/api/v1/selection", get(get_selection))
        .route("/api/v1/highlights", get(get_highlights))
        .with_state(store)
}

#[derive(Debug, Deserialize)]
struct SelectionQuery {
    document: String,
    start: u32,
    end: u32,
    vis_start: Option<u32>,
    vis_end: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct HighlightQuery {
    document: String,
    start: u32,
    end: u32,
}

async fn get_selection(
    State(store): State<SharedStore>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<SelectionSummary>> {
    let range = validated_range(query.start, query.end)?;
    let viewport = optional_viewport(query.vis_start, query.vis_end)?;
    let snap = store
        .snapshot(&query.document)
        .ok_or_else(|| AppError::DocumentNotOpen(query.document.clone()))?;
    Ok(Json(build_summary(&query.document, &snap, range, viewport)))
}

async fn get_highlights(
    State(store): State<SharedStore>,
    Query(query): Query<HighlightQuery>,
) -> Result<Json<HighlightsResponse>> {
    let range = validated_range(query.start, query.end)?;
    let snap = store
        .snapshot(&query.document)
        .ok_or_else(|| AppError::DocumentNotOpen(query.document.clone()))?;

    let mut buckets = Vec::new();
    if let Some(result) = &snap.cached {
        for (color_index, lines) in aggregate::file_highlights(result, range) {
            buckets.push(HighlightBucket {
                color_index,
                color: color::color_hex(color_index).to_string(),
                lines,
            });
        }
    }
    Ok(Json(HighlightsResponse {
        document: query.document,
        state: snap.phase,
        buckets,
    }))
}

/// Checks a 1-indexed inclusive range from query or event parameters.
pub(crate) fn validated_range(start: u32, end: u32) -> Result<LineRange> {
    if start == 0 {
        return Err(AppError::InvalidRange("line numbers start at 1".to_string()));
    }
    if end < start {
        return Err(AppError::InvalidRange(format!(
            "end {} is before start {}",
            end, start
        )));
    }
    Ok(LineRange::new(start, end))
}

/// Builds a viewport from a pair of optional parameters; both or neither.
pub(crate) fn optional_viewport(
    vis_start: Option<u32>,
    vis_end: Option<u32>,
) -> Result<Option<LineRange>> {
    match (vis_start, vis_end) {
        (Some(start), Some(end)) => Ok(Some(validated_range(start, end)?)),
        (None, None) => Ok(None),
        _ => Err(AppError::InvalidRange(
            "vis_start and vis_end must be given together".to_string(),
        )),
    }
}

/// Assembles the selection summary for one snapshot.
///
/// An explicit viewport wins over the last scrolled one, so a query can ask
/// about a region the user is not currently looking at.
pub(crate) fn build_summary(
    document: &str,
    snap: &DocSnapshot,
    range: LineRange,
    viewport: Option<LineRange>,
) -> SelectionSummary {
    let viewport = viewport.or(snap.viewport);
    let groups = match &snap.cached {
        Some(result) => aggregate::selection_groups(result, range, &snap.totals)
            .into_iter()
            .map(|group| group_view(group, viewport, snap.total_lines))
            .collect(),
        None => Vec::new(),
    };
    SelectionSummary {
        document: document.to_string(),
        state: snap.phase,
        total_lines: snap.total_lines,
        groups,
    }
}

fn group_view(
    group: SelectionGroup,
    viewport: Option<LineRange>,
    total_lines: usize,
) -> SelectionGroupView {
    let color_index = color::color_index(&group.prompt_id);
    let anchor_line = aggregate::anchor_line(&group.lines_in_range, viewport).unwrap_or(0);
    let percent_of_file = aggregate::percent_of_file(group.total_in_file, total_lines);

    let (tool, model, human_author, message_count, last_activity) = match &group.record {
        Some(record) => (
            record.display_tool().to_string(),
            record.display_model().to_string(),
            record.human_author.clone(),
            record.messages.len(),
            record.last_activity().map(format_relative_time),
        ),
        None => (
            "unknown".to_string(),
            "unknown".to_string(),
            String::new(),
            0,
            None,
        ),
    };

    SelectionGroupView {
        prompt_id: group.prompt_id,
        color_index,
        color: color::color_hex(color_index).to_string(),
        lines_in_range: group.lines_in_range,
        anchor_line,
        total_in_file: group.total_in_file,
        percent_of_file,
        tool,
        model,
        human_author,
        message_count,
        last_activity,
    }
}

fn format_relative_time(timestamp: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let diff = now - timestamp;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        let mins = diff / 60;
        format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if diff < 86400 {
        let hours = diff / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if diff < 2592000 {
        let days = diff / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if diff < 31536000 {
        let months = diff / 2592000;
        format!("{} month{} ago", months, if months == 1 { "" } else { "s" })
    } else {
        let years = diff / 31536000;
        format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlameResult, DocPhase, LineAttribution, PromptMessage, PromptRecord};
    use std::collections::HashMap;

    fn snapshot_with(result: BlameResult, total_lines: usize) -> DocSnapshot {
        let totals = aggregate::totals_by_prompt(&result);
        DocSnapshot {
            phase: DocPhase::Ready,
            cached: Some(result),
            totals,
            total_lines,
            viewport: None,
        }
    }

    fn attributed(prompt: &str, record: Option<PromptRecord>) -> LineAttribution {
        LineAttribution {
            is_ai_authored: true,
            author: "assistant".to_string(),
            prompt_id: prompt.to_string(),
            record,
        }
    }

    #[test]
    fn summary_of_a_loading_document_has_no_groups() {
        let snap = DocSnapshot {
            phase: DocPhase::Loading,
            cached: None,
            totals: HashMap::new(),
            total_lines: 12,
            viewport: None,
        };
        let summary = build_summary("src/lib.rs", &snap, LineRange::new(1, 5), None);
        assert_eq!(summary.state, DocPhase::Loading);
        assert!(summary.groups.is_empty());
        assert_eq!(summary.total_lines, 12);
    }

    #[test]
    fn group_view_carries_color_anchor_and_percent() {
        let mut result = BlameResult::default();
        for line in [1, 2, 3] {
            result.line_authors.insert(line, attributed("p1", None));
        }
        let snap = snapshot_with(result, 10);

        let summary = build_summary("src/lib.rs", &snap, LineRange::new(1, 4), None);
        assert_eq!(summary.groups.len(), 1);
        let group = &summary.groups[0];
        assert_eq!(group.lines_in_range, vec![1, 2, 3]);
        assert_eq!(group.anchor_line, 1);
        assert_eq!(group.total_in_file, 3);
        assert_eq!(group.percent_of_file, 30);
        assert_eq!(group.color_index, color::color_index("p1"));
        assert_eq!(group.color, color::color_hex(group.color_index));
    }

    #[test]
    fn missing_record_degrades_to_unknown() {
        let mut result = BlameResult::default();
        result.line_authors.insert(1, attributed("p1", None));
        let snap = snapshot_with(result, 1);

        let summary = build_summary("src/lib.rs", &snap, LineRange::new(1, 1), None);
        let group = &summary.groups[0];
        assert_eq!(group.tool, "unknown");
        assert_eq!(group.model, "unknown");
        assert_eq!(group.human_author, "");
        assert_eq!(group.message_count, 0);
        assert!(group.last_activity.is_none());
    }

    #[test]
    fn malformed_record_fields_degrade_to_unknown() {
        let record = PromptRecord {
            tool: String::new(),
            model: String::new(),
            human_author: "alice".to_string(),
            messages: vec![PromptMessage {
                kind: crate::models::MessageKind::User,
                text: "hi".to_string(),
                timestamp: None,
            }],
            accepted_lines: None,
            other_files: None,
        };
        let mut result = BlameResult::default();
        result.line_authors.insert(1, attributed("p1", Some(record)));
        let snap = snapshot_with(result, 1);

        let group = &build_summary("d", &snap, LineRange::new(1, 1), None).groups[0];
        assert_eq!(group.tool, "unknown");
        assert_eq!(group.model, "unknown");
        assert_eq!(group.human_author, "alice");
        assert_eq!(group.message_count, 1);
    }

    #[test]
    fn stored_viewport_biases_the_anchor_when_none_is_given() {
        let mut result = BlameResult::default();
        for line in [2, 3, 18] {
            result.line_authors.insert(line, attributed("p1", None));
        }
        let mut snap = snapshot_with(result, 30);
        snap.viewport = Some(LineRange::new(5, 20));

        let summary = build_summary("d", &snap, LineRange::new(1, 20), None);
        assert_eq!(summary.groups[0].anchor_line, 18);

        // An explicit viewport overrides the stored one.
        let summary = build_summary("d", &snap, LineRange::new(1, 20), Some(LineRange::new(25, 30)));
        assert_eq!(summary.groups[0].anchor_line, 2);
    }

    #[test]
    fn range_validation_rejects_zero_and_inverted() {
        assert!(validated_range(0, 3).is_err());
        assert!(validated_range(5, 4).is_err());
        assert!(validated_range(4, 4).is_ok());
    }

    #[test]
    fn viewport_parameters_come_in_pairs() {
        assert!(optional_viewport(Some(1), None).is_err());
        assert!(optional_viewport(None, Some(8)).is_err());
        assert_eq!(optional_viewport(None, None).unwrap(), None);
        assert_eq!(
            optional_viewport(Some(1), Some(8)).unwrap(),
            Some(LineRange::new(1, 8))
        );
    }
}
