//! Selection-scoped aggregation over a cached blame result.
//!
//! Pure functions that turn a per-line attribution map into the shapes the
//! host renders: per-prompt line totals for the whole document, prompt groups
//! for a selected range (in first-occurrence order), anchor lines biased
//! toward the viewport, and file-wide highlight buckets keyed by palette
//! slot.
//!
//! Used by: the selection, line, and totals routes, and the store when it
//! installs a fresh result.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::blame::color;
use crate::models::{BlameResult, LineRange, PromptRecord};

/// One prompt's contribution to a selected range.
#[derive(Debug, Clone)]
pub struct SelectionGroup {
    /// Grouping key of the generation event
    pub prompt_id: String,
    /// Selected lines attributed to this prompt, ascending
    pub lines_in_range: Vec<u32>,
    /// Lines this prompt authored anywhere in the file
    pub total_in_file: usize,
    /// Conversation metadata, when any covered line carries it
    pub record: Option<PromptRecord>,
}

/// Caps a range scan at the last attributed line. Selections arrive from the
/// wire unclamped and may reach far past the end of the file; lines beyond
/// the map cannot contribute to any group.
fn scan_end(result: &BlameResult, range: LineRange) -> u32 {
    let last = result.line_authors.keys().copied().max().unwrap_or(0);
    range.end.min(last)
}

/// Counts AI-authored lines per prompt across the whole result.
///
/// Reads only the result; calling it twice on the same result yields the
/// same map.
pub fn totals_by_prompt(result: &BlameResult) -> HashMap<String, usize> {
    let mut totals: HashMap<String, usize> = HashMap::new();
    for attr in result.line_authors.values() {
        if attr.is_ai_authored {
            *totals.entry(attr.prompt_id.clone()).or_insert(0) += 1;
        }
    }
    totals
}

/// Groups the AI-authored lines of `range` by prompt.
///
/// Groups appear in the order their first line occurs scanning the range top
/// to bottom; an interleaved prompt still forms a single group. Human lines
/// and unattributed lines contribute nothing.
pub fn selection_groups(
    result: &BlameResult,
    range: LineRange,
    totals: &HashMap<String, usize>,
) -> Vec<SelectionGroup> {
    let mut groups: Vec<SelectionGroup> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    for line in range.start..=scan_end(result, range) {
        let Some(attr) = result.line(line) else { continue };
        if !attr.is_ai_authored {
            continue;
        }
        match index_of.get(&attr.prompt_id) {
            Some(&i) => {
                let group = &mut groups[i];
                group.lines_in_range.push(line);
                if group.record.is_none() {
                    group.record = attr.record.clone();
                }
            }
            None => {
                index_of.insert(attr.prompt_id.clone(), groups.len());
                groups.push(SelectionGroup {
                    prompt_id: attr.prompt_id.clone(),
                    lines_in_range: vec![line],
                    total_in_file: totals.get(&attr.prompt_id).copied().unwrap_or(0),
                    record: attr.record.clone(),
                });
            }
        }
    }
    groups
}

/// Picks the representative line for a group.
///
/// Prefers the smallest group line inside the viewport; with no viewport or
/// no visible line, falls back to the smallest line overall. `lines` must be
/// ascending, which `selection_groups` guarantees.
pub fn anchor_line(lines: &[u32], viewport: Option<LineRange>) -> Option<u32> {
    if let Some(vp) = viewport {
        if let Some(&visible) = lines.iter().find(|&&l| vp.contains(l)) {
            return Some(visible);
        }
    }
    lines.first().copied()
}

/// Rounds a prompt's file-wide share to a whole percentage.
pub fn percent_of_file(total_in_file: usize, total_lines: usize) -> u32 {
    if total_lines == 0 {
        return 0;
    }
    ((total_in_file as f64 / total_lines as f64) * 100.0).round() as u32
}

/// Collects every line of every prompt touched by `range`, bucketed by
/// palette slot.
///
/// A selection that grazes one line of a prompt highlights all of that
/// prompt's lines file-wide; prompts outside the selection stay dark. Lines
/// within a bucket are ascending, buckets ascend by slot.
pub fn file_highlights(result: &BlameResult, range: LineRange) -> BTreeMap<usize, Vec<u32>> {
    let mut selected: HashSet<&str> = HashSet::new();
    for line in range.start..=scan_end(result, range) {
        if let Some(attr) = result.line(line) {
            if attr.is_ai_authored {
                selected.insert(attr.prompt_id.as_str());
            }
        }
    }

    let mut buckets: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
    for (&line, attr) in &result.line_authors {
        if attr.is_ai_authored && selected.contains(attr.prompt_id.as_str()) {
            buckets
                .entry(color::color_index(&attr.prompt_id))
                .or_default()
                .push(line);
        }
    }
    for lines in buckets.values_mut() {
        lines.sort_unstable();
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineAttribution;

    fn ai_line(prompt: &str) -> LineAttribution {
        LineAttribution {
            is_ai_authored: true,
            author: "assistant".to_string(),
            prompt_id: prompt.to_string(),
            record: None,
        }
    }

    fn result_with(lines: &[(u32, &str)]) -> BlameResult {
        let mut result = BlameResult::default();
        for (line, prompt) in lines {
            result.line_authors.insert(*line, ai_line(prompt));
        }
        result
    }

    #[test]
    fn totals_count_lines_per_prompt() {
        let result = result_with(&[(1, "p1"), (2, "p1"), (3, "p1"), (7, "p2")]);
        let totals = totals_by_prompt(&result);
        assert_eq!(totals.get("p1"), Some(&3));
        assert_eq!(totals.get("p2"), Some(&1));
    }

    #[test]
    fn totals_are_a_pure_function_of_the_result() {
        let result = result_with(&[(1, "p1"), (2, "p2"), (9, "p1")]);
        assert_eq!(totals_by_prompt(&result), totals_by_prompt(&result));
    }

    #[test]
    fn human_lines_never_count() {
        let mut result = result_with(&[(1, "p1")]);
        result.line_authors.insert(
            2,
            LineAttribution {
                is_ai_authored: false,
                author: "alice".to_string(),
                prompt_id: String::new(),
                record: None,
            },
        );
        let totals = totals_by_prompt(&result);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals.get("p1"), Some(&1));
    }

    #[test]
    fn mixed_selection_groups_only_the_ai_lines() {
        // 10-line document: prompt p1 wrote lines 1-3, line 4 is human,
        // lines 5-10 carry no attribution.
        let result = result_with(&[(1, "p1"), (2, "p1"), (3, "p1")]);
        let totals = totals_by_prompt(&result);
        let groups = selection_groups(&result, LineRange::new(1, 4), &totals);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].prompt_id, "p1");
        assert_eq!(groups[0].lines_in_range, vec![1, 2, 3]);
        assert_eq!(groups[0].total_in_file, 3);
        assert_eq!(percent_of_file(groups[0].total_in_file, 10), 30);
    }

    #[test]
    fn groups_follow_first_occurrence_order() {
        // p2 appears first in the file but p1 is hit first by the scan.
        let result = result_with(&[(1, "p1"), (2, "p2"), (3, "p1"), (4, "p2")]);
        let totals = totals_by_prompt(&result);
        let groups = selection_groups(&result, LineRange::new(1, 4), &totals);

        let order: Vec<&str> = groups.iter().map(|g| g.prompt_id.as_str()).collect();
        assert_eq!(order, vec!["p1", "p2"]);
        assert_eq!(groups[0].lines_in_range, vec![1, 3]);
        assert_eq!(groups[1].lines_in_range, vec![2, 4]);
    }

    #[test]
    fn lines_in_range_never_exceed_file_totals() {
        let result = result_with(&[(1, "p1"), (2, "p1"), (5, "p1"), (6, "p2"), (9, "p2")]);
        let totals = totals_by_prompt(&result);
        for (start, end) in [(1, 2), (1, 9), (4, 6), (8, 9), (3, 4)] {
            for group in selection_groups(&result, LineRange::new(start, end), &totals) {
                assert!(
                    group.lines_in_range.len() <= group.total_in_file,
                    "range {}..={} prompt {}",
                    start,
                    end,
                    group.prompt_id
                );
            }
        }
    }

    #[test]
    fn range_outside_any_attribution_yields_no_groups() {
        let result = result_with(&[(1, "p1")]);
        let totals = totals_by_prompt(&result);
        assert!(selection_groups(&result, LineRange::new(5, 9), &totals).is_empty());
    }

    #[test]
    fn range_end_beyond_the_last_attribution_changes_nothing() {
        // The scan is bounded by the attribution map, not the wire range; a
        // u32::MAX end must answer as fast as one ending at the file.
        let result = result_with(&[(1, "p1"), (900, "p2")]);
        let totals = totals_by_prompt(&result);

        let bounded = selection_groups(&result, LineRange::new(1, 900), &totals);
        let unbounded = selection_groups(&result, LineRange::new(1, u32::MAX), &totals);
        assert_eq!(unbounded.len(), bounded.len());
        for (a, b) in bounded.iter().zip(&unbounded) {
            assert_eq!(a.prompt_id, b.prompt_id);
            assert_eq!(a.lines_in_range, b.lines_in_range);
            assert_eq!(a.total_in_file, b.total_in_file);
        }

        assert_eq!(
            file_highlights(&result, LineRange::new(1, u32::MAX)),
            file_highlights(&result, LineRange::new(1, 900))
        );
    }

    #[test]
    fn group_keeps_the_first_record_it_sees() {
        let mut result = result_with(&[(1, "p1"), (2, "p1")]);
        if let Some(attr) = result.line_authors.get_mut(&2) {
            attr.record = Some(PromptRecord {
                tool: "editor-agent".to_string(),
                ..Default::default()
            });
        }
        let totals = totals_by_prompt(&result);
        let groups = selection_groups(&result, LineRange::new(1, 2), &totals);
        // Line 1 carried no record; line 2 fills it in.
        assert_eq!(
            groups[0].record.as_ref().map(|r| r.tool.as_str()),
            Some("editor-agent")
        );
    }

    #[test]
    fn anchor_prefers_the_viewport() {
        let lines = [2, 3, 18];
        assert_eq!(anchor_line(&lines, Some(LineRange::new(5, 20))), Some(18));
    }

    #[test]
    fn anchor_falls_back_to_the_smallest_line() {
        let lines = [2, 3, 18];
        assert_eq!(anchor_line(&lines, Some(LineRange::new(25, 30))), Some(2));
        assert_eq!(anchor_line(&lines, None), Some(2));
    }

    #[test]
    fn anchor_of_nothing_is_nothing() {
        assert_eq!(anchor_line(&[], Some(LineRange::new(1, 10))), None);
    }

    #[test]
    fn percent_rounds_to_nearest_whole() {
        assert_eq!(percent_of_file(3, 10), 30);
        assert_eq!(percent_of_file(1, 3), 33);
        assert_eq!(percent_of_file(2, 3), 67);
        assert_eq!(percent_of_file(0, 10), 0);
        assert_eq!(percent_of_file(10, 10), 100);
    }

    #[test]
    fn percent_of_an_empty_document_is_zero() {
        assert_eq!(percent_of_file(5, 0), 0);
    }

    #[test]
    fn touching_one_line_highlights_the_whole_prompt() {
        let result = result_with(&[(1, "p1"), (2, "p1"), (30, "p1"), (5, "p2")]);
        let buckets = file_highlights(&result, LineRange::new(1, 1));

        assert_eq!(buckets.len(), 1);
        let lines = buckets.values().next().unwrap();
        assert_eq!(lines, &vec![1, 2, 30]);
    }

    #[test]
    fn untouched_prompts_stay_out_of_the_buckets() {
        let result = result_with(&[(1, "p1"), (5, "p2")]);
        let buckets = file_highlights(&result, LineRange::new(1, 2));
        let all_lines: Vec<u32> = buckets.values().flatten().copied().collect();
        assert!(!all_lines.contains(&5));
    }

    #[test]
    fn prompts_sharing_a_slot_share_a_bucket() {
        // Same id string means same slot; distinct ids may collide too, but
        // identical ids are the deterministic case.
        let result = result_with(&[(1, "p1"), (9, "p1")]);
        let buckets = file_highlights(&result, LineRange::new(1, 9));
        assert_eq!(buckets.len(), 1);
        assert_eq!(
            buckets.keys().next().copied(),
            Some(color::color_index("p1"))
        );
    }
}
