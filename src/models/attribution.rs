//! Attribution data transfer objects.
//!
//! Core shapes shared by the provider boundary, the document store, and the
//! API: one `LineAttribution` per AI-authored line, keyed by the prompt that
//! produced it, plus the `PromptRecord` conversation metadata attached to
//! each prompt. Lines absent from a `BlameResult` are human-authored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of one tracked document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocPhase {
    /// No attribution data and nothing running.
    #[default]
    Empty,
    /// A fetch is outstanding and no usable result is cached.
    Loading,
    /// A result is cached and matches the current buffer content.
    Ready,
    /// The buffer changed since the cached result; a refetch is pending.
    Stale,
}

/// Fetch urgency forwarded to the attribution provider.
///
/// `High` marks interactive requests (an active multi-line selection is
/// waiting on the answer); `Normal` marks background refreshes. The hint is
/// advisory: nothing on our side reorders work based on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    High,
}

/// Inclusive, 1-indexed line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    /// First line of the range
    pub start: u32,
    /// Last line of the range (inclusive)
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// True when the range spans more than one line.
    pub fn is_multi_line(&self) -> bool {
        self.end > self.start
    }

    /// True when `line` falls inside the range.
    pub fn contains(&self, line: u32) -> bool {
        line >= self.start && line <= self.end
    }
}

/// Authorship of a single line: one AI generation event, or a human edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineAttribution {
    /// Whether the line was written by an AI agent
    pub is_ai_authored: bool,
    /// Display author: the agent tool for AI lines
    pub author: String,
    /// Opaque grouping key, one per AI generation event. Never reused across
    /// events, so equality means "same prompt".
    pub prompt_id: String,
    /// Conversation metadata for the prompt, when the provider has it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<PromptRecord>,
}

/// Conversation metadata for one AI generation event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptRecord {
    /// Agent tool that produced the lines (e.g. an editor assistant)
    #[serde(default)]
    pub tool: String,
    /// Model identifier reported by the tool
    #[serde(default)]
    pub model: String,
    /// Human who drove the session, when recorded
    #[serde(default)]
    pub human_author: String,
    /// Conversation turns, oldest first
    #[serde(default)]
    pub messages: Vec<PromptMessage>,
    /// Lines from this prompt the human kept, when the tool reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_lines: Option<u32>,
    /// Other files the same prompt touched, when the tool reports them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_files: Option<Vec<String>>,
}

impl PromptRecord {
    /// Tool name for display; malformed records degrade to "unknown".
    pub fn display_tool(&self) -> &str {
        if self.tool.is_empty() { "unknown" } else { &self.tool }
    }

    /// Model name for display; malformed records degrade to "unknown".
    pub fn display_model(&self) -> &str {
        if self.model.is_empty() { "unknown" } else { &self.model }
    }

    /// Unix timestamp of the newest message carrying one.
    pub fn last_activity(&self) -> Option<i64> {
        self.messages.iter().rev().find_map(|m| m.timestamp)
    }
}

/// One turn of a prompt conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Who spoke
    pub kind: MessageKind,
    /// Message text
    pub text: String,
    /// Unix timestamp (seconds), when the tool recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Assistant,
}

/// Per-line attribution for one document at one content version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlameResult {
    /// 1-indexed line number -> attribution. Human-authored lines are absent.
    pub line_authors: HashMap<u32, LineAttribution>,
    /// Opaque identity of the content the result was computed against
    #[serde(default)]
    pub subject_version: String,
}

impl BlameResult {
    /// Attribution for a single line, if the line is AI-authored.
    pub fn line(&self, line: u32) -> Option<&LineAttribution> {
        self.line_authors.get(&line)
    }
}
