//! # Transcript Reader
//!
//! Parses Claude Code transcript JSONL files and correlates tool invocations
//! with their results. A single-slot cache keyed by (path, mtime) keeps
//! repeated statusline refreshes from re-parsing an unchanged file.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::models::TranscriptEntry;

const TODO_TOOL: &str = "TodoWrite";
const AGENT_TOOL: &str = "Task";

/// One tool invocation seen in an assistant turn.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub time: Option<DateTime<Utc>>,
    pub input: Option<serde_json::Value>,
}

/// A tool call still waiting on its result.
#[derive(Debug, Clone)]
pub struct ActiveTool {
    pub name: String,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoProgress {
    pub current: Option<String>,
    pub done: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentStatus {
    pub running: Vec<String>,
    pub done: usize,
}

/// A fully parsed transcript. `tool_calls` keeps invocation order; a call is
/// active iff its id is absent from `tool_done`.
#[derive(Debug)]
pub struct ParsedLog {
    pub entries: Vec<TranscriptEntry>,
    pub tool_calls: Vec<ToolCall>,
    pub tool_done: HashSet<String>,
    pub start_time: Option<DateTime<Utc>>,
}

impl ParsedLog {
    /// Tool calls without a matching result, with their invocation times.
    pub fn active_tools(&self) -> Vec<ActiveTool> {
        self.tool_calls
            .iter()
            .filter(|call| !self.tool_done.contains(&call.id))
            .map(|call| ActiveTool {
                name: call.name.clone(),
                since: call.time.unwrap_or_else(Utc::now),
            })
            .collect()
    }

    pub fn done_count(&self) -> usize {
        self.tool_done.len()
    }

    /// Progress from the last completed `TodoWrite` call's input: completed
    /// count, total, and the first in-progress or pending item.
    pub fn todo_progress(&self) -> Option<TodoProgress> {
        let mut last: Option<&serde_json::Value> = None;
        for call in &self.tool_calls {
            if call.name == TODO_TOOL && self.tool_done.contains(&call.id) {
                if let Some(input) = &call.input {
                    last = Some(input);
                }
            }
        }

        let todos = last?.get("todos")?.as_array()?;
        let mut done = 0;
        let mut current = None;
        for todo in todos {
            let status = todo.get("status").and_then(|s| s.as_str()).unwrap_or("");
            if status == "completed" {
                done += 1;
            } else if current.is_none() && (status == "in_progress" || status == "pending") {
                current = todo
                    .get("content")
                    .and_then(|c| c.as_str())
                    .map(str::to_string);
            }
        }

        Some(TodoProgress {
            current,
            done,
            total: todos.len(),
        })
    }

    /// Sub-agent (`Task`) dispatches: completed calls feed the done counter,
    /// the rest contribute a label in invocation order. Labels are returned
    /// in full; shortening is a presentation concern.
    pub fn agent_status(&self) -> AgentStatus {
        let mut status = AgentStatus::default();
        for call in &self.tool_calls {
            if call.name != AGENT_TOOL {
                continue;
            }
            if self.tool_done.contains(&call.id) {
                status.done += 1;
                continue;
            }
            let label = call
                .input
                .as_ref()
                .and_then(agent_label)
                .unwrap_or_else(|| "Agent".to_string());
            status.running.push(label);
        }
        status
    }
}

fn agent_label(input: &serde_json::Value) -> Option<String> {
    input
        .get("description")
        .and_then(|d| d.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            input
                .get("subagent_type")
                .and_then(|t| t.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
}

struct CachedParse {
    path: PathBuf,
    mtime: SystemTime,
    log: Arc<ParsedLog>,
}

/// Reader with a capacity-1 most-recent-file cache.
#[derive(Default)]
pub struct TranscriptReader {
    cache: Mutex<Option<CachedParse>>,
}

impl TranscriptReader {
    pub fn new() -> Self {
        TranscriptReader::default()
    }

    /// Parse `path`, or hand back the cached parse when the file's mtime is
    /// unchanged. Any IO failure yields `None`.
    pub fn read_log(&self, path: &Path) -> Option<Arc<ParsedLog>> {
        let mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;

        if let Ok(cache) = self.cache.lock() {
            if let Some(cached) = cache.as_ref() {
                if cached.path == path && cached.mtime == mtime {
                    return Some(Arc::clone(&cached.log));
                }
            }
        }

        let raw = std::fs::read_to_string(path).ok()?;
        let log = Arc::new(parse_transcript(&raw));
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(CachedParse {
                path: path.to_path_buf(),
                mtime,
                log: Arc::clone(&log),
            });
        }
        Some(log)
    }
}

/// Parse transcript text line by line; malformed lines are skipped so one
/// corrupt record never fails the whole read.
fn parse_transcript(raw: &str) -> ParsedLog {
    let entries: Vec<TranscriptEntry> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect();

    let mut tool_calls: Vec<ToolCall> = Vec::new();
    let mut tool_done = HashSet::new();
    let mut start_time = None;

    for entry in &entries {
        let time = entry
            .timestamp
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|d| d.with_timezone(&Utc));
        if start_time.is_none() {
            start_time = time;
        }

        let blocks = entry
            .message
            .as_ref()
            .and_then(|m| m.content.as_ref())
            .map(|c| c.blocks())
            .unwrap_or(&[]);

        match entry.r#type.as_deref() {
            Some("assistant") => {
                for block in blocks {
                    if block.r#type.as_deref() != Some("tool_use") {
                        continue;
                    }
                    let (Some(id), Some(name)) = (&block.id, &block.name) else {
                        continue;
                    };
                    let call = ToolCall {
                        id: id.clone(),
                        name: name.clone(),
                        time,
                        input: block.input.clone(),
                    };
                    // Re-issued ids replace in place, preserving order.
                    match tool_calls.iter_mut().find(|c| c.id == call.id) {
                        Some(existing) => *existing = call,
                        None => tool_calls.push(call),
                    }
                }
            }
            Some("user") => {
                for block in blocks {
                    if block.r#type.as_deref() == Some("tool_result") {
                        if let Some(id) = &block.tool_use_id {
                            tool_done.insert(id.clone());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    ParsedLog {
        entries,
        tool_calls,
        tool_done,
        start_time,
    }
}
