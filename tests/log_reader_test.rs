use claude_status::log_reader::TranscriptReader;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn tool_use_line(id: &str, name: &str, input: &str, ts: &str) -> String {
    format!(
        r#"{{"type":"assistant","timestamp":"{ts}","message":{{"content":[{{"type":"tool_use","id":"{id}","name":"{name}","input":{input}}}]}}}}"#
    )
}

fn tool_result_line(id: &str) -> String {
    format!(
        r#"{{"type":"user","message":{{"content":[{{"type":"tool_result","tool_use_id":"{id}"}}]}}}}"#
    )
}

fn write_log(dir: &TempDir, name: &str, lines: &[String]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

#[test]
fn test_tool_call_correlation() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        "t.jsonl",
        &[
            tool_use_line("t1", "Bash", "{}", "2026-01-05T10:00:00Z"),
            tool_result_line("t1"),
            tool_use_line("t2", "Read", "{}", "2026-01-05T10:01:00Z"),
        ],
    );

    let reader = TranscriptReader::new();
    let log = reader.read_log(&path).unwrap();

    assert_eq!(log.done_count(), 1);
    let active = log.active_tools();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Read");

    // Active iff indexed and not done, for every call.
    for call in &log.tool_calls {
        let is_active = active.iter().any(|a| a.name == call.name);
        assert_eq!(is_active, !log.tool_done.contains(&call.id));
    }

    // Session start is the first timestamped entry.
    assert_eq!(
        log.start_time.unwrap().to_rfc3339(),
        "2026-01-05T10:00:00+00:00"
    );
}

#[test]
fn test_start_time_skips_unparseable_timestamps() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        "t.jsonl",
        &[
            tool_use_line("t1", "Bash", "{}", "not-a-time"),
            tool_use_line("t2", "Read", "{}", "2026-01-05T10:05:00Z"),
        ],
    );

    let log = TranscriptReader::new().read_log(&path).unwrap();
    // The first entry whose timestamp actually parses wins.
    assert_eq!(
        log.start_time.unwrap().to_rfc3339(),
        "2026-01-05T10:05:00+00:00"
    );
}

#[test]
fn test_malformed_lines_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        "t.jsonl",
        &[
            tool_use_line("t1", "Bash", "{}", "2026-01-05T10:00:00Z"),
            "{this is not json".to_string(),
            "".to_string(),
            tool_result_line("t1"),
        ],
    );

    let log = TranscriptReader::new().read_log(&path).unwrap();
    assert_eq!(log.entries.len(), 2);
    assert_eq!(log.done_count(), 1);
    assert!(log.active_tools().is_empty());
}

#[test]
fn test_string_message_content_is_ignored() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        "t.jsonl",
        &[r#"{"type":"user","message":{"content":"plain text"}}"#.to_string()],
    );

    let log = TranscriptReader::new().read_log(&path).unwrap();
    assert_eq!(log.entries.len(), 1);
    assert_eq!(log.done_count(), 0);
    assert!(log.tool_calls.is_empty());
}

#[test]
fn test_unchanged_file_returns_cached_parse() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        "t.jsonl",
        &[tool_use_line("t1", "Bash", "{}", "2026-01-05T10:00:00Z")],
    );

    let reader = TranscriptReader::new();
    let first = reader.read_log(&path).unwrap();
    let second = reader.read_log(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_mtime_change_triggers_reparse() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        "t.jsonl",
        &[tool_use_line("t1", "Bash", "{}", "2026-01-05T10:00:00Z")],
    );

    let reader = TranscriptReader::new();
    let first = reader.read_log(&path).unwrap();

    let lines = vec![
        tool_use_line("t1", "Bash", "{}", "2026-01-05T10:00:00Z"),
        tool_result_line("t1"),
    ];
    std::fs::write(&path, lines.join("\n")).unwrap();
    // Force a different mtime in case the rewrite lands in the same tick.
    let file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(5))
        .unwrap();
    drop(file);

    let second = reader.read_log(&path).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.done_count(), 1);
}

#[test]
fn test_cache_holds_single_file() {
    let dir = TempDir::new().unwrap();
    let a = write_log(
        &dir,
        "a.jsonl",
        &[tool_use_line("t1", "Bash", "{}", "2026-01-05T10:00:00Z")],
    );
    let b = write_log(
        &dir,
        "b.jsonl",
        &[tool_use_line("t2", "Read", "{}", "2026-01-05T10:01:00Z")],
    );

    let reader = TranscriptReader::new();
    let first_a = reader.read_log(&a).unwrap();
    reader.read_log(&b).unwrap();
    // Reading b evicted a's slot.
    let second_a = reader.read_log(&a).unwrap();
    assert!(!Arc::ptr_eq(&first_a, &second_a));
}

#[test]
fn test_missing_file_yields_none() {
    assert!(TranscriptReader::new()
        .read_log(Path::new("/nonexistent/transcript.jsonl"))
        .is_none());
}

#[test]
fn test_todo_progress_from_last_completed_write() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        "t.jsonl",
        &[
            tool_use_line(
                "w1",
                "TodoWrite",
                r#"{"todos":[{"content":"old","status":"pending"}]}"#,
                "2026-01-05T10:00:00Z",
            ),
            tool_result_line("w1"),
            tool_use_line(
                "w2",
                "TodoWrite",
                r#"{"todos":[{"content":"A","status":"completed"},{"content":"B","status":"in_progress"}]}"#,
                "2026-01-05T10:02:00Z",
            ),
            tool_result_line("w2"),
        ],
    );

    let log = TranscriptReader::new().read_log(&path).unwrap();
    let progress = log.todo_progress().unwrap();
    assert_eq!(progress.current.as_deref(), Some("B"));
    assert_eq!(progress.done, 1);
    assert_eq!(progress.total, 2);
}

#[test]
fn test_incomplete_todo_write_is_ignored() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        "t.jsonl",
        &[
            // No tool_result: the call never completed.
            tool_use_line(
                "w1",
                "TodoWrite",
                r#"{"todos":[{"content":"A","status":"pending"}]}"#,
                "2026-01-05T10:00:00Z",
            ),
        ],
    );

    let log = TranscriptReader::new().read_log(&path).unwrap();
    assert!(log.todo_progress().is_none());
}

#[test]
fn test_malformed_todo_input_yields_none() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        "t.jsonl",
        &[
            tool_use_line("w1", "TodoWrite", r#"{"todos":"oops"}"#, "2026-01-05T10:00:00Z"),
            tool_result_line("w1"),
        ],
    );

    let log = TranscriptReader::new().read_log(&path).unwrap();
    assert!(log.todo_progress().is_none());
}

#[test]
fn test_agent_status_labels_and_done_count() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        &dir,
        "t.jsonl",
        &[
            tool_use_line(
                "a1",
                "Task",
                r#"{"description":"Investigate the flaky integration suite"}"#,
                "2026-01-05T10:00:00Z",
            ),
            tool_use_line(
                "a2",
                "Task",
                r#"{"subagent_type":"reviewer"}"#,
                "2026-01-05T10:01:00Z",
            ),
            tool_use_line("a3", "Task", "{}", "2026-01-05T10:02:00Z"),
            tool_use_line("a4", "Task", r#"{"description":"done one"}"#, "2026-01-05T10:03:00Z"),
            tool_result_line("a4"),
        ],
    );

    let log = TranscriptReader::new().read_log(&path).unwrap();
    let status = log.agent_status();
    assert_eq!(status.done, 1);
    // Full descriptions; fallbacks are the subagent type, then a generic
    // label. Display-side shortening is not the reader's job.
    assert_eq!(
        status.running,
        vec![
            "Investigate the flaky integration suite".to_string(),
            "reviewer".to_string(),
            "Agent".to_string(),
        ]
    );
}
