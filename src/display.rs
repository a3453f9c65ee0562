//! # Display
//!
//! Panel rendering and ANSI styling. Each panel turns one slice of the
//! available data into a short colored fragment; missing data renders a
//! placeholder or drops the panel instead of erroring.

use owo_colors::OwoColorize;

use crate::log_reader::ParsedLog;
use crate::models::{HookJson, UsageSnapshot, UsageWindow};
use crate::utils::{format_cost, format_remaining, format_tokens, pct, short_model};

const DEFAULT_CONTEXT_SIZE: u64 = 200_000;
const BAR_WIDTH: usize = 10;
const TASK_LABEL_MAX: usize = 15;
const AGENT_LABEL_MAX: usize = 20;

type Rgb = (u8, u8, u8);

// Truecolor approximations of the soft 256-color palette.
const SOFT_CYAN: Rgb = (135, 215, 255);
const SOFT_YELLOW: Rgb = (255, 215, 135);
const SOFT_GREEN: Rgb = (175, 215, 175);
const SOFT_RED: Rgb = (255, 135, 135);

fn tint(text: &str, (r, g, b): Rgb) -> String {
    text.truecolor(r, g, b).to_string()
}

fn threshold_rgb(pct: u8) -> Rgb {
    if pct <= 50 {
        SOFT_GREEN
    } else if pct <= 80 {
        SOFT_YELLOW
    } else {
        SOFT_RED
    }
}

/// 10-cell block bar, colored by the same threshold as the percent.
fn bar(pct: u8) -> String {
    let filled = (pct.min(100) as usize * BAR_WIDTH + 50) / 100;
    let graph = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));
    tint(&graph, threshold_rgb(pct))
}

fn separator() -> String {
    format!(" {} ", "│".dimmed())
}

/// Degraded output for missing or malformed stdin.
pub fn warning_line() -> String {
    "⚠️".yellow().to_string()
}

fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() > max {
        let head: String = label.chars().take(max).collect();
        format!("{head}...")
    } else {
        label.to_string()
    }
}

fn model_panel(hook: &HookJson) -> String {
    let name = hook
        .model
        .as_ref()
        .and_then(|m| m.display_name.as_deref())
        .unwrap_or("-");
    tint(&format!("🤖 {}", short_model(name)), SOFT_CYAN)
}

fn context_panel(hook: &HookJson) -> String {
    let cw = hook.context_window.as_ref();
    let size = cw
        .and_then(|c| c.context_window_size)
        .filter(|&s| s > 0)
        .unwrap_or(DEFAULT_CONTEXT_SIZE);

    let Some(usage) = cw.and_then(|c| c.current_usage) else {
        return format!(
            "{} {} 0/{}",
            bar(0),
            tint("0%", SOFT_GREEN),
            format_tokens(size)
        );
    };

    let used = usage.input_tokens + usage.cache_creation_input_tokens + usage.cache_read_input_tokens;
    let percent = pct(used, size);
    [
        bar(percent),
        tint(&format!("{percent}%"), threshold_rgb(percent)),
        format!("{}/{}", format_tokens(used), format_tokens(size)),
    ]
    .join(&separator())
}

fn cost_panel(hook: &HookJson) -> String {
    let cost = hook
        .cost
        .as_ref()
        .and_then(|c| c.total_cost_usd)
        .unwrap_or(0.0);
    tint(&format_cost(cost), SOFT_YELLOW)
}

fn limit_fragment(label: &str, window: Option<&UsageWindow>) -> String {
    let Some(window) = window else {
        return "⚠️".yellow().to_string();
    };
    let percent = tint(
        &format!("{}%", window.percent),
        threshold_rgb(window.percent),
    );
    let remaining = window
        .reset_time
        .map(|t| format!(" ({})", format_remaining(t)))
        .unwrap_or_default();
    format!("{label}: {percent}{remaining}")
}

fn limit_5h_panel(usage: Option<&UsageSnapshot>) -> String {
    limit_fragment("5h", usage.and_then(|u| u.five_hour.as_ref()))
}

fn limit_7d_panel(usage: Option<&UsageSnapshot>) -> Option<String> {
    let window = usage?.seven_day.as_ref()?;
    Some(limit_fragment("7d", Some(window)))
}

fn limit_7d_sonnet_panel(usage: Option<&UsageSnapshot>) -> Option<String> {
    let window = usage?.seven_day_sonnet.as_ref()?;
    Some(limit_fragment("7d-S", Some(window)))
}

fn tools_panel(log: Option<&ParsedLog>) -> Option<String> {
    let log = log?;
    let active = log.active_tools();
    let done = log.done_count();

    if active.is_empty() {
        return Some(format!("Tools: {done} done").dimmed().to_string());
    }

    let names = active
        .iter()
        .take(2)
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let more = if active.len() > 2 {
        format!(" +{}", active.len() - 2)
    } else {
        String::new()
    };
    Some(format!("{} {names}{more} ({done} done)", "⚙️".yellow()))
}

fn agents_panel(log: Option<&ParsedLog>) -> Option<String> {
    let status = log?.agent_status();
    if status.running.is_empty() && status.done == 0 {
        return None;
    }
    if status.running.is_empty() {
        return Some(format!("Agent: {} done", status.done).dimmed().to_string());
    }

    let name = truncate_label(&status.running[0], AGENT_LABEL_MAX);
    let more = if status.running.len() > 1 {
        format!(" +{}", status.running.len() - 1)
    } else {
        String::new()
    };
    Some(format!("{} Agent: {name}{more}", "🤖".cyan()))
}

fn todos_panel(log: Option<&ParsedLog>) -> Option<String> {
    let progress = log?.todo_progress();
    let Some(progress) = progress.filter(|p| p.total > 0) else {
        return Some("Todos: -".dimmed().to_string());
    };

    if let Some(current) = &progress.current {
        let task = truncate_label(current, TASK_LABEL_MAX);
        return Some(format!(
            "{} {task} [{}/{}]",
            tint("✓", SOFT_GREEN),
            progress.done,
            progress.total
        ));
    }

    let done_pct = pct(progress.done as u64, progress.total as u64);
    let color = if progress.done == progress.total {
        SOFT_GREEN
    } else {
        threshold_rgb(100 - done_pct)
    };
    Some(tint(
        &format!("Todos: {}/{}", progress.done, progress.total),
        color,
    ))
}

/// Cache hit rate of the latest turn. High hit rate is good, so the color
/// threshold is inverted.
fn cache_panel(hook: &HookJson) -> String {
    let usage = hook
        .context_window
        .as_ref()
        .and_then(|c| c.current_usage);

    let Some(usage) = usage else {
        return format!("📦 {}", tint("0%", threshold_rgb(100)));
    };
    let total =
        usage.cache_read_input_tokens + usage.input_tokens + usage.cache_creation_input_tokens;
    if total == 0 {
        return format!("📦 {}", tint("0%", threshold_rgb(100)));
    }

    let hit = pct(usage.cache_read_input_tokens, total);
    format!("📦 {}", tint(&format!("{hit}%"), threshold_rgb(100 - hit)))
}

/// Compose the full status output: line 1 for session facts, line 2 for
/// transcript-derived activity.
pub fn render_status(
    hook: &HookJson,
    usage: Option<&UsageSnapshot>,
    log: Option<&ParsedLog>,
) -> String {
    let sep = separator();

    let mut line1 = vec![
        model_panel(hook),
        context_panel(hook),
        cost_panel(hook),
        limit_5h_panel(usage),
    ];
    if let Some(panel) = limit_7d_panel(usage) {
        line1.push(panel);
    }
    if let Some(panel) = limit_7d_sonnet_panel(usage) {
        line1.push(panel);
    }

    let mut line2 = Vec::new();
    if let Some(panel) = tools_panel(log) {
        line2.push(panel);
    }
    if let Some(panel) = agents_panel(log) {
        line2.push(panel);
    }
    if let Some(panel) = todos_panel(log) {
        line2.push(panel);
    }
    line2.push(cache_panel(hook));

    format!("{}\n{}", line1.join(&sep), line2.join(&sep))
}
