use chrono::{DateTime, Utc};
use std::io::Read;
use std::path::PathBuf;

pub fn read_stdin() -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf)?;
    Ok(buf)
}

/// Disk cache directory, `~/.cache/claude-status` by default.
/// `CLAUDE_STATUS_CACHE_DIR` overrides it (used by tests).
pub fn default_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CLAUDE_STATUS_CACHE_DIR") {
        let dir = dir.trim();
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    directories::BaseDirs::new()
        .map(|b| b.cache_dir().join("claude-status"))
        .unwrap_or_else(|| PathBuf::from(".claude-status-cache"))
}

/// Compact token count: `950`, `1.5K`, `150K`, `1.2M`, `12M`.
pub fn format_tokens(n: u64) -> String {
    if n >= 1_000_000 {
        let v = n as f64 / 1e6;
        if v >= 10.0 {
            format!("{}M", v.round() as u64)
        } else {
            format!("{v:.1}M")
        }
    } else if n >= 1_000 {
        let v = n as f64 / 1e3;
        if v >= 10.0 {
            format!("{}K", v.round() as u64)
        } else {
            format!("{v:.1}K")
        }
    } else {
        n.to_string()
    }
}

pub fn format_cost(usd: f64) -> String {
    format!("${usd:.2}")
}

/// Integer percentage of `current` against `total`, capped at 100.
pub fn pct(current: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let raw = (current as f64 / total as f64 * 100.0).round();
    raw.clamp(0.0, 100.0) as u8
}

/// Countdown until a reset timestamp: `1d3h`, `2h30m`, `45m`, `0m` when past.
pub fn format_remaining(reset: DateTime<Utc>) -> String {
    let secs = (reset - Utc::now()).num_seconds();
    if secs <= 0 {
        return "0m".to_string();
    }
    let mins = secs / 60;
    let hrs = mins / 60;
    let days = hrs / 24;
    if days > 0 {
        format!("{}d{}h", days, hrs % 24)
    } else if hrs > 0 {
        format!("{}h{}m", hrs, mins % 60)
    } else {
        format!("{mins}m")
    }
}

/// Shorten a model display name: "Claude 3.5 Sonnet" -> "Sonnet".
pub fn short_model(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.contains("opus") {
        return "Opus".to_string();
    }
    if lower.contains("sonnet") {
        return "Sonnet".to_string();
    }
    if lower.contains("haiku") {
        return "Haiku".to_string();
    }
    name.split_whitespace()
        .last()
        .unwrap_or(name)
        .to_string()
}
