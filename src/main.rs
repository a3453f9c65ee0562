use clap::Parser;
use std::path::Path;
use std::time::Duration;

use claude_status::cli::Args;
use claude_status::display::{render_status, warning_line};
use claude_status::models::HookJson;
use claude_status::utils::read_stdin;
use claude_status::StatusContext;

fn read_hook() -> Option<HookJson> {
    let raw = read_stdin().ok()?;
    if raw.is_empty() {
        return None;
    }
    serde_json::from_slice(&raw).ok()
}

fn main() {
    let args = Args::parse();

    // Missing or malformed input degrades to a glyph, never a non-zero exit.
    let Some(hook) = read_hook() else {
        println!("{}", warning_line());
        return;
    };

    let ctx = StatusContext::new(args.claude_dir.clone());

    let usage = if args.offline {
        None
    } else {
        ctx.usage.fetch_usage(Duration::from_secs(args.ttl))
    };

    let log = hook
        .transcript_path
        .as_deref()
        .and_then(|p| ctx.reader.read_log(Path::new(p)));

    println!("{}", render_status(&hook, usage.as_ref(), log.as_deref()));
}
