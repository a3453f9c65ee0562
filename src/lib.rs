//! # Claude Status
//!
//! Renders a one/two-line colored status bar for Claude Code. Input is a JSON
//! session snapshot on stdin plus an optional transcript JSONL file; output is
//! ANSI text composed from independent panels (model, context, cost, rate
//! limits, running tools, agents, todos, cache hit rate).
//!
//! The interesting machinery lives in two places:
//! - [`usage_api::UsageCache`]: memory → disk → network tiers for rate-limit
//!   data, with in-flight request de-duplication and a last-known-good
//!   fallback when no credential is available.
//! - [`log_reader::TranscriptReader`]: incremental transcript parsing keyed
//!   by file mtime, correlating tool calls with their results.
//!
//! Every external failure degrades to an absent panel; the process always
//! exits 0.

/// Credential resolution (env, keychain, credentials file)
pub mod auth;

/// Command-line argument parsing
pub mod cli;

/// Panel rendering and ANSI styling
pub mod display;

/// Transcript parsing with mtime-keyed caching
pub mod log_reader;

/// Serde wire types for stdin, transcripts, and usage data
pub mod models;

/// Tiered usage-data cache over the OAuth usage API
pub mod usage_api;

/// Formatting helpers, stdin, cache paths
pub mod utils;

use std::path::PathBuf;

use log_reader::TranscriptReader;
use usage_api::UsageCache;

/// Long-lived state owned by the process entry point: the usage cache and the
/// transcript reader, each carrying its own internal caches.
pub struct StatusContext {
    pub usage: UsageCache,
    pub reader: TranscriptReader,
}

impl StatusContext {
    pub fn new(claude_dir: Option<PathBuf>) -> Self {
        StatusContext {
            usage: UsageCache::new(claude_dir),
            reader: TranscriptReader::new(),
        }
    }
}
