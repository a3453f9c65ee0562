//! # Usage Cache
//!
//! Rate-limit usage retrieved from the Claude OAuth API through a tiered
//! cache: process memory, one JSON file per token digest on disk, then the
//! network. Concurrent callers for the same digest share a single in-flight
//! fetch, and when no token can be resolved the last known digest's cached
//! data is served with a relaxed TTL rather than showing nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use crate::auth::{CredentialResolver, TokenSource, UsageTransport};
use crate::models::{UsageSnapshot, UsageWindow};
use crate::utils::default_cache_dir;

const USAGE_ENDPOINT: &str = "https://api.anthropic.com/api/oauth/usage";
const ANTHROPIC_BETA: &str = "oauth-2025-04-20";
const USER_AGENT: &str = concat!("claude-status/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// TTL relaxation applied to disk entries when no token is resolvable.
const STALE_TTL_FACTOR: u32 = 10;

/// Cache key for a token: truncated SHA-256 so the raw secret never reaches
/// file names or logs.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..16].to_string()
}

struct MemEntry {
    data: UsageSnapshot,
    fetched_at: Instant,
}

/// On-disk mirror of a memory entry, `ts` in unix seconds.
#[derive(Serialize, Deserialize)]
struct DiskEntry {
    data: UsageSnapshot,
    ts: i64,
}

type InflightCell = Arc<OnceLock<Option<UsageSnapshot>>>;

pub struct UsageCache {
    tokens: Box<dyn TokenSource>,
    transport: Box<dyn UsageTransport>,
    cache_dir: PathBuf,
    mem: Mutex<HashMap<String, MemEntry>>,
    inflight: Mutex<HashMap<String, InflightCell>>,
    last_digest: Mutex<Option<String>>,
}

impl UsageCache {
    pub fn new(claude_dir: Option<PathBuf>) -> Self {
        UsageCache::with_parts(
            Box::new(CredentialResolver::new(claude_dir)),
            Box::new(HttpTransport),
            default_cache_dir(),
        )
    }

    /// Assemble a cache from explicit parts. Production wiring is
    /// [`UsageCache::new`]; tests substitute the token source and transport.
    pub fn with_parts(
        tokens: Box<dyn TokenSource>,
        transport: Box<dyn UsageTransport>,
        cache_dir: PathBuf,
    ) -> Self {
        UsageCache {
            tokens,
            transport,
            cache_dir,
            mem: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            last_digest: Mutex::new(None),
        }
    }

    /// Fetch usage data, serving from memory, then disk, then the network.
    /// Returns `None` only when every tier comes up empty; never errors.
    pub fn fetch_usage(&self, ttl: Duration) -> Option<UsageSnapshot> {
        let Some(token) = self.tokens.token() else {
            return self.serve_stale(ttl);
        };

        let digest = token_digest(&token);
        if let Ok(mut last) = self.last_digest.lock() {
            *last = Some(digest.clone());
        }

        if let Ok(mem) = self.mem.lock() {
            if let Some(entry) = mem.get(&digest) {
                if entry.fetched_at.elapsed() < ttl {
                    return Some(entry.data.clone());
                }
            }
        }

        if let Some(data) = self.load_disk(&digest, ttl) {
            self.store_mem(&digest, &data);
            return Some(data);
        }

        // At most one network fetch per digest: every caller waits on the
        // same cell, exactly one runs the transport.
        let cell: InflightCell = {
            let mut inflight = self.inflight.lock().ok()?;
            inflight
                .entry(digest.clone())
                .or_insert_with(|| Arc::new(OnceLock::new()))
                .clone()
        };
        let result = cell
            .get_or_init(|| self.fetch_and_store(&token, &digest))
            .clone();
        if let Ok(mut inflight) = self.inflight.lock() {
            if let Some(current) = inflight.get(&digest) {
                if Arc::ptr_eq(current, &cell) {
                    inflight.remove(&digest);
                }
            }
        }
        result
    }

    /// No token available: fall back to the last successful digest's cached
    /// data, memory first regardless of age, then disk with a relaxed TTL.
    fn serve_stale(&self, ttl: Duration) -> Option<UsageSnapshot> {
        let last = self.last_digest.lock().ok()?.clone()?;
        if let Ok(mem) = self.mem.lock() {
            if let Some(entry) = mem.get(&last) {
                return Some(entry.data.clone());
            }
        }
        self.load_disk(&last, ttl * STALE_TTL_FACTOR)
    }

    fn fetch_and_store(&self, token: &str, digest: &str) -> Option<UsageSnapshot> {
        let data = self.transport.fetch(token)?;
        self.store_mem(digest, &data);
        self.store_disk(digest, &data);
        Some(data)
    }

    fn store_mem(&self, digest: &str, data: &UsageSnapshot) {
        if let Ok(mut mem) = self.mem.lock() {
            mem.insert(
                digest.to_string(),
                MemEntry {
                    data: data.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
    }

    fn cache_file(&self, digest: &str) -> PathBuf {
        self.cache_dir.join(format!("usage-{digest}.json"))
    }

    fn load_disk(&self, digest: &str, ttl: Duration) -> Option<UsageSnapshot> {
        let raw = std::fs::read_to_string(self.cache_file(digest)).ok()?;
        let entry: DiskEntry = serde_json::from_str(&raw).ok()?;
        let age = Utc::now().timestamp().saturating_sub(entry.ts);
        if age >= 0 && (age as u64) < ttl.as_secs() {
            Some(entry.data)
        } else {
            None
        }
    }

    /// Best-effort disk mirror; failures degrade to memory-only caching.
    fn store_disk(&self, digest: &str, data: &UsageSnapshot) {
        let entry = DiskEntry {
            data: data.clone(),
            ts: Utc::now().timestamp(),
        };
        let Ok(json) = serde_json::to_string(&entry) else {
            return;
        };
        if ensure_private_dir(&self.cache_dir).is_err() {
            return;
        }
        let path = self.cache_file(digest);
        if std::fs::write(&path, json).is_ok() {
            restrict_file_mode(&path);
        }
    }
}

#[cfg(unix)]
fn ensure_private_dir(dir: &PathBuf) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
}

#[cfg(not(unix))]
fn ensure_private_dir(dir: &PathBuf) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

#[cfg(unix)]
fn restrict_file_mode(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
}

#[cfg(not(unix))]
fn restrict_file_mode(_path: &std::path::Path) {}

#[derive(Deserialize)]
struct UsageLimitDto {
    utilization: Option<f64>,
    resets_at: Option<String>,
}

#[derive(Deserialize)]
struct UsageResponseDto {
    #[serde(default)]
    five_hour: Option<UsageLimitDto>,
    #[serde(default)]
    seven_day: Option<UsageLimitDto>,
    #[serde(default)]
    seven_day_sonnet: Option<UsageLimitDto>,
}

fn window_from_dto(dto: Option<UsageLimitDto>) -> Option<UsageWindow> {
    let dto = dto?;
    let reset = dto
        .resets_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));
    Some(UsageWindow::from_utilization(
        dto.utilization.unwrap_or(0.0),
        reset,
    ))
}

impl From<UsageResponseDto> for UsageSnapshot {
    fn from(dto: UsageResponseDto) -> Self {
        UsageSnapshot {
            five_hour: window_from_dto(dto.five_hour),
            seven_day: window_from_dto(dto.seven_day),
            seven_day_sonnet: window_from_dto(dto.seven_day_sonnet),
        }
    }
}

/// Production transport: one bearer-authenticated GET with a hard timeout.
pub struct HttpTransport;

impl UsageTransport for HttpTransport {
    fn fetch(&self, token: &str) -> Option<UsageSnapshot> {
        let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
        let response = agent
            .get(USAGE_ENDPOINT)
            .set("Authorization", &format!("Bearer {token}"))
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/json")
            .set("anthropic-beta", ANTHROPIC_BETA)
            .call()
            .ok()?;
        if response.status() != 200 {
            return None;
        }
        let dto: UsageResponseDto = response.into_json().ok()?;
        Some(dto.into())
    }
}
