//! # Credential Resolver
//!
//! Finds the Claude Code OAuth token. Lookup order: explicit environment
//! variables, the macOS Keychain (via `security`), then the per-user
//! `.credentials.json` file. Every failure collapses to `None`.

use std::path::PathBuf;
use std::sync::Mutex;
#[cfg(target_os = "macos")]
use std::time::{Duration, Instant};
use std::time::SystemTime;

use crate::models::UsageSnapshot;

/// Seam between the usage cache and wherever tokens come from.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Seam between the usage cache and the network.
pub trait UsageTransport: Send + Sync {
    fn fetch(&self, token: &str) -> Option<UsageSnapshot>;
}

#[cfg(target_os = "macos")]
const KEYCHAIN_TTL: Duration = Duration::from_secs(10);
#[cfg(target_os = "macos")]
const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";

/// Single cache slot: the keychain and file paths are mutually exclusive
/// fallbacks, so switching sources discards the other's cached value.
enum CachedCred {
    #[cfg(target_os = "macos")]
    Keychain {
        token: Option<String>,
        at: Instant,
    },
    File {
        token: Option<String>,
        mtime: SystemTime,
    },
}

pub struct CredentialResolver {
    credentials_path: PathBuf,
    slot: Mutex<Option<CachedCred>>,
}

impl CredentialResolver {
    pub fn new(claude_dir: Option<PathBuf>) -> Self {
        let dir = claude_dir.or_else(default_claude_dir);
        CredentialResolver {
            credentials_path: dir
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".credentials.json"),
            slot: Mutex::new(None),
        }
    }

    #[cfg(target_os = "macos")]
    fn from_platform(&self) -> Option<String> {
        self.from_keychain()
    }

    #[cfg(not(target_os = "macos"))]
    fn from_platform(&self) -> Option<String> {
        self.from_file()
    }

    #[cfg(target_os = "macos")]
    fn from_keychain(&self) -> Option<String> {
        if let Ok(slot) = self.slot.lock() {
            if let Some(CachedCred::Keychain { token, at }) = slot.as_ref() {
                if at.elapsed() < KEYCHAIN_TTL {
                    return token.clone();
                }
            }
        }

        let output = std::process::Command::new("security")
            .args(["find-generic-password", "-s", KEYCHAIN_SERVICE, "-w"])
            .output();
        match output {
            Ok(out) if out.status.success() => {
                let raw = String::from_utf8_lossy(&out.stdout);
                match parse_credentials(raw.trim()) {
                    // Parsed JSON without a token is a real miss worth
                    // caching; an unparseable payload is a source failure.
                    CredPayload::Parsed(token) => {
                        if let Ok(mut slot) = self.slot.lock() {
                            *slot = Some(CachedCred::Keychain {
                                token: token.clone(),
                                at: Instant::now(),
                            });
                        }
                        token
                    }
                    CredPayload::Invalid => self.from_file(),
                }
            }
            _ => self.from_file(),
        }
    }

    fn from_file(&self) -> Option<String> {
        let mtime = std::fs::metadata(&self.credentials_path)
            .and_then(|m| m.modified())
            .ok()?;

        if let Ok(slot) = self.slot.lock() {
            if let Some(CachedCred::File {
                token,
                mtime: cached,
            }) = slot.as_ref()
            {
                if *cached == mtime {
                    return token.clone();
                }
            }
        }

        let raw = std::fs::read_to_string(&self.credentials_path).ok()?;
        let CredPayload::Parsed(token) = parse_credentials(&raw) else {
            // Unparseable file: report no token but leave the slot alone so
            // a later valid read is not masked.
            return None;
        };
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(CachedCred::File {
                token: token.clone(),
                mtime,
            });
        }
        token
    }
}

impl TokenSource for CredentialResolver {
    fn token(&self) -> Option<String> {
        for key in ["CLAUDE_CODE_OAUTH_TOKEN", "ANTHROPIC_AUTH_TOKEN"] {
            if let Ok(val) = std::env::var(key) {
                let trimmed = val.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        self.from_platform()
    }
}

/// Outcome of reading a credentials JSON payload. `Invalid` means the source
/// itself failed and the next source should be tried; `Parsed(None)` means
/// the source answered but holds no token.
#[derive(Debug, PartialEq, Eq)]
enum CredPayload {
    Invalid,
    Parsed(Option<String>),
}

/// Pull `claudeAiOauth.accessToken` out of a credentials JSON payload.
fn parse_credentials(raw: &str) -> CredPayload {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(raw) else {
        return CredPayload::Invalid;
    };
    let token = json
        .get("claudeAiOauth")
        .and_then(|v| v.get("accessToken"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    CredPayload::Parsed(token)
}

fn default_claude_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".claude"))
}
