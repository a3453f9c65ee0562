use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(version, about = "Status bar for Claude Code sessions")]
pub struct Args {
    /// Usage cache TTL in seconds
    #[arg(long, env = "CLAUDE_STATUS_TTL", default_value_t = 60)]
    pub ttl: u64,

    /// Skip the usage endpoint entirely (no rate-limit panels)
    #[arg(long, env = "CLAUDE_STATUS_OFFLINE")]
    pub offline: bool,

    /// Directory holding .credentials.json. Defaults to ~/.claude
    #[arg(long, env = "CLAUDE_STATUS_CLAUDE_DIR")]
    pub claude_dir: Option<PathBuf>,
}
