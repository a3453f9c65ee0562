use serde::Deserialize;

/// Model identity as reported by Claude Code's statusLine hook.
#[derive(Deserialize, Debug, Default)]
pub struct HookModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct HookWorkspace {
    #[serde(default)]
    pub current_dir: Option<String>,
}

/// Per-request token counts for the latest API turn.
#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct CurrentUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

#[derive(Deserialize, Debug, Default)]
pub struct ContextWindow {
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
    #[serde(default)]
    pub context_window_size: Option<u64>,
    #[serde(default)]
    pub current_usage: Option<CurrentUsage>,
}

/// Aggregate cost fields from Claude Code.
#[derive(Deserialize, Debug, Default)]
pub struct HookCost {
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
}

/// Session snapshot supplied on stdin by Claude Code's statusLine hook.
///
/// Every field is optional: a bare `{}` must deserialize and render with
/// placeholder values rather than fail.
#[derive(Deserialize, Debug, Default)]
pub struct HookJson {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub model: Option<HookModel>,
    #[serde(default)]
    pub workspace: Option<HookWorkspace>,
    #[serde(default)]
    pub context_window: Option<ContextWindow>,
    #[serde(default)]
    pub cost: Option<HookCost>,
}
