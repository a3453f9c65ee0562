pub mod hook;
pub mod transcript;
pub mod usage;

pub use hook::{ContextWindow, CurrentUsage, HookJson};
pub use transcript::{ContentBlock, TranscriptEntry};
pub use usage::{UsageSnapshot, UsageWindow};
