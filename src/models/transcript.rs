use serde::Deserialize;

/// One content block inside a transcript message. Every field is optional so
/// unexpected block shapes deserialize instead of poisoning the whole line.
#[derive(Deserialize, Debug)]
pub struct ContentBlock {
    pub r#type: Option<String>,
    pub id: Option<String>,
    pub tool_use_id: Option<String>,
    pub name: Option<String>,
    pub input: Option<serde_json::Value>,
}

/// Message content is an array of blocks for API turns, but plain text for
/// some user entries. Text carries no tool information.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum MessageContent {
    Blocks(Vec<ContentBlock>),
    Text(String),
}

impl MessageContent {
    pub fn blocks(&self) -> &[ContentBlock] {
        match self {
            MessageContent::Blocks(b) => b,
            MessageContent::Text(_) => &[],
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct MessageObj {
    #[serde(default)]
    pub content: Option<MessageContent>,
}

/// One parsed line of the transcript JSONL file.
#[derive(Deserialize, Debug)]
pub struct TranscriptEntry {
    pub r#type: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: Option<MessageObj>,
}
