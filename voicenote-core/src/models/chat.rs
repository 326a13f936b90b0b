use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Delivery status of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    Sent,
    Error,
}

/// A staged file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub path: PathBuf,

    /// Extracted content for text-like files, inlined into the prompt.
    pub text: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    pub status: MessageStatus,
    pub attachments: Vec<Attachment>,

    /// Playback location of the voice note this message was transcribed from.
    pub audio_path: Option<PathBuf>,
}

impl Message {
    pub(crate) fn new(role: Role, content: impl Into<String>, status: MessageStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            status,
            attachments: Vec::new(),
            audio_path: None,
        }
    }
}

/// Role of a prompt message sent to the assistant provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// One part of a multi-part prompt message.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    /// Reference to an image the provider should look at.
    Image { locator: String },
}

/// Content of a prompt message: plain text, or parts when images are present.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptContent {
    Text(String),
    Parts(Vec<PromptPart>),
}

/// Provider-facing rendition of one conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: PromptContent,
}
