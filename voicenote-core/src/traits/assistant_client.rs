use thiserror::Error;

use crate::models::artifact::RecordingArtifact;
use crate::models::chat::PromptMessage;

/// Errors surfaced by an assistant provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("assistant API key is not configured")]
    Unconfigured,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("usage quota exceeded")]
    QuotaExceeded,

    #[error("assistant request failed: {0}")]
    Api(String),
}

/// Injectable abstraction over the third-party model provider.
///
/// All intelligence lives behind this seam: chat completion, speech
/// transcription, and speech synthesis are the provider's work. The crate
/// ships no concrete network client; applications plug in their provider SDK
/// and tests substitute fakes.
pub trait AssistantClient: Send + Sync {
    /// Generate the assistant's reply to a prompt.
    fn complete(&self, prompt: &[PromptMessage]) -> Result<String, ClientError>;

    /// Transcribe a finished voice note into text.
    fn transcribe(&self, recording: &RecordingArtifact) -> Result<String, ClientError>;

    /// Synthesize speech audio for the given text.
    fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, ClientError>;
}
