//! # voicenote-core
//!
//! Platform-agnostic core of the voice-note capture kit.
//!
//! Provides recorder session orchestration, live amplitude metering, WAV
//! container math, artifact storage, and the conversation/assistant layer.
//! Platform-specific audio backends (e.g. the cpal backend in
//! `voicenote-cpal`) implement the `CaptureBackend` and `AnalysisBackend`
//! traits and plug into the generic `RecorderSession`.
//!
//! ## Architecture
//!
//! ```text
//! voicenote-core (this crate)
//! ├── traits/    ← CaptureBackend, AnalysisBackend, RecorderDelegate, AssistantClient
//! ├── models/    ← CaptureError, RecorderState, RecordingArtifact, RecorderConfig, chat types
//! ├── session/   ← RecorderSession (generic orchestrator)
//! ├── metering/  ← amplitude level math
//! ├── codec/     ← WAV header generation and finalization
//! ├── storage/   ← ArtifactStore (recording files + JSON sidecars)
//! └── chat/      ← Conversation log, attachment staging
//! ```

pub mod chat;
pub mod codec;
pub mod metering;
pub mod models;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use chat::conversation::Conversation;
pub use models::artifact::{ArtifactMetadata, RecordingArtifact};
pub use models::chat::{Attachment, Message, MessageStatus, PromptMessage, Role};
pub use models::config::{CaptureConstraints, RecorderConfig};
pub use models::device::InputDevice;
pub use models::error::CaptureError;
pub use models::format::EncodingFormat;
pub use models::state::RecorderState;
pub use session::recorder::RecorderSession;
pub use storage::artifact_store::ArtifactStore;
pub use traits::analysis_backend::AnalysisBackend;
pub use traits::assistant_client::{AssistantClient, ClientError};
pub use traits::capture_backend::{CaptureBackend, ChunkCallback};
pub use traits::recorder_delegate::RecorderDelegate;
