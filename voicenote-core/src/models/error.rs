use thiserror::Error;

/// Errors that can occur during voice-note capture.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no audio input device found")]
    DeviceNotFound,

    #[error("audio capture is not supported in this environment")]
    UnsupportedEnvironment,

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no active recording session")]
    NoActiveSession,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("encoding failed: {0}")]
    Encoding(String),
}
