use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::format::EncodingFormat;

/// Immutable result of a completed recording session.
///
/// `duration_secs` is derived from the number of buffered chunks times the
/// nominal chunk interval, not from wall-clock time. If the delivery cadence
/// drifts, the reported duration diverges from the true recording length; the
/// value is an approximation, accurate to within one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingArtifact {
    pub id: String,

    /// Full encoded payload (concatenation of the buffered chunks, with the
    /// container finalized).
    pub payload: Vec<u8>,

    /// Filesystem location of the persisted recording, usable for playback.
    pub path: PathBuf,

    pub format: EncodingFormat,
    pub duration_secs: f64,

    /// SHA-256 hex digest of the persisted payload.
    pub checksum: String,

    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl RecordingArtifact {
    pub fn metadata(&self) -> ArtifactMetadata {
        ArtifactMetadata {
            id: self.id.clone(),
            mime_type: self.format.mime_type().to_string(),
            duration_secs: self.duration_secs,
            byte_len: self.payload.len() as u64,
            checksum: self.checksum.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// Serializable subset of an artifact, stored as a JSON sidecar next to the
/// recording file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub mime_type: String,
    pub duration_secs: f64,
    pub byte_len: u64,
    pub checksum: String,
    pub created_at: String,
}
