use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::artifact::RecordingArtifact;
use crate::models::error::CaptureError;
use crate::models::format::EncodingFormat;

/// Persists finalized recordings into an output directory.
///
/// Each recording gets a `recording_<uuid>.<ext>` file plus a
/// `.metadata.json` sidecar, and its SHA-256 checksum is computed over the
/// bytes actually written.
pub struct ArtifactStore {
    directory: PathBuf,
}

impl ArtifactStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write `payload` out and build the artifact describing it.
    pub fn persist(
        &self,
        payload: Vec<u8>,
        format: EncodingFormat,
        duration_secs: f64,
    ) -> Result<RecordingArtifact, CaptureError> {
        fs::create_dir_all(&self.directory).map_err(|e| {
            CaptureError::Encoding(format!("failed to create output directory: {}", e))
        })?;

        let id = uuid::Uuid::new_v4().to_string();
        let path = self
            .directory
            .join(format!("recording_{}.{}", id, format.extension()));

        fs::write(&path, &payload)
            .map_err(|e| CaptureError::Encoding(format!("failed to write recording: {}", e)))?;

        let checksum = hex_digest(&payload);

        let artifact = RecordingArtifact {
            id,
            payload,
            path: path.clone(),
            format,
            duration_secs,
            checksum,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        write_sidecar(&artifact, &path)?;
        Ok(artifact)
    }
}

/// Write the artifact's metadata as a JSON sidecar next to the recording.
fn write_sidecar(artifact: &RecordingArtifact, recording_path: &Path) -> Result<(), CaptureError> {
    let sidecar_path = recording_path.with_extension("metadata.json");
    let json = serde_json::to_string_pretty(&artifact.metadata())
        .map_err(|e| CaptureError::Encoding(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&sidecar_path, json)
        .map_err(|e| CaptureError::Encoding(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read a recording's metadata sidecar back.
pub fn read_sidecar(
    recording_path: &Path,
) -> Result<crate::models::artifact::ArtifactMetadata, CaptureError> {
    let sidecar_path = recording_path.with_extension("metadata.json");
    let json = fs::read_to_string(&sidecar_path)
        .map_err(|e| CaptureError::Encoding(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| CaptureError::Encoding(format!("failed to parse metadata: {}", e)))
}

fn hex_digest(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_writes_payload_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let payload = vec![7u8; 320];
        let artifact = store
            .persist(payload.clone(), EncodingFormat::Wav, 0.5)
            .unwrap();

        assert_eq!(fs::read(&artifact.path).unwrap(), payload);
        assert!(artifact.path.extension().is_some_and(|e| e == "wav"));
        assert_eq!(artifact.duration_secs, 0.5);

        let meta = read_sidecar(&artifact.path).unwrap();
        assert_eq!(meta.id, artifact.id);
        assert_eq!(meta.byte_len, 320);
        assert_eq!(meta.mime_type, "audio/wav");
        assert_eq!(meta.checksum, artifact.checksum);
    }

    #[test]
    fn checksum_matches_recomputation() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let artifact = store
            .persist(b"abc".to_vec(), EncodingFormat::OggOpus, 0.1)
            .unwrap();

        assert_eq!(artifact.checksum, hex_digest(b"abc"));
        // Known SHA-256 of "abc".
        assert_eq!(
            artifact.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn persist_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("voice").join("notes");
        let store = ArtifactStore::new(&nested);

        let artifact = store.persist(vec![1, 2, 3], EncodingFormat::Wav, 0.1).unwrap();
        assert!(artifact.path.starts_with(&nested));
        assert!(artifact.path.exists());
    }
}
