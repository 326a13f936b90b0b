use crate::models::artifact::RecordingArtifact;
use crate::models::state::RecorderState;

/// Event delegate for recorder session notifications.
///
/// All methods are called from background threads, not the caller's thread.
/// Implementations should marshal to a UI thread if needed and return
/// quickly.
pub trait RecorderDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &RecorderState);

    /// Called on every amplitude-sampling tick with the current level in
    /// `[0, 1]`.
    fn on_level(&self, level: f32);

    /// Called when a chunk has been buffered, with the running count.
    fn on_chunk_buffered(&self, count: usize);

    /// Called when a recording has been finalized and persisted.
    fn on_finished(&self, artifact: &RecordingArtifact);
}
