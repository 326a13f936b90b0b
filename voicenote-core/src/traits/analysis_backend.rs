use crate::models::error::CaptureError;

/// Interface for live frequency-domain analysis of the capture stream.
///
/// The session only ever reads a fixed-size byte window on demand; how the
/// window is produced (FFT over a sample tap, a platform analyser node) is
/// the backend's business. Methods take `&self`; implementations use
/// interior mutability so the window can be read from the level-meter thread.
pub trait AnalysisBackend: Send + Sync {
    /// Bind the analyser to the live capture stream.
    fn attach(&self) -> Result<(), CaptureError>;

    /// Unbind and drop analysis resources. Idempotent.
    fn detach(&self);

    /// Number of frequency bins in a window.
    fn bin_count(&self) -> usize;

    /// Current frequency-domain sample window, one byte per bin (0–255).
    ///
    /// Returns an all-zero window while detached.
    fn frequency_window(&self) -> Vec<u8>;
}
