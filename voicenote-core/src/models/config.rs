use std::path::PathBuf;
use std::time::Duration;

use super::format::EncodingFormat;

/// Input-processing constraints requested from the capture backend.
///
/// Backends honor what their platform exposes; the processing toggles are
/// requests, not guarantees (echo cancellation and friends usually live in
/// the OS capture path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConstraints {
    /// Target sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Number of capture channels (default: 1).
    pub channels: u16,

    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Configuration for a recorder session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    pub constraints: CaptureConstraints,

    /// Encoding formats to try, most preferred first. An empty list (or a
    /// list the backend supports none of) falls through to the backend's own
    /// default; format preference never fails a capture.
    pub preferred_formats: Vec<EncodingFormat>,

    /// Cadence of buffered-chunk delivery (default: 100 ms). Also the unit of
    /// the artifact's approximate duration: `chunk_count × chunk_interval`.
    pub chunk_interval: Duration,

    /// Cadence of the amplitude-sampling loop (default: 16 ms, one reading
    /// per rendering frame at 60 Hz).
    pub level_interval: Duration,

    /// Directory where finished recordings are written.
    pub output_directory: PathBuf,
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.constraints.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![1, 2].contains(&self.constraints.channels) {
            return Err(format!(
                "unsupported channel count: {}",
                self.constraints.channels
            ));
        }
        if self.chunk_interval.is_zero() {
            return Err("chunk interval must be positive".into());
        }
        if self.level_interval.is_zero() {
            return Err("level interval must be positive".into());
        }
        Ok(())
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            constraints: CaptureConstraints::default(),
            preferred_formats: EncodingFormat::default_preference(),
            chunk_interval: Duration::from_millis(100),
            level_interval: Duration::from_millis(16),
            output_directory: PathBuf::from("."),
        }
    }
}
