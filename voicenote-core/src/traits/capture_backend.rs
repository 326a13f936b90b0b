use std::sync::Arc;
use std::time::Duration;

use crate::models::config::CaptureConstraints;
use crate::models::device::InputDevice;
use crate::models::error::CaptureError;
use crate::models::format::EncodingFormat;

/// Callback invoked whenever the backend has a buffered chunk of encoded
/// audio ready.
///
/// Fires on a backend-owned thread at roughly the configured timeslice
/// cadence. Implementations must only append to in-memory state and must not
/// block.
pub type ChunkCallback = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Interface for platform-specific microphone capture and chunked encoding.
///
/// Implemented by `CpalMicBackend` in the `voicenote-cpal` crate; tests use
/// in-memory fakes.
///
/// Lifecycle: `acquire` → `begin` → (chunks delivered) → `stop` → `release`.
/// `stop` and `release` are idempotent; releasing an already-released backend
/// must not fail.
pub trait CaptureBackend: Send + Sync {
    /// Whether capture is possible at all in this environment.
    fn is_available(&self) -> bool;

    /// Request microphone access with the given constraints.
    ///
    /// Fails with `PermissionDenied` when access is refused,
    /// `DeviceNotFound` when no input device exists, and
    /// `UnsupportedEnvironment` when the platform cannot capture. A failed
    /// acquire must leave nothing held.
    fn acquire(&mut self, constraints: &CaptureConstraints) -> Result<(), CaptureError>;

    /// Whether this backend can encode into `format`.
    fn supports_format(&self, format: EncodingFormat) -> bool;

    /// Start buffered encoding, delivering one chunk per `timeslice` via
    /// `sink`. `format: None` lets the backend pick its own default.
    ///
    /// Returns the format actually in effect.
    fn begin(
        &mut self,
        format: Option<EncodingFormat>,
        timeslice: Duration,
        sink: ChunkCallback,
    ) -> Result<EncodingFormat, CaptureError>;

    /// Stop encoding. Returns only after the final buffered chunk has been
    /// delivered through the sink, so callers may assemble the payload as
    /// soon as this returns.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Release the microphone and any analysis taps. Safe to call in any
    /// state, any number of times.
    fn release(&mut self);

    /// The input device backing this capture, once acquired.
    fn device_info(&self) -> Option<InputDevice>;
}
