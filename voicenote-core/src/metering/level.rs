//! Amplitude metering over analyser windows.
//!
//! The UI consumes a single scalar per tick; it is computed as the
//! root-mean-square energy of the current frequency-domain byte window,
//! normalized into `[0, 1]`.

/// RMS energy of a frequency-domain byte window, normalized to `[0, 1]`.
///
/// An empty or all-zero window yields 0.0; a saturated window (all bins at
/// 255) yields 1.0. The result is clamped, so any input stays in range.
pub fn rms_level(window: &[u8]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = window
        .iter()
        .map(|&bin| {
            let v = bin as f32 / 255.0;
            v * v
        })
        .sum();
    (sum_sq / window.len() as f32).sqrt().clamp(0.0, 1.0)
}
