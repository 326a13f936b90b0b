//! # voicenote-cpal
//!
//! Cross-platform microphone backend for the voice-note capture kit.
//!
//! Provides:
//! - `CpalMicBackend` — microphone capture and chunked WAV encoding via cpal
//! - `FftAnalysis` — frequency-domain level analysis via rustfft
//! - `devices` — audio input device enumeration
//!
//! ## Usage
//! ```ignore
//! use voicenote_core::{RecorderConfig, RecorderSession};
//! use voicenote_cpal::CpalMicBackend;
//!
//! let (backend, analysis) = CpalMicBackend::pair();
//! let mut session = RecorderSession::new(
//!     backend,
//!     std::sync::Arc::new(analysis),
//!     RecorderConfig::default(),
//! )?;
//! session.start()?;
//! // ... user speaks; session.level() feeds the waveform UI ...
//! let artifact = session.stop()?;
//! ```

pub mod devices;
pub mod dsp;
pub mod mic;
pub mod spectrum;
pub mod window;

pub use mic::CpalMicBackend;
pub use spectrum::{FftAnalysis, BIN_COUNT, FFT_SIZE};
pub use window::SampleWindow;
