//! FFT frequency analysis over the live capture stream.
//!
//! Produces the fixed-size byte window the core's level meter consumes:
//! a Hann-windowed 256-point forward FFT over the most recent samples,
//! magnitudes normalized into 0–255 per bin.

use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use voicenote_core::models::error::CaptureError;
use voicenote_core::traits::analysis_backend::AnalysisBackend;

use crate::window::SampleWindow;

/// FFT window size in samples.
pub const FFT_SIZE: usize = 256;

/// Number of frequency bins exposed per window (up to Nyquist).
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// `AnalysisBackend` implementation fed by the cpal capture callback.
///
/// Shares a [`SampleWindow`] with its paired `CpalMicBackend`; reads never
/// consume samples, so analysis cannot starve encoding.
pub struct FftAnalysis {
    window: Arc<Mutex<SampleWindow>>,
    fft: Arc<dyn Fft<f32>>,
    hann: Vec<f32>,
    attached: AtomicBool,
}

impl FftAnalysis {
    pub(crate) fn new(window: Arc<Mutex<SampleWindow>>) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        // Hann window to reduce spectral leakage.
        let hann = (0..FFT_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / FFT_SIZE as f32).cos()))
            .collect();

        Self {
            window,
            fft,
            hann,
            attached: AtomicBool::new(false),
        }
    }
}

impl AnalysisBackend for FftAnalysis {
    fn attach(&self) -> Result<(), CaptureError> {
        self.window.lock().clear();
        self.attached.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
        self.window.lock().clear();
    }

    fn bin_count(&self) -> usize {
        BIN_COUNT
    }

    fn frequency_window(&self) -> Vec<u8> {
        if !self.attached.load(Ordering::SeqCst) {
            return vec![0; BIN_COUNT];
        }

        let snapshot = self.window.lock().snapshot();
        let mut buf: Vec<Complex<f32>> = snapshot
            .iter()
            .zip(self.hann.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        self.fft.process(&mut buf);

        // A full-scale sine lands at magnitude FFT_SIZE/4 after the Hann
        // window's coherent gain of 0.5, which maps to 255 here.
        let scale = FFT_SIZE as f32 / 4.0;
        buf[..BIN_COUNT]
            .iter()
            .map(|c| ((c.norm() / scale).clamp(0.0, 1.0) * 255.0) as u8)
            .collect()
    }
}
