//! cpal microphone capture backend.
//!
//! The `cpal::Stream` is not `Send`, so all stream handling lives on a
//! dedicated `mic-capture` thread. The thread owns the stream, drains the
//! shared sample buffer once per timeslice into an encoded chunk, and
//! acknowledges shutdown only after the final drain. That acknowledgment is
//! what lets the session treat `stop()` as "all chunks delivered".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use voicenote_core::codec::wav;
use voicenote_core::models::config::CaptureConstraints;
use voicenote_core::models::device::InputDevice;
use voicenote_core::models::error::CaptureError;
use voicenote_core::models::format::EncodingFormat;
use voicenote_core::traits::capture_backend::{CaptureBackend, ChunkCallback};

use crate::devices;
use crate::dsp;
use crate::spectrum::{FftAnalysis, FFT_SIZE};
use crate::window::SampleWindow;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
const STOP_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Microphone capture via the system default input device.
///
/// Encodes 16-bit mono WAV chunks: the first chunk carries the RIFF header
/// with placeholder sizes, later chunks are raw PCM. Multi-channel input is
/// downmixed to mono and resampled to the requested rate.
pub struct CpalMicBackend {
    device_name: Option<String>,
    source_rate: u32,
    source_channels: u16,
    target_rate: u32,

    // Sample tap shared with the paired `FftAnalysis`.
    window: Arc<Mutex<SampleWindow>>,

    stop_flag: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    done_rx: Option<Receiver<()>>,
}

impl CpalMicBackend {
    /// Build a backend together with the analysis half it feeds.
    pub fn pair() -> (Self, FftAnalysis) {
        let window = Arc::new(Mutex::new(SampleWindow::new(FFT_SIZE)));
        let analysis = FftAnalysis::new(Arc::clone(&window));
        let backend = Self {
            device_name: None,
            source_rate: 0,
            source_channels: 1,
            target_rate: 0,
            window,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
            done_rx: None,
        };
        (backend, analysis)
    }
}

impl CaptureBackend for CpalMicBackend {
    fn is_available(&self) -> bool {
        cpal::default_host().input_devices().is_ok()
    }

    fn acquire(&mut self, constraints: &CaptureConstraints) -> Result<(), CaptureError> {
        let device = devices::default_input()?;
        let name = device
            .name()
            .unwrap_or_else(|_| "Default input".to_string());

        // Pick the f32 config whose rate range is nearest the request.
        let ranges = device
            .supported_input_configs()
            .map_err(map_configs_error)?;
        let mut best: Option<cpal::SupportedStreamConfigRange> = None;
        let mut best_diff = u32::MAX;
        for range in ranges {
            if range.sample_format() != cpal::SampleFormat::F32 {
                continue;
            }
            let min = range.min_sample_rate().0;
            let max = range.max_sample_rate().0;
            let diff = if constraints.sample_rate < min {
                min - constraints.sample_rate
            } else if constraints.sample_rate > max {
                constraints.sample_rate - max
            } else {
                0
            };
            if diff < best_diff {
                best_diff = diff;
                best = Some(range);
            }
        }
        let range = best.ok_or(CaptureError::UnsupportedEnvironment)?;
        let source_rate = constraints
            .sample_rate
            .clamp(range.min_sample_rate().0, range.max_sample_rate().0);

        // Echo cancellation, noise suppression, and AGC live in the OS
        // capture path; the request rides along for drivers that honor it.
        log::debug!(
            "acquired input '{}' at {} Hz ({} ch); ec={} ns={} agc={}",
            name,
            source_rate,
            range.channels(),
            constraints.echo_cancellation,
            constraints.noise_suppression,
            constraints.auto_gain_control
        );

        self.source_channels = range.channels();
        self.source_rate = source_rate;
        self.target_rate = constraints.sample_rate;
        self.device_name = Some(name);
        Ok(())
    }

    fn supports_format(&self, format: EncodingFormat) -> bool {
        matches!(format, EncodingFormat::Wav)
    }

    fn begin(
        &mut self,
        format: Option<EncodingFormat>,
        timeslice: Duration,
        sink: ChunkCallback,
    ) -> Result<EncodingFormat, CaptureError> {
        match format {
            Some(EncodingFormat::Wav) | None => {}
            Some(other) => {
                return Err(CaptureError::Encoding(format!(
                    "format not supported by this backend: {}",
                    other.mime_type()
                )))
            }
        }
        if self.worker.is_some() {
            return Err(CaptureError::Encoding("capture is already running".into()));
        }
        let device_name = self
            .device_name
            .clone()
            .ok_or_else(|| CaptureError::Encoding("microphone has not been acquired".into()))?;

        self.stop_flag.store(false, Ordering::SeqCst);
        let spec = WorkerSpec {
            device_name,
            source_rate: self.source_rate,
            source_channels: self.source_channels,
            target_rate: self.target_rate,
            timeslice,
        };
        let (ready_tx, ready_rx) = bounded(1);
        let (done_tx, done_rx) = bounded(1);
        let stop = Arc::clone(&self.stop_flag);
        let window = Arc::clone(&self.window);

        let handle = thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || capture_worker(spec, stop, window, sink, ready_tx, done_tx))
            .map_err(|e| CaptureError::Encoding(format!("failed to spawn capture thread: {}", e)))?;

        match ready_rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(Ok(())) => {
                self.worker = Some(handle);
                self.done_rx = Some(done_rx);
                Ok(EncodingFormat::Wav)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                // Leave a wedged startup detached rather than hang the caller.
                self.stop_flag.store(true, Ordering::SeqCst);
                drop(handle);
                Err(CaptureError::Encoding("capture thread did not start".into()))
            }
        }
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(done_rx) = self.done_rx.take() else {
            return Ok(()); // nothing running
        };
        self.stop_flag.store(true, Ordering::SeqCst);

        let acked = done_rx.recv_timeout(STOP_ACK_TIMEOUT).is_ok();
        match self.worker.take() {
            Some(handle) if acked => {
                let _ = handle.join();
                Ok(())
            }
            Some(handle) => {
                drop(handle);
                Err(CaptureError::Encoding(
                    "capture worker did not acknowledge stop".into(),
                ))
            }
            None => Ok(()),
        }
    }

    fn release(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.done_rx = None;
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.device_name = None;
        self.window.lock().clear();
    }

    fn device_info(&self) -> Option<InputDevice> {
        self.device_name.as_ref().map(|name| InputDevice {
            id: name.clone(),
            name: name.clone(),
            is_default: true,
        })
    }
}

struct WorkerSpec {
    device_name: String,
    source_rate: u32,
    source_channels: u16,
    target_rate: u32,
    timeslice: Duration,
}

/// Body of the `mic-capture` thread: own the stream, drain one chunk per
/// timeslice, flush the remainder after the stream is torn down, then ack.
fn capture_worker(
    spec: WorkerSpec,
    stop: Arc<AtomicBool>,
    window: Arc<Mutex<SampleWindow>>,
    sink: ChunkCallback,
    ready_tx: Sender<Result<(), CaptureError>>,
    done_tx: Sender<()>,
) {
    let buffer: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));

    let stream = match open_stream(&spec, Arc::clone(&buffer), window) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    let mut header_pending = true;
    loop {
        thread::sleep(spec.timeslice);
        let stopping = stop.load(Ordering::SeqCst);
        emit_slice(&buffer, &spec, &sink, &mut header_pending);
        if stopping {
            break;
        }
    }

    // Tear the stream down first so no sample can arrive after the final
    // drain, then deliver whatever is left and acknowledge.
    drop(stream);
    emit_slice(&buffer, &spec, &sink, &mut header_pending);
    let _ = done_tx.send(());
}

fn open_stream(
    spec: &WorkerSpec,
    buffer: Arc<Mutex<Vec<f32>>>,
    window: Arc<Mutex<SampleWindow>>,
) -> Result<cpal::Stream, CaptureError> {
    let device = devices::input_by_name(&spec.device_name)?;
    let config = cpal::StreamConfig {
        channels: spec.source_channels,
        sample_rate: cpal::SampleRate(spec.source_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let channels = spec.source_channels as usize;
    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono = dsp::downmix_to_mono(data, channels);
                window.lock().push(&mono);
                buffer.lock().extend_from_slice(&mono);
            },
            |err| log::warn!("input stream error: {}", err),
            None,
        )
        .map_err(map_build_error)?;

    stream
        .play()
        .map_err(|e| match e {
            cpal::PlayStreamError::DeviceNotAvailable => CaptureError::DeviceNotFound,
            cpal::PlayStreamError::BackendSpecific { err } => {
                CaptureError::Encoding(err.description)
            }
        })?;
    Ok(stream)
}

/// Drain the buffered samples into one encoded chunk and hand it to the sink.
/// The first chunk of a session is prefixed with the WAV header.
fn emit_slice(
    buffer: &Mutex<Vec<f32>>,
    spec: &WorkerSpec,
    sink: &ChunkCallback,
    header_pending: &mut bool,
) {
    let drained = std::mem::take(&mut *buffer.lock());
    if drained.is_empty() {
        return;
    }

    let resampled = dsp::resample_linear(&drained, spec.source_rate, spec.target_rate);
    let mut chunk = Vec::with_capacity(wav::HEADER_SIZE + resampled.len() * 2);
    if *header_pending {
        chunk.extend_from_slice(&wav::header(spec.target_rate, 16, 1, 0));
        *header_pending = false;
    }
    chunk.extend_from_slice(&dsp::to_pcm16(&resampled));
    sink(&chunk);
}

fn map_build_error(error: cpal::BuildStreamError) -> CaptureError {
    match error {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceNotFound,
        cpal::BuildStreamError::StreamConfigNotSupported => CaptureError::UnsupportedEnvironment,
        cpal::BuildStreamError::BackendSpecific { err } => {
            let description = err.description.to_lowercase();
            if description.contains("permission") || description.contains("access denied") {
                CaptureError::PermissionDenied
            } else {
                CaptureError::Encoding(err.description)
            }
        }
        other => CaptureError::Encoding(other.to_string()),
    }
}

fn map_configs_error(error: cpal::SupportedStreamConfigsError) -> CaptureError {
    match error {
        cpal::SupportedStreamConfigsError::DeviceNotAvailable => CaptureError::DeviceNotFound,
        _ => CaptureError::UnsupportedEnvironment,
    }
}
