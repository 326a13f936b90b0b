use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::metering::level;
use crate::models::artifact::RecordingArtifact;
use crate::models::config::RecorderConfig;
use crate::models::device::InputDevice;
use crate::models::error::CaptureError;
use crate::models::format::EncodingFormat;
use crate::models::state::RecorderState;
use crate::storage::artifact_store::ArtifactStore;
use crate::traits::analysis_backend::AnalysisBackend;
use crate::traits::capture_backend::{CaptureBackend, ChunkCallback};
use crate::traits::recorder_delegate::RecorderDelegate;

/// Internal mutable session state, shared with the chunk sink and the
/// level-meter thread.
struct SessionShared {
    state: RecorderState,
    level: f32,
    chunks: Vec<Vec<u8>>,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            level: 0.0,
            chunks: Vec::new(),
        }
    }
}

/// Microphone recording session orchestrator.
///
/// Generic over a capture backend and a frequency-analysis backend. Owns the
/// session lifecycle: acquisition, chunk buffering, live amplitude metering,
/// and finalization into a persisted [`RecordingArtifact`].
///
/// ```text
/// [CaptureBackend] ──chunks──▶ [chunk buffer] ──stop──▶ [payload] ─▶ [ArtifactStore]
/// [AnalysisBackend] ◀─reads── [level-meter thread] ──▶ level ∈ [0, 1]
/// ```
///
/// One session may be active per instance; `start()` while active fails with
/// `AlreadyRecording`. Every exit path (`stop()`, `cancel()`, internal error)
/// releases all held resources: microphone, analyser, metering thread.
pub struct RecorderSession<B: CaptureBackend, A: AnalysisBackend + 'static> {
    backend: B,
    analysis: Arc<A>,
    config: RecorderConfig,
    store: ArtifactStore,
    shared: Arc<Mutex<SessionShared>>,
    delegate: Option<Arc<dyn RecorderDelegate>>,

    // Level-meter thread control
    level_running: Arc<AtomicBool>,
    level_handle: Option<thread::JoinHandle<()>>,

    active_format: Option<EncodingFormat>,
}

impl<B: CaptureBackend, A: AnalysisBackend + 'static> RecorderSession<B, A> {
    pub fn new(backend: B, analysis: Arc<A>, config: RecorderConfig) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::InvalidConfig)?;
        let store = ArtifactStore::new(config.output_directory.clone());
        Ok(Self {
            backend,
            analysis,
            config,
            store,
            shared: Arc::new(Mutex::new(SessionShared::new())),
            delegate: None,
            level_running: Arc::new(AtomicBool::new(false)),
            level_handle: None,
            active_format: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> RecorderState {
        self.shared.lock().state
    }

    pub fn is_recording(&self) -> bool {
        self.state().is_recording()
    }

    /// Current amplitude level in `[0, 1]`; 0.0 while idle.
    pub fn level(&self) -> f32 {
        self.shared.lock().level
    }

    /// Number of chunks buffered in the current session.
    pub fn chunk_count(&self) -> usize {
        self.shared.lock().chunks.len()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// The input device in use, once the microphone has been acquired.
    pub fn input_device(&self) -> Option<InputDevice> {
        self.backend.device_info()
    }

    /// Acquire the microphone and begin a recording session.
    ///
    /// Fails with `AlreadyRecording` while a session is active, leaving it
    /// untouched. Acquisition failures (`PermissionDenied`, `DeviceNotFound`,
    /// `UnsupportedEnvironment`) leave the session idle with nothing held.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        {
            let s = self.shared.lock();
            if !s.state.is_idle() {
                return Err(CaptureError::AlreadyRecording);
            }
        }

        if !self.backend.is_available() {
            return Err(CaptureError::UnsupportedEnvironment);
        }

        self.backend.acquire(&self.config.constraints)?;

        if let Err(e) = self.analysis.attach() {
            self.backend.release();
            return Err(e);
        }

        // Walk the preference chain; None lets the backend pick its default.
        let preferred = self
            .config
            .preferred_formats
            .iter()
            .copied()
            .find(|f| self.backend.supports_format(*f));

        // The sink must be live before the backend starts delivering, and the
        // state must accept chunks both while recording and while draining.
        {
            let mut s = self.shared.lock();
            s.chunks.clear();
            s.level = 0.0;
            s.state = RecorderState::Recording { chunk_count: 0 };
        }

        let shared = Arc::clone(&self.shared);
        let delegate = self.delegate.clone();
        let sink: ChunkCallback = Arc::new(move |data: &[u8]| {
            if data.is_empty() {
                return;
            }
            let count = {
                let mut s = shared.lock();
                if !s.state.is_active() {
                    return;
                }
                s.chunks.push(data.to_vec());
                let count = s.chunks.len();
                if s.state.is_recording() {
                    s.state = RecorderState::Recording { chunk_count: count };
                }
                count
            };
            if let Some(ref d) = delegate {
                d.on_chunk_buffered(count);
            }
        });

        match self
            .backend
            .begin(preferred, self.config.chunk_interval, sink)
        {
            Ok(format) => self.active_format = Some(format),
            Err(e) => {
                {
                    let mut s = self.shared.lock();
                    s.state = RecorderState::Idle;
                    s.chunks.clear();
                }
                self.analysis.detach();
                self.backend.release();
                return Err(e);
            }
        }

        self.spawn_level_loop();
        self.notify_state(RecorderState::Recording { chunk_count: 0 });
        log::debug!("recording started ({:?})", self.active_format);
        Ok(())
    }

    /// Finalize the session into an artifact.
    ///
    /// Blocks until the backend has flushed its final chunk, so no chunk is
    /// lost or duplicated. On both success and failure the session ends idle
    /// with all resources released.
    pub fn stop(&mut self) -> Result<RecordingArtifact, CaptureError> {
        {
            let mut s = self.shared.lock();
            if !s.state.is_recording() {
                return Err(CaptureError::NoActiveSession);
            }
            s.state = RecorderState::Stopping;
        }
        self.notify_state(RecorderState::Stopping);

        // The sink keeps accepting chunks in the stopping state; the backend
        // acknowledges only after the final one has been delivered.
        let drained = self.backend.stop();

        self.halt_level_loop();
        self.analysis.detach();
        self.backend.release();

        let chunks = {
            let mut s = self.shared.lock();
            let chunks = std::mem::take(&mut s.chunks);
            s.level = 0.0;
            s.state = RecorderState::Idle;
            chunks
        };
        self.notify_state(RecorderState::Idle);

        let format = self.active_format.take();
        drained?;
        let format =
            format.ok_or_else(|| CaptureError::Encoding("no encoding format negotiated".into()))?;

        let chunk_count = chunks.len();
        let mut payload = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
        for chunk in &chunks {
            payload.extend_from_slice(chunk);
        }
        format.finalize(&mut payload);

        let duration_secs = chunk_count as f64 * self.config.chunk_interval.as_secs_f64();
        let artifact = self.store.persist(payload, format, duration_secs)?;

        log::debug!(
            "recording finished: {} chunks, {:.1}s, {}",
            chunk_count,
            duration_secs,
            artifact.path.display()
        );

        if let Some(ref d) = self.delegate {
            d.on_finished(&artifact);
        }
        Ok(artifact)
    }

    /// Discard the session without producing an artifact.
    ///
    /// Releases the same resource set as `stop()`. No-op while idle; never
    /// fails (backend stop errors are logged and swallowed).
    pub fn cancel(&mut self) {
        {
            let mut s = self.shared.lock();
            if s.state.is_idle() {
                return;
            }
            s.state = RecorderState::Stopping;
        }

        if let Err(e) = self.backend.stop() {
            log::warn!("capture backend failed to stop during cancel: {}", e);
        }
        self.halt_level_loop();
        self.analysis.detach();
        self.backend.release();
        self.active_format = None;

        {
            let mut s = self.shared.lock();
            s.chunks.clear();
            s.level = 0.0;
            s.state = RecorderState::Idle;
        }
        self.notify_state(RecorderState::Idle);
        log::debug!("recording cancelled");
    }

    // --- Internal helpers ---

    fn notify_state(&self, state: RecorderState) {
        if let Some(ref d) = self.delegate {
            d.on_state_changed(&state);
        }
    }

    /// Start the amplitude-sampling loop: one reading per tick, RMS over the
    /// analyser's frequency window, published for UI consumption.
    fn spawn_level_loop(&mut self) {
        self.level_running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.level_running);
        let shared = Arc::clone(&self.shared);
        let analysis = Arc::clone(&self.analysis);
        let delegate = self.delegate.clone();
        let tick = self.config.level_interval;

        let handle = thread::Builder::new()
            .name("level-meter".into())
            .spawn(move || loop {
                thread::sleep(tick);
                // Re-checked every iteration so the loop can never touch the
                // analyser once teardown has begun.
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let window = analysis.frequency_window();
                let reading = level::rms_level(&window);
                {
                    let mut s = shared.lock();
                    if !s.state.is_recording() {
                        continue;
                    }
                    s.level = reading;
                }
                if let Some(ref d) = delegate {
                    d.on_level(reading);
                }
            })
            .expect("failed to spawn level-meter thread");

        self.level_handle = Some(handle);
    }

    fn halt_level_loop(&mut self) {
        self.level_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.level_handle.take() {
            let _ = handle.join();
        }
    }
}

impl<B: CaptureBackend, A: AnalysisBackend + 'static> Drop for RecorderSession<B, A> {
    fn drop(&mut self) {
        self.cancel();
    }
}
