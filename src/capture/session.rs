use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};

use crate::capture::decoder::{DecodeAdapter, FrameDecoder, Symbology};
use crate::capture::device::{CameraDevice, FacingMode, FrameBuffer, VideoTrack};
use crate::config;
use crate::error::{FoodGradeError, Result};
use crate::identifier::Identifier;
use crate::timing::Sleeper;

pub const NO_BARCODE_MESSAGE: &str = "No barcode found. Please try manual input.";
pub const CAMERA_UNAVAILABLE_MESSAGE: &str = "Unable to access camera. Please check permissions.";
pub const NO_FRAMES_MESSAGE: &str = "Camera is not producing frames. Please try manual input.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Active,
    Succeeded,
    Failed,
    /// Stopped explicitly while active.
    Stopped,
}

impl CaptureState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CaptureState::Succeeded | CaptureState::Failed | CaptureState::Stopped
        )
    }
}

/// Terminal outcome of a session. At most one is emitted per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    Acquired(Identifier),
    /// Attempt budget spent without a decode, or the stream never produced a
    /// sized frame. Retryable with a new session or through manual entry.
    Exhausted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Illumination {
    Unsupported,
    On,
    Off,
}

/// The periodic sampling timer. Cancelling disarms it for good.
#[derive(Debug, Clone, Copy)]
struct SamplingTimer {
    interval: Duration,
    armed: bool,
}

impl SamplingTimer {
    fn arm(&mut self) {
        self.armed = true;
    }

    fn cancel(&mut self) {
        self.armed = false;
    }
}

type Listener = Box<dyn FnMut(&CaptureEvent)>;

/// Single-use camera sampling session.
///
/// `Idle -> Active -> {Succeeded | Failed | Stopped}`. The video track is
/// held only while `Active`; every transition out of `Active`, and dropping
/// the session, releases it.
pub struct CaptureSession {
    device: Box<dyn CameraDevice>,
    decoder: DecodeAdapter,
    state: CaptureState,
    facing: FacingMode,
    resolution: (u32, u32),
    timer: SamplingTimer,
    attempts: u32,
    max_attempts: u32,
    unsized_ticks: u32,
    max_unsized_ticks: u32,
    track: Option<Box<dyn VideoTrack>>,
    torch_supported: bool,
    torch_on: bool,
    buffer: FrameBuffer,
    outcome: Option<CaptureEvent>,
    listener: Option<Listener>,
}

impl CaptureSession {
    pub fn new(device: Box<dyn CameraDevice>, decoder: Box<dyn FrameDecoder>) -> Self {
        Self {
            device,
            decoder: DecodeAdapter::new(decoder, Symbology::Ean13),
            state: CaptureState::Idle,
            facing: FacingMode::Environment,
            resolution: config::TARGET_RESOLUTION,
            timer: SamplingTimer {
                interval: config::SCAN_INTERVAL,
                armed: false,
            },
            attempts: 0,
            max_attempts: config::MAX_SCAN_ATTEMPTS,
            unsized_ticks: 0,
            max_unsized_ticks: config::MAX_UNSIZED_TICKS,
            track: None,
            torch_supported: false,
            torch_on: false,
            buffer: FrameBuffer::default(),
            outcome: None,
            listener: None,
        }
    }

    pub fn facing(mut self, facing: FacingMode) -> Self {
        self.facing = facing;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.timer.interval = interval;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// How many ticks without a sized frame are tolerated before the
    /// session ends with [`NO_FRAMES_MESSAGE`].
    pub fn max_unsized_ticks(mut self, max_unsized_ticks: u32) -> Self {
        self.max_unsized_ticks = max_unsized_ticks.max(1);
        self
    }

    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = (width, height);
        self
    }

    /// Called once with the terminal event, if one is ever emitted.
    pub fn on_event(mut self, listener: impl FnMut(&CaptureEvent) + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    // -- Accessors -----------------------------------------------------------

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn current_facing(&self) -> FacingMode {
        self.facing
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn unsized_ticks(&self) -> u32 {
        self.unsized_ticks
    }

    pub fn torch_supported(&self) -> bool {
        self.torch_supported
    }

    pub fn outcome(&self) -> Option<&CaptureEvent> {
        self.outcome.as_ref()
    }

    pub fn holds_device(&self) -> bool {
        self.track.is_some()
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.armed
    }

    // -- Transitions ---------------------------------------------------------

    /// Acquire the camera and arm the sampling timer.
    ///
    /// Only valid from `Idle`; any other state is
    /// [`FoodGradeError::InvalidState`]. Fails with
    /// [`FoodGradeError::DeviceUnavailable`] if the camera cannot be opened,
    /// leaving the session `Failed`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != CaptureState::Idle {
            return Err(FoodGradeError::InvalidState(format!(
                "capture session already {}",
                self.state
            )));
        }
        let track = match self.device.open(self.facing, self.resolution) {
            Ok(track) => track,
            Err(e) => {
                warn!("Camera access error: {e}");
                self.state = CaptureState::Failed;
                return Err(match e {
                    FoodGradeError::DeviceUnavailable(msg) => {
                        FoodGradeError::DeviceUnavailable(msg)
                    }
                    other => FoodGradeError::DeviceUnavailable(other.to_string()),
                });
            }
        };
        self.torch_supported = track.supports_torch();
        self.torch_on = false;
        self.track = Some(track);
        self.attempts = 0;
        self.unsized_ticks = 0;
        self.state = CaptureState::Active;
        self.timer.arm();
        info!(
            "Capture started ({} camera, torch {})",
            self.facing,
            if self.torch_supported { "available" } else { "unavailable" }
        );
        Ok(())
    }

    /// One timer tick: sample a frame and try to decode it.
    ///
    /// Returns the terminal event on the tick that produces it and `None`
    /// otherwise, including every tick after the timer was cancelled.
    /// Ticks while the stream reports no frame size do not count as attempts,
    /// but after `max_unsized_ticks` of them the session fails anyway.
    pub fn tick(&mut self) -> Option<CaptureEvent> {
        if !self.timer.armed || self.state != CaptureState::Active {
            return None;
        }
        let track = self.track.as_mut()?;
        let (width, height) = track.dimensions();
        if width == 0 || height == 0 {
            self.unsized_ticks += 1;
            if self.unsized_ticks >= self.max_unsized_ticks {
                warn!("No frames after {} ticks; giving up", self.unsized_ticks);
                return Some(self.finish(
                    CaptureState::Failed,
                    CaptureEvent::Exhausted(NO_FRAMES_MESSAGE.to_string()),
                ));
            }
            return None;
        }

        self.buffer.resize(width, height);
        let decoded = match track.read_frame(&mut self.buffer) {
            Ok(()) => self.decoder.decode(&self.buffer.pixels, width, height),
            Err(e) => {
                warn!("Frame capture failed: {e}");
                None
            }
        };

        if let Some(id) = decoded {
            info!("Barcode acquired: {id}");
            return Some(self.finish(CaptureState::Succeeded, CaptureEvent::Acquired(id)));
        }

        self.attempts += 1;
        debug!("No barcode in frame ({}/{})", self.attempts, self.max_attempts);
        if self.attempts >= self.max_attempts {
            info!("Capture exhausted after {} attempts", self.attempts);
            return Some(self.finish(
                CaptureState::Failed,
                CaptureEvent::Exhausted(NO_BARCODE_MESSAGE.to_string()),
            ));
        }
        None
    }

    /// Start if idle, then tick every interval until a terminal event.
    ///
    /// Always returns: every tick either decodes, spends an attempt, or
    /// spends an unsized tick, and both budgets end the session.
    pub fn run(&mut self, sleeper: &dyn Sleeper) -> Result<CaptureEvent> {
        if self.state == CaptureState::Idle {
            self.start()?;
        }
        while self.timer.armed {
            sleeper.sleep(self.timer.interval);
            if let Some(event) = self.tick() {
                return Ok(event);
            }
        }
        self.outcome.clone().ok_or_else(|| {
            FoodGradeError::InvalidState(format!("capture session {}", self.state))
        })
    }

    /// Cancel the timer and release the camera. Safe from any state, any
    /// number of times.
    pub fn stop(&mut self) {
        self.timer.cancel();
        self.release();
        if self.state == CaptureState::Active {
            self.state = CaptureState::Stopped;
            debug!("Capture stopped");
        }
    }

    /// Flip the torch. Does nothing without a torch or an active track; a
    /// failed flip keeps the previous state.
    pub fn toggle_illumination(&mut self) -> Illumination {
        if !self.torch_supported {
            return Illumination::Unsupported;
        }
        let Some(track) = self.track.as_mut() else {
            return self.illumination();
        };
        match track.set_torch(!self.torch_on) {
            Ok(()) => self.torch_on = !self.torch_on,
            Err(e) => warn!("Torch toggle error: {e}"),
        }
        self.illumination()
    }

    pub fn illumination(&self) -> Illumination {
        match (self.torch_supported, self.torch_on) {
            (false, _) => Illumination::Unsupported,
            (true, true) => Illumination::On,
            (true, false) => Illumination::Off,
        }
    }

    /// Release the camera, swap facing mode, and reacquire if the session
    /// was active.
    ///
    /// Not atomic: the camera is fully released before the new one is
    /// opened, and a failed reopen leaves the session `Failed`.
    pub fn switch_facing(&mut self) -> Result<()> {
        let was_active = self.state == CaptureState::Active;
        self.timer.cancel();
        self.release();
        self.facing = self.facing.toggled();
        debug!("Switched to {} camera", self.facing);
        if was_active {
            self.state = CaptureState::Idle;
            self.start()?;
        }
        Ok(())
    }

    fn finish(&mut self, state: CaptureState, event: CaptureEvent) -> CaptureEvent {
        // Disarm before anything else so no later tick can produce a second event.
        self.timer.cancel();
        self.release();
        self.state = state;
        self.outcome = Some(event.clone());
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
        event
    }

    fn release(&mut self) {
        if let Some(mut track) = self.track.take() {
            if self.torch_on {
                if let Err(e) = track.set_torch(false) {
                    debug!("Could not turn torch off before release: {e}");
                }
            }
            track.stop();
            debug!("Camera track released");
        }
        self.torch_on = false;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureState::Idle => "idle",
            CaptureState::Active => "active",
            CaptureState::Succeeded => "succeeded",
            CaptureState::Failed => "failed",
            CaptureState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

impl fmt::Display for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CaptureSession(state={}, facing={}, attempts={}/{}, unsized={}/{})",
            self.state,
            self.facing,
            self.attempts,
            self.max_attempts,
            self.unsized_ticks,
            self.max_unsized_ticks
        )
    }
}
