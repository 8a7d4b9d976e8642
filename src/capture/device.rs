use std::fmt;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    User,
    #[default]
    Environment,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::User => f.write_str("user"),
            FacingMode::Environment => f.write_str("environment"),
        }
    }
}

/// Off-screen RGBA pixel buffer, reused across ticks.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl FrameBuffer {
    /// Resize to `width` x `height`, reallocating only when it grows.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let len = width as usize * height as usize * 4;
        self.pixels.resize(len, 0);
    }
}

/// Source of video streams, e.g. a platform camera API.
pub trait CameraDevice {
    /// Acquire a stream for `facing` at (roughly) `resolution`.
    ///
    /// Fails when permission is denied or no matching camera exists.
    fn open(&mut self, facing: FacingMode, resolution: (u32, u32)) -> Result<Box<dyn VideoTrack>>;
}

/// An acquired video track. Holds the hardware until [`VideoTrack::stop`].
pub trait VideoTrack {
    /// Current frame size; `(0, 0)` until the stream produces frames.
    fn dimensions(&self) -> (u32, u32);

    /// Copy the current frame into `buffer`, which is already sized to
    /// [`VideoTrack::dimensions`].
    fn read_frame(&mut self, buffer: &mut FrameBuffer) -> Result<()>;

    fn supports_torch(&self) -> bool;

    fn set_torch(&mut self, on: bool) -> Result<()>;

    /// Release the hardware. Called exactly once per track.
    fn stop(&mut self);
}
