//! Camera barcode acquisition.
//!
//! A [`CaptureSession`] owns the camera track for its whole lifetime and
//! samples frames on a fixed interval until a barcode is decoded, the
//! attempt budget runs out, or it is stopped. Sessions are single-use.

pub mod decoder;
pub mod device;
pub mod session;

pub use decoder::{DecodeAdapter, FrameDecoder, Symbology};
pub use device::{CameraDevice, FacingMode, FrameBuffer, VideoTrack};
pub use session::{CaptureEvent, CaptureSession, CaptureState, Illumination};
