//! Camera capture core: enumeration, session, and backend seams.
//!
//! - Device discovery via [`DeviceEnumerator`]
//! - Frame capture via [`CaptureSession`]
//! - Platform integration via the [`DeviceHost`] / [`CaptureBackend`] traits

mod backend;
mod controls;
pub mod convert;
mod delivery;
mod device;
mod session;
mod types;

pub use backend::{CaptureBackend, DeviceHost, OpenRequest};
pub use controls::{
    ControlCapabilities, ExposureMode, FocusMode, FocusPoint, PlaybackMode, TransportState,
    WhiteBalanceMode,
};
pub use device::DeviceEnumerator;
pub use session::{CaptureSession, DEFAULT_SHUTDOWN_TIMEOUT};
pub use types::{
    DeviceDescriptor, Frame, GrabError, PixelBuffer, PixelFormat, Resolution, StreamInfo,
};
