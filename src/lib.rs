//! framegrab: a camera-capture core for host render loops.
//!
//! The crate exposes three layers:
//!
//! - [`grabber`]: device enumeration ([`DeviceEnumerator`]), the polled
//!   capture pipeline ([`CaptureSession`]), and the backend seams
//!   ([`DeviceHost`], [`CaptureBackend`]) that platform integrations
//!   implement.
//! - [`synthetic`]: in-memory test-pattern devices used by the tests
//!   and the demo binary.
//! - [`config`]: TOML configuration for the binary.
//!
//! The typical consumer flow: pick a device, `setup()`, then once per
//! render tick call `update()` and, when `is_frame_new()`, read
//! `pixels()`.

pub mod config;
pub mod grabber;
pub mod synthetic;

pub use grabber::{
    CaptureBackend, CaptureSession, DeviceDescriptor, DeviceEnumerator, DeviceHost, Frame,
    GrabError, OpenRequest, PixelBuffer, PixelFormat, Resolution, StreamInfo,
};
