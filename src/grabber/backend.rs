//! Capture backend abstraction.
//!
//! Platform integrations implement two traits: [`DeviceHost`] for
//! enumeration and device open, and [`CaptureBackend`] for an open
//! stream. The session and enumerator depend only on these seams, so a
//! mock or synthetic backend slots in the same way a hardware one does.

use std::time::Duration;

use super::controls::{
    ControlCapabilities, ExposureMode, FocusMode, FocusPoint, PlaybackMode, TransportState,
    WhiteBalanceMode,
};
use super::types::{DeviceDescriptor, Frame, GrabError, PixelFormat, StreamInfo};

/// Parameters requested when opening a device.
///
/// The backend treats these as hints where the hardware demands it:
/// resolution may be coerced to the nearest supported mode (reported
/// back through [`CaptureBackend::info`]), while an unsupported pixel
/// format is a hard error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub width: u32,
    pub height: u32,
    /// Desired frame rate; `None` leaves the choice to the device.
    pub frame_rate: Option<u32>,
    pub pixel_format: PixelFormat,
}

/// A source of capture devices: live enumeration plus device open.
///
/// `devices()` must reflect the connected device list at call time, not
/// a cached snapshot; hot-plug is expected to renumber positional
/// indices between calls.
pub trait DeviceHost: Send + Sync {
    /// Snapshot of currently connected devices, in enumeration order.
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, GrabError>;

    /// Open the device with the given unique ID as a capture stream.
    fn open(
        &self,
        unique_id: &str,
        request: &OpenRequest,
    ) -> Result<Box<dyn CaptureBackend>, GrabError>;
}

/// An open capture stream plus its control surface.
///
/// Frame production side: `next_frame` is a bounded-wait poll driven
/// from the session's delivery thread. Control side: getters/setters
/// are called from the consumer thread; every control method has a
/// conservative default (locked / unsupported) so minimal backends only
/// implement the frame path.
pub trait CaptureBackend: Send {
    /// Stream parameters as actually negotiated with the device.
    fn info(&self) -> StreamInfo;

    /// Wait up to `timeout` for the next frame.
    ///
    /// `Ok(None)` means no frame became available in time, which is a
    /// normal outcome the delivery loop uses to stay responsive to
    /// shutdown. Frames must carry monotonically increasing sequence
    /// numbers in delivery order.
    fn next_frame(&mut self, timeout: Duration) -> Result<Option<Frame>, GrabError>;

    /// Release the device. Called once when the stream shuts down;
    /// must be safe to call after a failed poll.
    fn stop(&mut self);

    /// Control modes and features this device advertises.
    fn control_capabilities(&self) -> ControlCapabilities {
        ControlCapabilities::default()
    }

    fn exposure_mode(&self) -> ExposureMode {
        ExposureMode::Locked
    }

    /// Apply an exposure mode. Returns `false` if the device refused it.
    fn set_exposure_mode(&mut self, _mode: ExposureMode) -> bool {
        false
    }

    fn is_adjusting_exposure(&self) -> bool {
        false
    }

    fn white_balance_mode(&self) -> WhiteBalanceMode {
        WhiteBalanceMode::Locked
    }

    fn set_white_balance_mode(&mut self, _mode: WhiteBalanceMode) -> bool {
        false
    }

    fn is_adjusting_white_balance(&self) -> bool {
        false
    }

    fn focus_mode(&self) -> FocusMode {
        FocusMode::Locked
    }

    fn set_focus_mode(&mut self, _mode: FocusMode) -> bool {
        false
    }

    fn is_adjusting_focus(&self) -> bool {
        false
    }

    fn focus_point_of_interest(&self) -> FocusPoint {
        FocusPoint::CENTER
    }

    /// Apply a focus point of interest. The session clamps coordinates
    /// into `[0, 1]` before calling this.
    fn set_focus_point_of_interest(&mut self, _point: FocusPoint) -> bool {
        false
    }

    fn transport_state(&self) -> TransportState {
        TransportState::default()
    }

    /// Apply playback mode and speed together.
    fn set_transport_playback(&mut self, _mode: PlaybackMode, _speed: f32) -> bool {
        false
    }
}
