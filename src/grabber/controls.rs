//! Device control surface: exposure, white balance, focus, transport.

/// Exposure control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureMode {
    /// Exposure is fixed at its current value.
    Locked,
    /// Adjust once, then lock.
    Auto,
    /// Adjust continuously as the scene changes.
    ContinuousAuto,
}

/// White balance control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteBalanceMode {
    Locked,
    Auto,
    ContinuousAuto,
}

/// Focus control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    Locked,
    Auto,
    ContinuousAuto,
}

/// Normalized focus point of interest, both axes in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusPoint {
    pub x: f32,
    pub y: f32,
}

impl FocusPoint {
    /// Center of the frame, the conventional default.
    pub const CENTER: FocusPoint = FocusPoint { x: 0.5, y: 0.5 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp both coordinates into `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }
}

/// Playback mode for deck/tape-style sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    NotPlaying,
    Playing,
}

/// Transport state of a deck-style source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub mode: PlaybackMode,
    pub speed: f32,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::NotPlaying,
            speed: 0.0,
        }
    }
}

/// Control capabilities a device advertises.
///
/// Setters for anything not listed here are rejected by the session
/// before they reach the backend; probing capability by attempting a
/// setting is a normal usage pattern and never errors.
#[derive(Debug, Clone, Default)]
pub struct ControlCapabilities {
    /// Exposure modes the device can enter.
    pub exposure_modes: Vec<ExposureMode>,
    /// White balance modes the device can enter.
    pub white_balance_modes: Vec<WhiteBalanceMode>,
    /// Focus modes the device can enter.
    pub focus_modes: Vec<FocusMode>,
    /// Whether the device accepts a focus point of interest.
    pub focus_point_of_interest: bool,
    /// Whether the device exposes deck-style transport controls.
    pub transport_controls: bool,
}

impl ControlCapabilities {
    /// Capabilities typical of an auto-capable webcam: all three control
    /// triples, point-of-interest focus, no transport controls.
    pub fn webcam() -> Self {
        Self {
            exposure_modes: vec![
                ExposureMode::Locked,
                ExposureMode::Auto,
                ExposureMode::ContinuousAuto,
            ],
            white_balance_modes: vec![
                WhiteBalanceMode::Locked,
                WhiteBalanceMode::Auto,
                WhiteBalanceMode::ContinuousAuto,
            ],
            focus_modes: vec![
                FocusMode::Locked,
                FocusMode::Auto,
                FocusMode::ContinuousAuto,
            ],
            focus_point_of_interest: true,
            transport_controls: false,
        }
    }

    /// Capabilities typical of a tape deck: transport controls only,
    /// image controls locked.
    pub fn deck() -> Self {
        Self {
            exposure_modes: vec![ExposureMode::Locked],
            white_balance_modes: vec![WhiteBalanceMode::Locked],
            focus_modes: vec![FocusMode::Locked],
            focus_point_of_interest: false,
            transport_controls: true,
        }
    }
}
