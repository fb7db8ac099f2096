//! Core types and data structures for the capture pipeline.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixel format of a frame or buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 24-bit RGB, 3 bytes per pixel.
    Rgb,
    /// 32-bit RGBA, 4 bytes per pixel.
    Rgba,
    /// YUYV 4:2:2 packed, 2 bytes per pixel (macropixel of 4 bytes covers 2 pixels).
    Yuyv,
    /// NV12 planar, full-resolution Y plane followed by interleaved half-resolution UV.
    Nv12,
}

impl PixelFormat {
    /// Bytes per pixel for packed formats. `None` for planar formats
    /// where a per-pixel byte count is not meaningful.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::Rgb => Some(3),
            PixelFormat::Rgba => Some(4),
            PixelFormat::Yuyv => Some(2),
            PixelFormat::Nv12 => None,
        }
    }

    /// Total byte length of one frame at the given resolution.
    pub fn byte_len(self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            PixelFormat::Rgb => pixels * 3,
            PixelFormat::Rgba => pixels * 4,
            PixelFormat::Yuyv => pixels * 2,
            PixelFormat::Nv12 => pixels + pixels / 2,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Rgb => "rgb",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Yuyv => "yuyv",
            PixelFormat::Nv12 => "nv12",
        };
        write!(f, "{}", name)
    }
}

/// Capture resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Low resolution (320x240) - fast previews
    pub const LOW: Resolution = Resolution {
        width: 320,
        height: 240,
    };

    /// Medium resolution (640x480) - balanced, recommended
    pub const MEDIUM: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    /// High resolution (1280x720)
    pub const HIGH: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::MEDIUM
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Stream parameters negotiated with the device at open time.
///
/// The device may coerce a requested resolution to the nearest mode it
/// supports, so these values can differ from what was passed to `setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub frame_rate: u32,
}

/// A single frame as produced by a capture backend.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw sample data in `format` layout.
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: PixelFormat,
    /// Per-stream monotonic sequence number
    pub sequence: u64,
    /// Timestamp when the frame was produced
    pub timestamp: Instant,
}

/// An owned pixel buffer with fixed dimensions and format.
///
/// The capture session keeps two of these: a landing buffer written by
/// the delivery thread and a published buffer handed to the consumer.
/// Both always hold complete frames of the negotiated size, which is
/// what makes the landing/published storage swap tear-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer for the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data: vec![0; format.byte_len(width, height)],
            width,
            height,
            format,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw sample data in `format` layout.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy a frame's samples into this buffer.
    ///
    /// Returns `false` without touching the buffer when the frame's byte
    /// length does not match, so a malformed delivery can never leave a
    /// partially written buffer behind.
    pub fn copy_from_frame(&mut self, frame: &Frame) -> bool {
        if frame.data.len() != self.data.len() {
            return false;
        }
        self.data.copy_from_slice(&frame.data);
        true
    }
}

/// Descriptive metadata for one capture device.
///
/// A descriptor is a snapshot taken at enumeration time. `index` is
/// positional and only valid until the next enumeration (hot-plug may
/// renumber); `unique_id` is stable for the device's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Stable per-device identifier, survives re-enumeration.
    pub unique_id: String,
    /// Hardware model identifier.
    pub model_id: String,
    /// Device vendor.
    pub manufacturer: String,
    /// Human-readable display name.
    pub localized_name: String,
    /// Position in the enumeration this snapshot was taken from.
    pub index: usize,
    /// Pixel formats the device can deliver.
    pub supported_formats: Vec<PixelFormat>,
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({} {})",
            self.index, self.localized_name, self.manufacturer, self.model_id
        )
    }
}

/// Errors that can occur during capture operations.
#[derive(Debug, Error)]
pub enum GrabError {
    /// Failed to query the device list
    #[error("failed to query capture devices: {0}")]
    QueryFailed(String),

    /// Device index outside the current enumeration
    #[error("device index {index} out of range ({count} device(s) connected)")]
    OutOfRange { index: usize, count: usize },

    /// No device with the given unique ID is connected
    #[error("capture device '{0}' not found")]
    DeviceNotFound(String),

    /// Pixel format not advertised by the selected device
    #[error("pixel format '{0}' is not supported by the selected device")]
    UnsupportedFormat(PixelFormat),

    /// Device is already claimed by another session or process
    #[error("capture device is busy: {0}")]
    DeviceBusy(String),

    /// Camera access denied by the platform
    #[error("camera permission denied")]
    PermissionDenied,

    /// Device open failed for another reason
    #[error("failed to open capture device: {0}")]
    OpenFailed(String),

    /// Error while streaming frames
    #[error("capture stream error: {0}")]
    StreamError(String),

    /// The delivery thread failed to drain before the close deadline.
    /// Unlike every other variant this one is not recoverable by retrying
    /// with different parameters; it means the backend is wedged.
    #[error("delivery thread did not drain within {0:?}")]
    ShutdownTimeout(Duration),
}
