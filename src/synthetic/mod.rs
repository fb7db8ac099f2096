//! Synthetic capture devices.
//!
//! In-memory devices that generate test patterns at a configurable
//! rate. They stand in for platform hardware in the integration tests
//! and the demo binary, and double as the reference implementation of
//! the [`DeviceHost`] / [`CaptureBackend`] seams.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::grabber::convert;
use crate::grabber::{
    CaptureBackend, ControlCapabilities, DeviceDescriptor, DeviceHost, ExposureMode, FocusMode,
    FocusPoint, Frame, GrabError, OpenRequest, PixelFormat, PlaybackMode, StreamInfo,
    TransportState, WhiteBalanceMode,
};

/// Test pattern generated by a synthetic device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPattern {
    /// SMPTE-style color bars.
    ColorBars,
    /// Horizontal luma gradient, dark to light.
    Gradient,
    /// Solid color with the given Y, U, V values.
    Solid(u8, u8, u8),
    /// Every byte of the frame equals the frame's sequence number
    /// modulo 256. A torn copy mixing two frames is immediately
    /// visible as a non-uniform buffer.
    Counter,
}

/// Scripted open failure for exercising error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    Busy,
    PermissionDenied,
}

/// Configuration of one synthetic device. Builder-style.
#[derive(Debug, Clone)]
pub struct SyntheticDevice {
    unique_id: String,
    model_id: String,
    manufacturer: String,
    localized_name: String,
    formats: Vec<PixelFormat>,
    capabilities: ControlCapabilities,
    pattern: TestPattern,
    frame_interval: Duration,
    max_resolution: Option<(u32, u32)>,
    open_failure: Option<OpenFailure>,
}

impl SyntheticDevice {
    /// A webcam-like device named `localized_name`, with the unique ID
    /// derived as `"<name>-uid"`.
    pub fn new(localized_name: &str) -> Self {
        Self {
            unique_id: format!("{}-uid", localized_name),
            model_id: "synthetic-camera".to_string(),
            manufacturer: "framegrab".to_string(),
            localized_name: localized_name.to_string(),
            formats: vec![PixelFormat::Rgb, PixelFormat::Yuyv],
            capabilities: ControlCapabilities::webcam(),
            pattern: TestPattern::ColorBars,
            frame_interval: Duration::from_millis(33),
            max_resolution: None,
            open_failure: None,
        }
    }

    pub fn with_unique_id(mut self, unique_id: &str) -> Self {
        self.unique_id = unique_id.to_string();
        self
    }

    pub fn with_model_id(mut self, model_id: &str) -> Self {
        self.model_id = model_id.to_string();
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: &str) -> Self {
        self.manufacturer = manufacturer.to_string();
        self
    }

    pub fn with_formats(mut self, formats: Vec<PixelFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_capabilities(mut self, capabilities: ControlCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_pattern(mut self, pattern: TestPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Time between generated frames. `Duration::ZERO` produces frames
    /// as fast as they are polled.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Largest mode the device supports; open requests above it are
    /// coerced down, like real hardware does.
    pub fn with_max_resolution(mut self, width: u32, height: u32) -> Self {
        self.max_resolution = Some((width, height));
        self
    }

    /// Make every open attempt fail the given way.
    pub fn refuses_open(mut self, failure: OpenFailure) -> Self {
        self.open_failure = Some(failure);
        self
    }

    fn descriptor(&self, index: usize) -> DeviceDescriptor {
        DeviceDescriptor {
            unique_id: self.unique_id.clone(),
            model_id: self.model_id.clone(),
            manufacturer: self.manufacturer.clone(),
            localized_name: self.localized_name.clone(),
            index,
            supported_formats: self.formats.clone(),
        }
    }
}

/// A host of synthetic devices. Devices can be added and removed while
/// the host is shared, which is how tests simulate hot-plug.
pub struct SyntheticHost {
    devices: Mutex<Vec<SyntheticDevice>>,
}

impl SyntheticHost {
    pub fn new() -> Self {
        Self {
            devices: Mutex::new(Vec::new()),
        }
    }

    pub fn with_device(mut self, device: SyntheticDevice) -> Self {
        self.devices
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push(device);
        self
    }

    /// Plug in a device.
    pub fn add_device(&self, device: SyntheticDevice) {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(device);
    }

    /// Unplug the device with the given unique ID. Returns whether a
    /// device was removed.
    pub fn remove_device(&self, unique_id: &str) -> bool {
        let mut devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
        let before = devices.len();
        devices.retain(|d| d.unique_id != unique_id);
        devices.len() != before
    }
}

impl Default for SyntheticHost {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceHost for SyntheticHost {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, GrabError> {
        let devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(devices
            .iter()
            .enumerate()
            .map(|(index, device)| device.descriptor(index))
            .collect())
    }

    fn open(
        &self,
        unique_id: &str,
        request: &OpenRequest,
    ) -> Result<Box<dyn CaptureBackend>, GrabError> {
        let device = {
            let devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
            devices
                .iter()
                .find(|d| d.unique_id == unique_id)
                .cloned()
                .ok_or_else(|| GrabError::DeviceNotFound(unique_id.to_string()))?
        };

        if let Some(failure) = device.open_failure {
            return Err(match failure {
                OpenFailure::Busy => GrabError::DeviceBusy(device.localized_name.clone()),
                OpenFailure::PermissionDenied => GrabError::PermissionDenied,
            });
        }
        if !device.formats.contains(&request.pixel_format) {
            return Err(GrabError::UnsupportedFormat(request.pixel_format));
        }

        let (mut width, mut height) = (request.width, request.height);
        if let Some((max_w, max_h)) = device.max_resolution {
            width = width.min(max_w);
            height = height.min(max_h);
        }
        // Alignment constraints like real hardware: even width always
        // (YUYV macropixels), even height for planar formats.
        width = (width & !1).max(2);
        height = height.max(1);
        if request.pixel_format == PixelFormat::Nv12 {
            height = (height & !1).max(2);
        }

        let info = StreamInfo {
            width,
            height,
            pixel_format: request.pixel_format,
            frame_rate: request.frame_rate.unwrap_or(30),
        };

        Ok(Box::new(SyntheticBackend::new(device, info)))
    }
}

/// One open synthetic stream.
pub struct SyntheticBackend {
    info: StreamInfo,
    capabilities: ControlCapabilities,
    pattern: TestPattern,
    frame_interval: Duration,
    next_due: Instant,
    sequence: u64,
    stopped: bool,
    exposure: ExposureMode,
    white_balance: WhiteBalanceMode,
    focus: FocusMode,
    focus_point: FocusPoint,
    transport: TransportState,
}

impl SyntheticBackend {
    fn new(device: SyntheticDevice, info: StreamInfo) -> Self {
        Self {
            info,
            capabilities: device.capabilities,
            pattern: device.pattern,
            frame_interval: device.frame_interval,
            next_due: Instant::now(),
            sequence: 0,
            stopped: false,
            exposure: ExposureMode::Locked,
            white_balance: WhiteBalanceMode::Locked,
            focus: FocusMode::Locked,
            focus_point: FocusPoint::CENTER,
            transport: TransportState::default(),
        }
    }

    fn generate_frame(&self) -> Frame {
        let data = generate_pattern(
            self.pattern,
            self.info.width,
            self.info.height,
            self.info.pixel_format,
            self.sequence,
        );
        Frame {
            data,
            width: self.info.width,
            height: self.info.height,
            format: self.info.pixel_format,
            sequence: self.sequence,
            timestamp: Instant::now(),
        }
    }
}

impl CaptureBackend for SyntheticBackend {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn next_frame(&mut self, timeout: Duration) -> Result<Option<Frame>, GrabError> {
        if self.stopped {
            return Ok(None);
        }
        if self.frame_interval > Duration::ZERO {
            let now = Instant::now();
            if self.next_due > now {
                let wait = self.next_due - now;
                if wait > timeout {
                    thread::sleep(timeout);
                    return Ok(None);
                }
                thread::sleep(wait);
            }
            self.next_due = Instant::now() + self.frame_interval;
        }
        let frame = self.generate_frame();
        self.sequence += 1;
        Ok(Some(frame))
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn control_capabilities(&self) -> ControlCapabilities {
        self.capabilities.clone()
    }

    fn exposure_mode(&self) -> ExposureMode {
        self.exposure
    }

    fn set_exposure_mode(&mut self, mode: ExposureMode) -> bool {
        if !self.capabilities.exposure_modes.contains(&mode) {
            return false;
        }
        self.exposure = mode;
        true
    }

    // Synthetic devices settle instantly, so the adjusting observables
    // inherit the trait's `false` defaults.

    fn white_balance_mode(&self) -> WhiteBalanceMode {
        self.white_balance
    }

    fn set_white_balance_mode(&mut self, mode: WhiteBalanceMode) -> bool {
        if !self.capabilities.white_balance_modes.contains(&mode) {
            return false;
        }
        self.white_balance = mode;
        true
    }

    fn focus_mode(&self) -> FocusMode {
        self.focus
    }

    fn set_focus_mode(&mut self, mode: FocusMode) -> bool {
        if !self.capabilities.focus_modes.contains(&mode) {
            return false;
        }
        self.focus = mode;
        true
    }

    fn focus_point_of_interest(&self) -> FocusPoint {
        self.focus_point
    }

    fn set_focus_point_of_interest(&mut self, point: FocusPoint) -> bool {
        if !self.capabilities.focus_point_of_interest {
            return false;
        }
        self.focus_point = point;
        true
    }

    fn transport_state(&self) -> TransportState {
        self.transport
    }

    fn set_transport_playback(&mut self, mode: PlaybackMode, speed: f32) -> bool {
        if !self.capabilities.transport_controls {
            return false;
        }
        self.transport = TransportState { mode, speed };
        true
    }
}

/// Generate one frame of `pattern` in the given format.
pub fn generate_pattern(
    pattern: TestPattern,
    width: u32,
    height: u32,
    format: PixelFormat,
    sequence: u64,
) -> Vec<u8> {
    if let TestPattern::Counter = pattern {
        return vec![(sequence % 256) as u8; format.byte_len(width, height)];
    }

    let yuyv = match pattern {
        TestPattern::ColorBars => color_bars(width, height),
        TestPattern::Gradient => gradient(width, height),
        TestPattern::Solid(y, u, v) => solid(width, height, y, u, v),
        TestPattern::Counter => unreachable!(),
    };

    match format {
        PixelFormat::Yuyv => yuyv,
        PixelFormat::Rgb => convert::yuyv_to_rgb(&yuyv, width, height),
        PixelFormat::Rgba => {
            let rgb = convert::yuyv_to_rgb(&yuyv, width, height);
            let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
            for px in rgb.chunks_exact(3) {
                rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
            rgba
        }
        PixelFormat::Nv12 => yuyv_to_nv12(&yuyv, width, height),
    }
}

/// YUV values for 8 SMPTE-style bars: white, yellow, cyan, green,
/// magenta, red, blue, black.
const COLOR_BARS: [(u8, u8, u8); 8] = [
    (235, 128, 128),
    (210, 16, 146),
    (170, 166, 16),
    (145, 54, 34),
    (106, 202, 222),
    (81, 90, 240),
    (41, 240, 110),
    (16, 128, 128),
];

fn color_bars(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0u8; PixelFormat::Yuyv.byte_len(width, height)];
    let bar_width = (width / 8).max(1);

    for y in 0..height {
        for x in (0..width).step_by(2) {
            let bar_idx = ((x / bar_width) as usize).min(7);
            let (y_val, u_val, v_val) = COLOR_BARS[bar_idx];

            let offset = ((y * width + x) * 2) as usize;
            if offset + 3 < data.len() {
                data[offset] = y_val;
                data[offset + 1] = u_val;
                data[offset + 2] = y_val;
                data[offset + 3] = v_val;
            }
        }
    }
    data
}

fn gradient(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0u8; PixelFormat::Yuyv.byte_len(width, height)];
    for y in 0..height {
        for x in (0..width).step_by(2) {
            let y_val = ((x * 255) / width) as u8;
            let offset = ((y * width + x) * 2) as usize;
            if offset + 3 < data.len() {
                data[offset] = y_val;
                data[offset + 1] = 128;
                data[offset + 2] = y_val;
                data[offset + 3] = 128;
            }
        }
    }
    data
}

fn solid(width: u32, height: u32, y: u8, u: u8, v: u8) -> Vec<u8> {
    let mut data = vec![0u8; PixelFormat::Yuyv.byte_len(width, height)];
    for chunk in data.chunks_exact_mut(4) {
        chunk[0] = y;
        chunk[1] = u;
        chunk[2] = y;
        chunk[3] = v;
    }
    data
}

/// Repack YUYV into NV12: full Y plane, then one interleaved U/V pair
/// per 2x2 block sampled from the block's top row. Requires even
/// dimensions, which the host guarantees for NV12 streams.
fn yuyv_to_nv12(src: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let mut out = Vec::with_capacity(w * h + w * h / 2);

    for i in (0..src.len()).step_by(2) {
        out.push(src[i]);
    }
    for block_y in (0..h).step_by(2) {
        for block_x in (0..w).step_by(2) {
            let offset = (block_y * w + block_x) * 2;
            out.push(src[offset + 1]);
            out.push(src[offset + 3]);
        }
    }
    out
}
