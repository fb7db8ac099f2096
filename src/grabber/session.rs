//! Capture session: owns one open device and the polled frame pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::backend::{CaptureBackend, DeviceHost, OpenRequest};
use super::controls::{ExposureMode, FocusMode, FocusPoint, PlaybackMode, WhiteBalanceMode};
use super::delivery::{run_delivery_loop, SharedFrame};
use super::device::DeviceEnumerator;
use super::types::{DeviceDescriptor, GrabError, PixelBuffer, PixelFormat, StreamInfo};

/// Default bound on how long `close()` waits for the delivery thread to
/// drain before reporting [`GrabError::ShutdownTimeout`].
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Which device the next `setup()` will open.
#[derive(Debug, Clone)]
enum DeviceSelection {
    Index(usize),
    UniqueId(String),
}

/// A camera capture session.
///
/// Configuration (device selection, frame rate, pixel format, mirror)
/// is staged and takes effect at the next [`setup`](Self::setup). While
/// running, a background delivery thread writes frames into a landing
/// buffer; each [`update`](Self::update) poll publishes the newest
/// landing frame by swapping buffer storage under the shared lock, so
/// the consumer never observes a torn frame. Frames that arrive between
/// two polls overwrite each other — this is a preview pipeline, not a
/// recorder.
///
/// Control getters are only meaningful while running and return a
/// defined locked/unsupported default otherwise; control setters return
/// `false` without side effects when the device does not advertise the
/// capability, so probing by attempting a setting is safe.
pub struct CaptureSession {
    host: Arc<dyn DeviceHost>,
    selection: DeviceSelection,
    desired_frame_rate: Option<u32>,
    pixel_format: PixelFormat,
    mirror: bool,

    backend: Option<Arc<Mutex<Box<dyn CaptureBackend>>>>,
    shared: Option<Arc<SharedFrame>>,
    delivery_thread: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,

    descriptor: Option<DeviceDescriptor>,
    info: Option<StreamInfo>,
    published: PixelBuffer,
    frame_new: bool,
    initialized: bool,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("selection", &self.selection)
            .field("pixel_format", &self.pixel_format)
            .field("initialized", &self.initialized)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl CaptureSession {
    /// Create a session over the given device host. No device is opened
    /// until [`setup`](Self::setup).
    pub fn new(host: Arc<dyn DeviceHost>) -> Self {
        Self {
            host,
            selection: DeviceSelection::Index(0),
            desired_frame_rate: None,
            pixel_format: PixelFormat::Rgb,
            mirror: false,
            backend: None,
            shared: None,
            delivery_thread: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            descriptor: None,
            info: None,
            published: PixelBuffer::new(0, 0, PixelFormat::Rgb),
            frame_new: false,
            initialized: false,
        }
    }

    /// Select the target device by positional index.
    ///
    /// Legal while running; takes effect on the next `setup()`, not
    /// retroactively.
    pub fn set_device(&mut self, index: usize) {
        self.selection = DeviceSelection::Index(index);
    }

    /// Select the target device by stable unique ID.
    pub fn set_device_unique_id(&mut self, unique_id: &str) {
        self.selection = DeviceSelection::UniqueId(unique_id.to_string());
    }

    /// Stage a frame-rate hint for the next `setup()`.
    pub fn set_desired_frame_rate(&mut self, fps: u32) {
        self.desired_frame_rate = Some(fps);
    }

    /// Stage a pixel format for the next `setup()`.
    ///
    /// Returns `false` without changing the staged format when the
    /// currently selected device does not advertise `format`, or when
    /// the selection cannot be resolved at all.
    pub fn set_pixel_format(&mut self, format: PixelFormat) -> bool {
        match self.resolve_selection() {
            Ok(descriptor) if descriptor.supported_formats.contains(&format) => {
                self.pixel_format = format;
                true
            }
            _ => false,
        }
    }

    /// The staged pixel format.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Stage horizontal mirroring (selfie mode) for the next `setup()`.
    pub fn set_mirror(&mut self, mirror: bool) {
        self.mirror = mirror;
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    /// Open the selected device and start frame delivery.
    ///
    /// If the session is already running it is closed first, then
    /// reopened against the currently staged selection. The device may
    /// coerce the requested resolution; the negotiated values are
    /// available through [`negotiated`](Self::negotiated) afterwards.
    /// On failure the session is left uninitialized and the error
    /// distinguishes why the open was refused.
    pub fn setup(&mut self, width: u32, height: u32) -> Result<(), GrabError> {
        if self.initialized || self.delivery_thread.is_some() {
            self.close()?;
        }

        let descriptor = self.resolve_selection()?;
        if !descriptor.supported_formats.contains(&self.pixel_format) {
            return Err(GrabError::UnsupportedFormat(self.pixel_format));
        }

        let request = OpenRequest {
            width,
            height,
            frame_rate: self.desired_frame_rate,
            pixel_format: self.pixel_format,
        };
        let backend = self.host.open(&descriptor.unique_id, &request)?;
        let info = backend.info();
        log::debug!(
            "opened '{}' at {}x{} {} @ {} fps",
            descriptor.localized_name,
            info.width,
            info.height,
            info.pixel_format,
            info.frame_rate
        );

        self.published = PixelBuffer::new(info.width, info.height, info.pixel_format);
        let shared = Arc::new(SharedFrame::new(PixelBuffer::new(
            info.width,
            info.height,
            info.pixel_format,
        )));
        let backend = Arc::new(Mutex::new(backend));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = thread::spawn({
            let backend = Arc::clone(&backend);
            let shared = Arc::clone(&shared);
            let stop = Arc::clone(&stop);
            let mirror = self.mirror;
            move || run_delivery_loop(backend, shared, stop, mirror)
        });

        self.backend = Some(backend);
        self.shared = Some(shared);
        self.delivery_thread = Some(handle);
        self.stop_signal = stop;
        self.descriptor = Some(descriptor);
        self.info = Some(info);
        self.frame_new = false;
        self.initialized = true;
        Ok(())
    }

    /// Whether a device is currently open and delivering.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Consumer-side poll. If a new frame has landed since the last
    /// call, publish it; [`is_frame_new`](Self::is_frame_new) reports
    /// `true` until the next `update()`.
    pub fn update(&mut self) {
        self.frame_new = false;
        if !self.initialized {
            return;
        }
        let Some(shared) = &self.shared else {
            return;
        };
        let mut state = shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if state.new_frame {
            std::mem::swap(&mut self.published, &mut state.landing);
            state.new_frame = false;
            self.frame_new = true;
        }
    }

    /// `true` for exactly the one `update()` cycle that published a
    /// fresh frame.
    pub fn is_frame_new(&self) -> bool {
        self.frame_new
    }

    /// The published pixel buffer.
    ///
    /// The returned reference is overwritten in place by a later
    /// `update()`; copy the data out if it must outlive the next poll.
    /// After `close()` this keeps returning the last published frame.
    pub fn pixels(&self) -> &PixelBuffer {
        &self.published
    }

    /// Stream parameters negotiated at the last successful `setup()`.
    pub fn negotiated(&self) -> Option<StreamInfo> {
        self.info
    }

    /// Negotiated frame width, 0 before the first successful `setup()`.
    pub fn width(&self) -> u32 {
        self.info.map_or(0, |i| i.width)
    }

    /// Negotiated frame height, 0 before the first successful `setup()`.
    pub fn height(&self) -> u32 {
        self.info.map_or(0, |i| i.height)
    }

    /// Total frames the delivery thread has landed this session,
    /// including ones dropped between polls. 0 when closed.
    pub fn frames_delivered(&self) -> u64 {
        let Some(shared) = &self.shared else {
            return 0;
        };
        shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .delivered
    }

    /// Stop frame delivery and release the device, waiting up to
    /// [`DEFAULT_SHUTDOWN_TIMEOUT`] for the delivery thread to drain.
    /// No-op when already closed.
    pub fn close(&mut self) -> Result<(), GrabError> {
        self.close_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// [`close`](Self::close) with an explicit drain bound.
    ///
    /// On timeout the session keeps the thread handle so a later call
    /// can retry the join, and reports [`GrabError::ShutdownTimeout`].
    /// The published buffer is guaranteed frozen either way: the shared
    /// state is marked closed under the lock before waiting, and the
    /// delivery thread re-checks that mark before every write.
    pub fn close_with_timeout(&mut self, timeout: Duration) -> Result<(), GrabError> {
        self.initialized = false;
        self.frame_new = false;
        self.stop_signal.store(true, Ordering::SeqCst);

        if let Some(shared) = &self.shared {
            let mut state = shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.closed = true;
            state.new_frame = false;
        }

        let Some(handle) = self.delivery_thread.take() else {
            self.release();
            return Ok(());
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                self.delivery_thread = Some(handle);
                return Err(GrabError::ShutdownTimeout(timeout));
            }
            thread::sleep(Duration::from_millis(1));
        }
        let _ = handle.join();
        self.release();
        log::debug!("capture session closed");
        Ok(())
    }

    fn release(&mut self) {
        self.backend = None;
        self.shared = None;
        self.descriptor = None;
    }

    /// Unique ID of the open device, `None` when not running.
    pub fn unique_id(&self) -> Option<&str> {
        self.open_descriptor().map(|d| d.unique_id.as_str())
    }

    /// Model ID of the open device, `None` when not running.
    pub fn model_id(&self) -> Option<&str> {
        self.open_descriptor().map(|d| d.model_id.as_str())
    }

    /// Manufacturer of the open device, `None` when not running.
    pub fn manufacturer(&self) -> Option<&str> {
        self.open_descriptor().map(|d| d.manufacturer.as_str())
    }

    /// Display name of the open device, `None` when not running.
    pub fn localized_name(&self) -> Option<&str> {
        self.open_descriptor().map(|d| d.localized_name.as_str())
    }

    pub fn exposure_mode(&self) -> ExposureMode {
        self.with_backend(ExposureMode::Locked, |b| b.exposure_mode())
    }

    pub fn is_exposure_mode_supported(&self, mode: ExposureMode) -> bool {
        self.with_backend(false, |b| {
            b.control_capabilities().exposure_modes.contains(&mode)
        })
    }

    /// Apply an exposure mode; `false` when the device does not
    /// advertise it, leaving the current mode unchanged.
    pub fn set_exposure_mode(&mut self, mode: ExposureMode) -> bool {
        self.with_backend(false, |b| {
            b.control_capabilities().exposure_modes.contains(&mode)
                && b.set_exposure_mode(mode)
        })
    }

    pub fn is_adjusting_exposure(&self) -> bool {
        self.with_backend(false, |b| b.is_adjusting_exposure())
    }

    pub fn white_balance_mode(&self) -> WhiteBalanceMode {
        self.with_backend(WhiteBalanceMode::Locked, |b| b.white_balance_mode())
    }

    pub fn is_white_balance_mode_supported(&self, mode: WhiteBalanceMode) -> bool {
        self.with_backend(false, |b| {
            b.control_capabilities().white_balance_modes.contains(&mode)
        })
    }

    pub fn set_white_balance_mode(&mut self, mode: WhiteBalanceMode) -> bool {
        self.with_backend(false, |b| {
            b.control_capabilities().white_balance_modes.contains(&mode)
                && b.set_white_balance_mode(mode)
        })
    }

    pub fn is_adjusting_white_balance(&self) -> bool {
        self.with_backend(false, |b| b.is_adjusting_white_balance())
    }

    pub fn focus_mode(&self) -> FocusMode {
        self.with_backend(FocusMode::Locked, |b| b.focus_mode())
    }

    pub fn is_focus_mode_supported(&self, mode: FocusMode) -> bool {
        self.with_backend(false, |b| {
            b.control_capabilities().focus_modes.contains(&mode)
        })
    }

    pub fn set_focus_mode(&mut self, mode: FocusMode) -> bool {
        self.with_backend(false, |b| {
            b.control_capabilities().focus_modes.contains(&mode) && b.set_focus_mode(mode)
        })
    }

    pub fn is_adjusting_focus(&self) -> bool {
        self.with_backend(false, |b| b.is_adjusting_focus())
    }

    pub fn focus_point_of_interest(&self) -> FocusPoint {
        self.with_backend(FocusPoint::CENTER, |b| b.focus_point_of_interest())
    }

    pub fn is_focus_point_of_interest_supported(&self) -> bool {
        self.with_backend(false, |b| b.control_capabilities().focus_point_of_interest)
    }

    /// Apply a focus point of interest, clamping coordinates to `[0, 1]`.
    pub fn set_focus_point_of_interest(&mut self, point: FocusPoint) -> bool {
        let point = point.clamped();
        self.with_backend(false, |b| {
            b.control_capabilities().focus_point_of_interest
                && b.set_focus_point_of_interest(point)
        })
    }

    pub fn transport_controls_supported(&self) -> bool {
        self.with_backend(false, |b| b.control_capabilities().transport_controls)
    }

    pub fn transport_playback_mode(&self) -> PlaybackMode {
        self.with_backend(PlaybackMode::NotPlaying, |b| b.transport_state().mode)
    }

    pub fn transport_speed(&self) -> f32 {
        self.with_backend(0.0, |b| b.transport_state().speed)
    }

    /// Apply playback mode and speed together on a deck-style source.
    pub fn set_transport_playback(&mut self, mode: PlaybackMode, speed: f32) -> bool {
        self.with_backend(false, |b| {
            b.control_capabilities().transport_controls
                && b.set_transport_playback(mode, speed)
        })
    }

    fn open_descriptor(&self) -> Option<&DeviceDescriptor> {
        if !self.initialized {
            return None;
        }
        self.descriptor.as_ref()
    }

    /// Run `f` against the open backend, or return `default` when the
    /// session is not running.
    fn with_backend<T>(&self, default: T, f: impl FnOnce(&mut dyn CaptureBackend) -> T) -> T {
        if !self.initialized {
            return default;
        }
        let Some(backend) = &self.backend else {
            return default;
        };
        let mut guard = backend.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut **guard)
    }

    fn resolve_selection(&self) -> Result<DeviceDescriptor, GrabError> {
        let enumerator = DeviceEnumerator::new(Arc::clone(&self.host));
        match &self.selection {
            DeviceSelection::Index(index) => enumerator.describe(*index),
            DeviceSelection::UniqueId(unique_id) => enumerator
                .devices()?
                .into_iter()
                .find(|d| d.unique_id == *unique_id)
                .ok_or_else(|| GrabError::DeviceNotFound(unique_id.clone())),
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("capture session shutdown: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{SyntheticDevice, SyntheticHost};

    fn single_camera_session(formats: Vec<PixelFormat>) -> CaptureSession {
        let host = Arc::new(
            SyntheticHost::new().with_device(SyntheticDevice::new("UnitCam").with_formats(formats)),
        );
        CaptureSession::new(host)
    }

    #[test]
    fn test_session_starts_uninitialized() {
        let session = single_camera_session(vec![PixelFormat::Rgb]);
        assert!(!session.is_initialized());
        assert!(!session.is_frame_new());
        assert!(session.pixels().is_empty());
        assert_eq!(session.width(), 0);
        assert_eq!(session.height(), 0);
    }

    #[test]
    fn test_set_pixel_format_stages_supported_format() {
        let mut session = single_camera_session(vec![PixelFormat::Rgb, PixelFormat::Yuyv]);
        assert!(session.set_pixel_format(PixelFormat::Yuyv));
        assert_eq!(session.pixel_format(), PixelFormat::Yuyv);
    }

    #[test]
    fn test_set_pixel_format_rejects_unsupported_format() {
        let mut session = single_camera_session(vec![PixelFormat::Rgb]);
        assert!(!session.set_pixel_format(PixelFormat::Nv12));
        assert_eq!(session.pixel_format(), PixelFormat::Rgb);
    }

    #[test]
    fn test_set_pixel_format_rejects_unresolvable_device() {
        let host = Arc::new(SyntheticHost::new());
        let mut session = CaptureSession::new(host);
        assert!(!session.set_pixel_format(PixelFormat::Rgb));
    }

    #[test]
    fn test_setup_fails_for_out_of_range_index() {
        let mut session = single_camera_session(vec![PixelFormat::Rgb]);
        session.set_device(5);
        let result = session.setup(320, 240);
        assert!(matches!(result, Err(GrabError::OutOfRange { index: 5, .. })));
        assert!(!session.is_initialized());
    }

    #[test]
    fn test_setup_fails_for_unknown_unique_id() {
        let mut session = single_camera_session(vec![PixelFormat::Rgb]);
        session.set_device_unique_id("missing-uid");
        let result = session.setup(320, 240);
        assert!(matches!(result, Err(GrabError::DeviceNotFound(_))));
        assert!(!session.is_initialized());
    }

    #[test]
    fn test_control_getters_default_when_closed() {
        let mut session = single_camera_session(vec![PixelFormat::Rgb]);
        assert_eq!(session.exposure_mode(), ExposureMode::Locked);
        assert_eq!(session.white_balance_mode(), WhiteBalanceMode::Locked);
        assert_eq!(session.focus_mode(), FocusMode::Locked);
        assert_eq!(session.focus_point_of_interest(), FocusPoint::CENTER);
        assert!(!session.transport_controls_supported());
        assert!(!session.set_exposure_mode(ExposureMode::Auto));
        assert!(session.unique_id().is_none());
    }

    #[test]
    fn test_close_without_setup_is_noop() {
        let mut session = single_camera_session(vec![PixelFormat::Rgb]);
        assert!(session.close().is_ok());
        assert!(session.close().is_ok());
    }
}
