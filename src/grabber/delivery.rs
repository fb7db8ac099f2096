//! Background frame-delivery loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::backend::CaptureBackend;
use super::convert;
use super::types::PixelBuffer;

/// How long one backend poll may block before the loop re-checks the
/// stop signal.
const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Backoff after a transient stream error.
const ERROR_BACKOFF: Duration = Duration::from_millis(5);

/// State shared between the delivery thread and the consumer's
/// `update()` calls. Everything behind one lock; both critical sections
/// are bounded (a frame copy on the delivery side, a storage swap on
/// the consumer side).
pub(crate) struct SharedFrame {
    pub(crate) state: Mutex<LandingState>,
}

pub(crate) struct LandingState {
    /// Buffer the delivery thread writes into. Last-write-wins: an
    /// unconsumed frame is simply overwritten by the next delivery.
    pub(crate) landing: PixelBuffer,
    /// Set once per delivered frame, cleared once per consuming poll.
    pub(crate) new_frame: bool,
    /// Set by `close()`; once observed, the delivery thread never
    /// writes again, even if a frame is already in flight.
    pub(crate) closed: bool,
    /// Total frames written into the landing buffer.
    pub(crate) delivered: u64,
}

impl SharedFrame {
    pub(crate) fn new(landing: PixelBuffer) -> Self {
        Self {
            state: Mutex::new(LandingState {
                landing,
                new_frame: false,
                closed: false,
                delivered: 0,
            }),
        }
    }
}

/// Run the delivery loop until the stop signal is raised or the shared
/// state is marked closed.
///
/// The backend lock is held only for one bounded poll at a time so the
/// consumer thread's control calls interleave freely.
pub(crate) fn run_delivery_loop(
    backend: Arc<Mutex<Box<dyn CaptureBackend>>>,
    shared: Arc<SharedFrame>,
    stop: Arc<AtomicBool>,
    mirror: bool,
) {
    while !stop.load(Ordering::Relaxed) {
        let next = match backend.lock() {
            Ok(mut guard) => guard.next_frame(POLL_TIMEOUT),
            Err(_) => break,
        };

        match next {
            Ok(Some(mut frame)) => {
                if mirror {
                    convert::mirror_horizontal(&mut frame);
                }

                let Ok(mut state) = shared.state.lock() else {
                    break;
                };
                if state.closed {
                    break;
                }
                if state.landing.copy_from_frame(&frame) {
                    state.new_frame = true;
                    state.delivered += 1;
                } else {
                    log::warn!(
                        "dropping frame {}: {} bytes does not match negotiated {}x{} {}",
                        frame.sequence,
                        frame.data.len(),
                        state.landing.width(),
                        state.landing.height(),
                        state.landing.format()
                    );
                }
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("capture stream error: {}", e);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }

    if let Ok(mut guard) = backend.lock() {
        guard.stop();
    }
}
