//! Shared render-session progress state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Pixel count above which the UI sync interval is stretched to bound
/// polling overhead on large images.
const LARGE_IMAGE_PIXELS: u64 = 1 << 21;

struct Clock {
    started: Instant,
    frozen: Option<Duration>,
}

/// Per-session progress tracker: cooperative continue flag, elapsed
/// clock and the polling interval suggested to readers.
///
/// Workers poll `should_continue` once per scanline, which bounds
/// cancellation latency to one row's render time without taking any
/// lock on the hot path.
pub struct Progress {
    keep_going: AtomicBool,
    clock: Mutex<Clock>,
    sync_interval: Mutex<Duration>,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            keep_going: AtomicBool::new(true),
            clock: Mutex::new(Clock {
                started: Instant::now(),
                frozen: None,
            }),
            sync_interval: Mutex::new(Duration::from_millis(1000)),
        }
    }

    /// Re-arm for a new session: continue=true, clock restarted.
    pub fn reset(&self, sync_interval: Duration) {
        self.keep_going.store(true, Ordering::SeqCst);
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        clock.started = Instant::now();
        clock.frozen = None;
        *self
            .sync_interval
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = sync_interval;
    }

    /// Request cooperative cancellation. Workers stop after their
    /// current scanline.
    pub fn request_stop(&self) {
        self.keep_going.store(false, Ordering::SeqCst);
    }

    pub fn should_continue(&self) -> bool {
        self.keep_going.load(Ordering::Relaxed)
    }

    /// Elapsed session time; stable once `freeze` has been called.
    pub fn elapsed(&self) -> Duration {
        let clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        clock.frozen.unwrap_or_else(|| clock.started.elapsed())
    }

    /// Stop the session clock and return the final elapsed time.
    pub fn freeze(&self) -> Duration {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let elapsed = clock.frozen.unwrap_or_else(|| clock.started.elapsed());
        clock.frozen = Some(elapsed);
        elapsed
    }

    /// Interval at which UI/telemetry readers should poll.
    pub fn sync_interval(&self) -> Duration {
        *self
            .sync_interval
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Larger images sync less frequently to bound overhead.
    pub fn sync_interval_for(width: u32, height: u32) -> Duration {
        if (width as u64) * (height as u64) > LARGE_IMAGE_PIXELS {
            Duration::from_millis(3000)
        } else {
            Duration::from_millis(1000)
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}
