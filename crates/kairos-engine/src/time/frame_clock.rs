use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Real-time snapshot taken at one host tick.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Real time elapsed since the previous tick, in seconds.
    pub dt: f64,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic tick counter.
    pub frame_index: u64,
}

/// Measures real elapsed time between host ticks.
///
/// The frame pump owns one of these and samples it once per `System::step`.
/// Delta time is clamped so a debugger break or a minimized window does not
/// feed a multi-second delta into the simulation.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps (`0 ..= 1s`).
    pub fn new() -> Self {
        Self::with_clamps(Duration::ZERO, Duration::from_secs(1))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the clock baseline without producing a tick.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f64(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock helpers.
pub struct WallClock;

impl WallClock {
    /// Microseconds since the Unix epoch. Returns 0 if the host clock is set
    /// before 1970.
    pub fn now_micros() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }
}

/// Converts a span in seconds to whole microseconds, saturating at zero.
pub fn secs_to_micros(secs: f64) -> u64 {
    if secs <= 0.0 || !secs.is_finite() {
        0
    } else {
        (secs * 1_000_000.0) as u64
    }
}
