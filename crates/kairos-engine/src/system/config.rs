use std::time::Duration;

use super::stage::StageFlags;

/// Frame pump configuration.
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// Fixed-step rate in Hz. The fixed step is `1 / frame_rate` real seconds.
    pub frame_rate: f64,

    /// Multiplier from real time to simulation time. Clamped to `>= 0`.
    pub time_scale: f64,

    /// In fixed-step mode, force a draw once this much real time (seconds)
    /// has passed without one.
    pub max_time_between_draws: f64,

    /// Upper bound on a single variable-step simulation delta (seconds).
    pub max_simulation_step: f64,

    pub use_fixed_time_step: bool,

    pub stages: StageFlags,

    /// Stop the pump when the host's last window closes.
    pub shutdown_on_window_close: bool,

    /// How long to yield when a fixed-step tick finds the simulation ahead of
    /// real time. `None` returns immediately.
    pub idle_sleep: Option<Duration>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            time_scale: 1.0,
            max_time_between_draws: 0.03,
            max_simulation_step: 1.0e9,
            use_fixed_time_step: true,
            stages: StageFlags::DEFAULT,
            shutdown_on_window_close: true,
            idle_sleep: Some(Duration::from_millis(1)),
        }
    }
}

impl SystemConfig {
    /// Variable-timestep configuration: one dispatch per tick with the real delta.
    pub fn variable() -> Self {
        Self {
            use_fixed_time_step: false,
            ..Self::default()
        }
    }

    /// Rates that are not finite and positive are logged and ignored.
    pub fn with_frame_rate(mut self, hz: f64) -> Self {
        if valid_frame_rate(hz) {
            self.frame_rate = hz;
        } else {
            log::warn!("ignoring invalid frame rate {hz}");
        }
        self
    }

    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale.max(0.0);
        self
    }

    pub fn with_max_time_between_draws(mut self, secs: f64) -> Self {
        self.max_time_between_draws = secs;
        self
    }

    /// Negative or NaN caps are logged and ignored.
    pub fn with_max_simulation_step(mut self, secs: f64) -> Self {
        if valid_max_simulation_step(secs) {
            self.max_simulation_step = secs;
        } else {
            log::warn!("ignoring invalid max simulation step {secs}");
        }
        self
    }

    pub fn with_stages(mut self, stages: StageFlags) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_idle_sleep(mut self, sleep: Option<Duration>) -> Self {
        self.idle_sleep = sleep;
        self
    }

    /// Fixed real-time step in seconds.
    pub fn frame_time(&self) -> f64 {
        1.0 / self.frame_rate
    }

    /// Replaces fields set directly to values that would make simulation time
    /// run backwards or jump to infinity with their defaults.
    pub(crate) fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !valid_frame_rate(self.frame_rate) {
            log::warn!(
                "invalid frame rate {}; using {} Hz",
                self.frame_rate,
                defaults.frame_rate
            );
            self.frame_rate = defaults.frame_rate;
        }
        if self.time_scale < 0.0 {
            log::warn!("negative time scale {}; using 0", self.time_scale);
            self.time_scale = 0.0;
        } else if !self.time_scale.is_finite() {
            log::warn!("invalid time scale {}; using {}", self.time_scale, defaults.time_scale);
            self.time_scale = defaults.time_scale;
        }
        if !valid_max_simulation_step(self.max_simulation_step) {
            log::warn!(
                "invalid max simulation step {}; using {}",
                self.max_simulation_step,
                defaults.max_simulation_step
            );
            self.max_simulation_step = defaults.max_simulation_step;
        }
        if self.max_time_between_draws.is_nan() {
            log::warn!("invalid max time between draws; using {}", defaults.max_time_between_draws);
            self.max_time_between_draws = defaults.max_time_between_draws;
        }

        self
    }
}

pub(crate) fn valid_frame_rate(hz: f64) -> bool {
    hz.is_finite() && hz > 0.0
}

pub(crate) fn valid_max_simulation_step(secs: f64) -> bool {
    secs >= 0.0
}
