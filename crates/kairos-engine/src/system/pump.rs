use crate::time::{secs_to_micros, FrameClock, WallClock};

use super::config::{valid_frame_rate, valid_max_simulation_step, SystemConfig};
use super::listener::{Command, ListenerEntry, ListenerId, SystemCtx, SystemListener};
use super::message::{FrameDelta, SystemMessage};
use super::stage::{StageFlags, SystemStage};
use super::stats::{StageTimer, StageTimes};

/// Result of one `System::step`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StepOutcome {
    /// The system is not running; nothing was dispatched.
    Stopped,
    /// Paused tick: pause notifications and draw stages with zero sim delta.
    Paused,
    /// Simulation advanced. `drawn` is false when a fixed step skipped the
    /// draw stages to catch up with real time.
    Advanced { drawn: bool },
    /// Fixed step only: simulation is ahead of real time, nothing dispatched.
    Idle,
}

/// Frame pump.
///
/// Each host tick measures the real delta, converts it to simulation time and
/// dispatches the stage notifications to every registered listener. In
/// fixed-step mode simulation time only advances in whole steps; the
/// remainder is held as the gap between `correct_simulation_time` and
/// `simulation_time` and carried into the next tick.
pub struct System {
    config: SystemConfig,
    listeners: Vec<ListenerEntry>,
    next_listener: u64,

    clock: FrameClock,
    timer: StageTimer,

    // Epoch microseconds.
    real_clock_time: u64,
    simulation_clock_time: u64,
    last_draw_clock_time: u64,

    // Seconds.
    simulation_time: f64,
    correct_simulation_time: f64,
    sim_time_since_startup: f64,

    running: bool,
    paused: bool,
    was_paused: bool,
}

impl System {
    /// Invalid rates, scales and caps in `config` are logged and replaced by
    /// their defaults.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            config: config.sanitized(),
            listeners: Vec::new(),
            next_listener: 0,
            clock: FrameClock::new(),
            timer: StageTimer::default(),
            real_clock_time: 0,
            simulation_clock_time: 0,
            last_draw_clock_time: 0,
            simulation_time: 0.0,
            correct_simulation_time: 0.0,
            sim_time_since_startup: 0.0,
            running: false,
            paused: false,
            was_paused: false,
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── listeners ─────────────────────────────────────────────────────────

    pub fn add_listener(&mut self, listener: Box<dyn SystemListener>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(ListenerEntry { id, listener });
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> Option<Box<dyn SystemListener>> {
        let pos = self.listeners.iter().position(|e| e.id == id)?;
        Some(self.listeners.remove(pos).listener)
    }

    /// Borrows a registered listener back as its concrete type.
    pub fn listener_mut<T: SystemListener>(&mut self, id: ListenerId) -> Option<&mut T> {
        let entry = self.listeners.iter_mut().find(|e| e.id == id)?;
        let listener: &mut dyn SystemListener = entry.listener.as_mut();
        listener.as_any_mut().downcast_mut::<T>()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Marks the system running and resets every clock.
    pub fn start(&mut self) {
        self.running = true;
        self.init_vars();
        log::info!(
            "system started ({} step, {:.1} Hz)",
            if self.config.use_fixed_time_step { "fixed" } else { "variable" },
            self.config.frame_rate
        );
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("system stopping at sim time {:.3}s", self.simulation_time);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts the system and steps it until something stops it, then emits `Exit`.
    pub fn run(&mut self) {
        self.start();

        while self.running {
            self.step();
        }

        log::debug!("system exiting");
        self.finish();
        log::debug!("system done exiting");
    }

    /// Emits `Exit`. Hosts that own their own loop call this once on shutdown.
    pub fn finish(&mut self) {
        self.send(SystemMessage::Exit);
    }

    /// Emits `Configure` if the config stage is enabled.
    pub fn config_stage(&mut self) {
        if self.config.stages.has(SystemStage::Config) {
            self.send(SystemMessage::Configure);
        }
    }

    /// One host tick with the real delta measured by the frame clock.
    pub fn step(&mut self) -> StepOutcome {
        if !self.running {
            return StepOutcome::Stopped;
        }

        let real_dt = self.clock.tick().dt;
        self.system_step(real_dt)
    }

    /// One host tick with an explicit real delta in seconds. Deltas below
    /// `f32::EPSILON` fall back to measuring.
    pub fn step_with(&mut self, real_dt: f64) -> StepOutcome {
        if !self.running {
            return StepOutcome::Stopped;
        }

        if real_dt < f32::EPSILON as f64 {
            return self.step();
        }

        // Keep the measured baseline in sync so a later `step()` does not
        // count this span twice.
        self.clock.reset();
        self.system_step(real_dt)
    }

    // ── pause ─────────────────────────────────────────────────────────────

    /// Notifies `PauseStart`/`PauseEnd` only when the state actually changes.
    pub fn set_pause(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }

        self.paused = paused;

        if paused {
            log::info!("system paused at sim time {:.3}s", self.simulation_time);
            self.send(SystemMessage::PauseStart);
        } else {
            log::info!("system resumed");
            self.send(SystemMessage::PauseEnd);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ── time accessors ────────────────────────────────────────────────────

    pub fn simulation_time(&self) -> f64 {
        self.simulation_time
    }

    /// Sets both the simulation time and the real-time-derived correct
    /// simulation time, so no drift is carried across the jump.
    pub fn set_simulation_time(&mut self, t: f64) {
        self.simulation_time = t;
        self.correct_simulation_time = t;
    }

    pub fn correct_simulation_time(&self) -> f64 {
        self.correct_simulation_time
    }

    pub fn sim_time_since_startup(&self) -> f64 {
        self.sim_time_since_startup
    }

    pub fn real_clock_time(&self) -> u64 {
        self.real_clock_time
    }

    pub fn simulation_clock_time(&self) -> u64 {
        self.simulation_clock_time
    }

    pub fn set_simulation_clock_time(&mut self, micros: u64) {
        self.simulation_clock_time = micros;
    }

    pub fn stage_time(&self, stage: SystemStage) -> f64 {
        self.timer.times().get(stage)
    }

    pub fn stage_times(&self) -> &StageTimes {
        self.timer.times()
    }

    // ── config accessors ──────────────────────────────────────────────────

    pub fn frame_rate(&self) -> f64 {
        self.config.frame_rate
    }

    pub fn set_frame_rate(&mut self, hz: f64) {
        if !valid_frame_rate(hz) {
            log::warn!("ignoring invalid frame rate {hz}");
            return;
        }
        self.config.frame_rate = hz;
    }

    pub fn time_scale(&self) -> f64 {
        self.config.time_scale
    }

    /// Negative scales clamp to zero so simulation time never runs backwards.
    pub fn set_time_scale(&mut self, scale: f64) {
        if !scale.is_finite() {
            log::warn!("ignoring non-finite time scale");
            return;
        }
        self.config.time_scale = scale.max(0.0);
    }

    pub fn max_time_between_draws(&self) -> f64 {
        self.config.max_time_between_draws
    }

    pub fn set_max_time_between_draws(&mut self, secs: f64) {
        if secs.is_nan() {
            log::warn!("ignoring NaN max time between draws");
            return;
        }
        self.config.max_time_between_draws = secs;
    }

    pub fn max_simulation_step(&self) -> f64 {
        self.config.max_simulation_step
    }

    pub fn set_max_simulation_step(&mut self, secs: f64) {
        if !valid_max_simulation_step(secs) {
            log::warn!("ignoring invalid max simulation step {secs}");
            return;
        }
        self.config.max_simulation_step = secs;
    }

    pub fn uses_fixed_time_step(&self) -> bool {
        self.config.use_fixed_time_step
    }

    pub fn set_use_fixed_time_step(&mut self, fixed: bool) {
        self.config.use_fixed_time_step = fixed;
    }

    pub fn stages(&self) -> StageFlags {
        self.config.stages
    }

    pub fn set_stages(&mut self, stages: StageFlags) {
        self.config.stages = stages;
    }

    pub fn shutdown_on_window_close(&self) -> bool {
        self.config.shutdown_on_window_close
    }

    pub fn set_shutdown_on_window_close(&mut self, shutdown: bool) {
        self.config.shutdown_on_window_close = shutdown;
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn init_vars(&mut self) {
        self.clock.reset();
        self.real_clock_time = WallClock::now_micros();
        self.sim_time_since_startup = 0.0;
        self.simulation_time = 0.0;
        self.correct_simulation_time = 0.0;
        self.last_draw_clock_time = self.real_clock_time;
        self.simulation_clock_time = self.real_clock_time;
    }

    fn system_step(&mut self, real_dt: f64) -> StepOutcome {
        let real_dt = if real_dt.is_finite() { real_dt.max(0.0) } else { 0.0 };

        self.real_clock_time += secs_to_micros(real_dt);

        let outcome = if self.paused {
            self.step_paused(real_dt)
        } else if self.config.use_fixed_time_step {
            self.step_fixed(real_dt)
        } else {
            self.step_variable(real_dt)
        };

        self.timer.finish_frame();
        log::trace!(
            "tick real_dt={real_dt:.5} sim={:.5} correct={:.5} -> {outcome:?}",
            self.simulation_time,
            self.correct_simulation_time
        );

        outcome
    }

    fn step_paused(&mut self, real_dt: f64) -> StepOutcome {
        self.timer.begin_frame();
        self.was_paused = true;

        let delta = FrameDelta::new(0.0, real_dt);
        self.stage(SystemStage::EventTraversal, delta);
        self.stage(SystemStage::PostEventTraversal, delta);
        self.send(SystemMessage::Pause { real: real_dt });
        self.stage(SystemStage::CameraSynch, delta);
        self.stage(SystemStage::FrameSynch, delta);
        self.stage(SystemStage::Frame, delta);

        StepOutcome::Paused
    }

    fn step_variable(&mut self, real_dt: f64) -> StepOutcome {
        self.timer.begin_frame();
        self.was_paused = false;

        let sim_dt = (real_dt * self.config.time_scale)
            .min(self.config.max_simulation_step)
            .max(0.0);
        self.advance_sim(sim_dt);

        let delta = FrameDelta::new(sim_dt, real_dt);
        self.stage(SystemStage::EventTraversal, delta);
        self.stage(SystemStage::PostEventTraversal, delta);
        self.stage(SystemStage::PreFrame, delta);
        self.stage(SystemStage::CameraSynch, delta);
        self.stage(SystemStage::FrameSynch, delta);
        self.stage(SystemStage::Frame, delta);
        self.stage(SystemStage::PostFrame, delta);

        StepOutcome::Advanced { drawn: true }
    }

    fn step_fixed(&mut self, real_dt: f64) -> StepOutcome {
        let scale = self.config.time_scale;
        let frame_time = self.config.frame_time();
        let step = (frame_time * scale).max(0.0);

        if self.was_paused {
            // Resume with exactly one step instead of the real time spent paused.
            self.correct_simulation_time += step;
            self.was_paused = false;
        } else {
            self.correct_simulation_time += real_dt * scale;
        }

        // Ahead of real time by more than half a step: nothing to do yet.
        if self.correct_simulation_time + 0.5 * step < self.simulation_time + step {
            if let Some(sleep) = self.config.idle_sleep {
                std::thread::sleep(sleep);
            }
            return StepOutcome::Idle;
        }

        self.timer.begin_frame();
        self.advance_sim(step);

        let delta = FrameDelta::new(step, frame_time);
        self.stage(SystemStage::EventTraversal, delta);
        self.stage(SystemStage::PostEventTraversal, delta);
        self.stage(SystemStage::PreFrame, delta);

        let since_draw = self.real_clock_time.saturating_sub(self.last_draw_clock_time);
        let drawn = self.simulation_time >= self.correct_simulation_time
            || since_draw > secs_to_micros(self.config.max_time_between_draws);

        if drawn {
            self.last_draw_clock_time = self.real_clock_time;
            self.stage(SystemStage::CameraSynch, delta);
            self.stage(SystemStage::FrameSynch, delta);
            self.stage(SystemStage::Frame, delta);
        } else {
            log::trace!(
                "skipping draw, {:.4}s behind",
                self.correct_simulation_time - self.simulation_time
            );
            self.timer.carry_last(SystemStage::CameraSynch);
            self.timer.carry_last(SystemStage::FrameSynch);
            self.timer.carry_last(SystemStage::Frame);
        }

        self.stage(SystemStage::PostFrame, delta);

        StepOutcome::Advanced { drawn }
    }

    fn advance_sim(&mut self, sim_dt: f64) {
        self.simulation_time += sim_dt;
        self.sim_time_since_startup += sim_dt;
        self.simulation_clock_time += secs_to_micros(sim_dt);
    }

    fn stage(&mut self, stage: SystemStage, delta: FrameDelta) {
        if !self.config.stages.has(stage) {
            return;
        }

        self.timer.start();
        self.send(SystemMessage::for_stage(stage, delta));
        self.timer.end(stage);
    }

    fn send(&mut self, msg: SystemMessage) {
        let mut ctx = SystemCtx::default();
        for entry in self.listeners.iter_mut() {
            entry.listener.on_message(&msg, &mut ctx);
        }
        self.apply_commands(ctx);
    }

    fn apply_commands(&mut self, mut ctx: SystemCtx) {
        if ctx.is_empty() {
            return;
        }

        let commands: Vec<Command> = ctx.drain().collect();
        for cmd in commands {
            match cmd {
                Command::SetPause(paused) => self.set_pause(paused),
                Command::SetTimeScale(scale) => self.set_time_scale(scale),
                Command::Stop => self.stop(),
            }
        }
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new(SystemConfig::default())
    }
}
