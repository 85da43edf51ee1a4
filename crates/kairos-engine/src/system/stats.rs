use std::time::Instant;

use super::stage::SystemStage;

/// Wall-clock cost of the most recent dispatch of each stage, in milliseconds.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct StageTimes {
    stages: [f64; SystemStage::COUNT],
    /// Sum of every stage timed (or carried) during the last frame.
    pub total: f64,
}

impl StageTimes {
    pub fn get(&self, stage: SystemStage) -> f64 {
        self.stages[stage.index()]
    }
}

/// Accumulates per-stage timings across one pump tick.
#[derive(Debug, Default)]
pub(crate) struct StageTimer {
    times: StageTimes,
    frame_total: f64,
    started: Option<Instant>,
}

impl StageTimer {
    pub(crate) fn begin_frame(&mut self) {
        self.frame_total = 0.0;
    }

    pub(crate) fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    pub(crate) fn end(&mut self, stage: SystemStage) -> f64 {
        let elapsed = self
            .started
            .take()
            .map(|t| t.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0);

        self.frame_total += elapsed;
        self.times.stages[stage.index()] = elapsed;
        elapsed
    }

    /// A skipped stage contributes its previous cost so the frame total stays
    /// comparable between drawn and undrawn fixed steps.
    pub(crate) fn carry_last(&mut self, stage: SystemStage) {
        self.frame_total += self.times.stages[stage.index()];
    }

    pub(crate) fn finish_frame(&mut self) {
        self.times.total = self.frame_total;
    }

    pub(crate) fn times(&self) -> &StageTimes {
        &self.times
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carry_adds_previous_cost_to_total() {
        let mut timer = StageTimer::default();
        timer.times.stages[SystemStage::Frame.index()] = 4.0;

        timer.begin_frame();
        timer.carry_last(SystemStage::Frame);
        timer.finish_frame();

        assert_eq!(timer.times().total, 4.0);
        assert_eq!(timer.times().get(SystemStage::Frame), 4.0);
    }

    #[test]
    fn end_without_start_records_zero() {
        let mut timer = StageTimer::default();
        assert_eq!(timer.end(SystemStage::PreFrame), 0.0);
    }

    #[test]
    fn begin_frame_resets_total() {
        let mut timer = StageTimer::default();
        timer.start();
        timer.end(SystemStage::PreFrame);
        timer.finish_frame();

        timer.begin_frame();
        timer.finish_frame();
        assert_eq!(timer.times().total, 0.0);
    }
}
