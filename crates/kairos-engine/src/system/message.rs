use super::stage::SystemStage;

/// Simulation and real deltas carried by every per-stage message, in seconds.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct FrameDelta {
    pub sim: f64,
    pub real: f64,
}

impl FrameDelta {
    pub fn new(sim: f64, real: f64) -> Self {
        Self { sim, real }
    }
}

/// Notifications emitted by the frame pump.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SystemMessage {
    EventTraversal(FrameDelta),
    PostEventTraversal(FrameDelta),
    PreFrame(FrameDelta),
    CameraSynch(FrameDelta),
    FrameSynch(FrameDelta),
    Frame(FrameDelta),
    PostFrame(FrameDelta),
    /// Emitted once per tick while paused, carrying only the real delta.
    Pause { real: f64 },
    PauseStart,
    PauseEnd,
    Configure,
    Exit,
}

impl SystemMessage {
    pub(crate) fn for_stage(stage: SystemStage, delta: FrameDelta) -> Self {
        match stage {
            SystemStage::EventTraversal => SystemMessage::EventTraversal(delta),
            SystemStage::PostEventTraversal => SystemMessage::PostEventTraversal(delta),
            SystemStage::PreFrame => SystemMessage::PreFrame(delta),
            SystemStage::CameraSynch => SystemMessage::CameraSynch(delta),
            SystemStage::FrameSynch => SystemMessage::FrameSynch(delta),
            SystemStage::Frame => SystemMessage::Frame(delta),
            SystemStage::PostFrame => SystemMessage::PostFrame(delta),
            SystemStage::Config => SystemMessage::Configure,
        }
    }

    /// Stable message name.
    pub fn name(&self) -> &'static str {
        match self {
            SystemMessage::EventTraversal(_) => SystemStage::EventTraversal.name(),
            SystemMessage::PostEventTraversal(_) => SystemStage::PostEventTraversal.name(),
            SystemMessage::PreFrame(_) => SystemStage::PreFrame.name(),
            SystemMessage::CameraSynch(_) => SystemStage::CameraSynch.name(),
            SystemMessage::FrameSynch(_) => SystemStage::FrameSynch.name(),
            SystemMessage::Frame(_) => SystemStage::Frame.name(),
            SystemMessage::PostFrame(_) => SystemStage::PostFrame.name(),
            SystemMessage::Pause { .. } => "pause",
            SystemMessage::PauseStart => "pause_start",
            SystemMessage::PauseEnd => "pause_end",
            SystemMessage::Configure => SystemStage::Config.name(),
            SystemMessage::Exit => "exit",
        }
    }

    /// Deltas for per-stage messages; `None` for lifecycle messages.
    pub fn delta(&self) -> Option<FrameDelta> {
        match *self {
            SystemMessage::EventTraversal(d)
            | SystemMessage::PostEventTraversal(d)
            | SystemMessage::PreFrame(d)
            | SystemMessage::CameraSynch(d)
            | SystemMessage::FrameSynch(d)
            | SystemMessage::Frame(d)
            | SystemMessage::PostFrame(d) => Some(d),
            _ => None,
        }
    }
}
