use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// One notification stage of the frame pump, in dispatch order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum SystemStage {
    EventTraversal = 0,
    PostEventTraversal = 1,
    PreFrame = 2,
    CameraSynch = 3,
    FrameSynch = 4,
    Frame = 5,
    PostFrame = 6,
    Config = 7,
}

impl SystemStage {
    pub const COUNT: usize = 8;

    pub const ALL: [SystemStage; Self::COUNT] = [
        SystemStage::EventTraversal,
        SystemStage::PostEventTraversal,
        SystemStage::PreFrame,
        SystemStage::CameraSynch,
        SystemStage::FrameSynch,
        SystemStage::Frame,
        SystemStage::PostFrame,
        SystemStage::Config,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Message name emitted for this stage.
    pub fn name(self) -> &'static str {
        match self {
            SystemStage::EventTraversal => "eventtraversal",
            SystemStage::PostEventTraversal => "posteventtraversal",
            SystemStage::PreFrame => "preframe",
            SystemStage::CameraSynch => "camerasynch",
            SystemStage::FrameSynch => "framesynch",
            SystemStage::Frame => "frame",
            SystemStage::PostFrame => "postframe",
            SystemStage::Config => "configure",
        }
    }
}

impl fmt::Display for SystemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of enabled stages. A disabled stage is neither dispatched nor timed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct StageFlags(u32);

impl StageFlags {
    pub const NONE: StageFlags = StageFlags(0);
    pub const DEFAULT: StageFlags = StageFlags((1 << SystemStage::COUNT) - 1);

    pub fn from_stages(stages: &[SystemStage]) -> Self {
        stages.iter().fold(Self::NONE, |acc, s| acc | *s)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn has(self, stage: SystemStage) -> bool {
        self.0 & stage.bit() != 0
    }

    pub fn with(self, stage: SystemStage) -> Self {
        StageFlags(self.0 | stage.bit())
    }

    pub fn without(self, stage: SystemStage) -> Self {
        StageFlags(self.0 & !stage.bit())
    }
}

impl Default for StageFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BitOr<SystemStage> for StageFlags {
    type Output = StageFlags;

    fn bitor(self, rhs: SystemStage) -> StageFlags {
        self.with(rhs)
    }
}

impl BitOr for StageFlags {
    type Output = StageFlags;

    fn bitor(self, rhs: StageFlags) -> StageFlags {
        StageFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign<SystemStage> for StageFlags {
    fn bitor_assign(&mut self, rhs: SystemStage) {
        *self = self.with(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_every_stage() {
        for stage in SystemStage::ALL {
            assert!(StageFlags::DEFAULT.has(stage), "{stage} disabled");
        }
    }

    #[test]
    fn none_disables_every_stage() {
        for stage in SystemStage::ALL {
            assert!(!StageFlags::NONE.has(stage));
        }
    }

    #[test]
    fn without_clears_only_that_stage() {
        let flags = StageFlags::DEFAULT.without(SystemStage::Frame);
        assert!(!flags.has(SystemStage::Frame));
        assert!(flags.has(SystemStage::FrameSynch));
        assert!(flags.has(SystemStage::PostFrame));
    }

    #[test]
    fn from_stages_sets_listed_bits() {
        let flags = StageFlags::from_stages(&[SystemStage::PreFrame, SystemStage::PostFrame]);
        assert!(flags.has(SystemStage::PreFrame));
        assert!(flags.has(SystemStage::PostFrame));
        assert!(!flags.has(SystemStage::Frame));
        assert_eq!(flags.bits(), SystemStage::PreFrame.bit() | SystemStage::PostFrame.bit());
    }
}
