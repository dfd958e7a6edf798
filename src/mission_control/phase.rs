use strum_macros::{Display, EnumIter};

/// Mission lifecycle. Declaration order is the only permitted order of traversal.
#[derive(Debug, Display, EnumIter, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Waiting,
    DropDetect,
    LandingDetect,
    Driving,
    Done,
}

impl Phase {
    /// The phase following `self`, `None` for the terminal phase.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Waiting => Some(Phase::DropDetect),
            Phase::DropDetect => Some(Phase::LandingDetect),
            Phase::LandingDetect => Some(Phase::Driving),
            Phase::Driving => Some(Phase::Done),
            Phase::Done => None,
        }
    }

    pub fn is_terminal(self) -> bool { self == Phase::Done }

    /// Whether ticks in this phase consume a GPS position.
    pub fn needs_position(self) -> bool { matches!(self, Phase::Driving | Phase::Done) }
}
