//! Execution targets

/// Target a connection can execute on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Interactive hardware access
    Hardware,
    /// Hardware access through a scheduling daemon
    HardwareNonInteractive,
    /// Simulation
    Simulation,
}

impl Target {
    /// Whether this target fulfils `restriction`
    pub fn satisfies(self, restriction: TargetRestriction) -> bool {
        matches!(
            (self, restriction),
            (
                Target::Hardware | Target::HardwareNonInteractive,
                TargetRestriction::Hardware
            ) | (Target::Simulation, TargetRestriction::Simulation)
        )
    }
}

/// Restriction of an object (e.g. a program) to a single kind of target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRestriction {
    /// Only runs on hardware
    Hardware,
    /// Only runs in simulation
    Simulation,
}

impl TargetRestriction {
    /// Every restriction, for iteration
    pub const ALL: [TargetRestriction; 2] =
        [TargetRestriction::Hardware, TargetRestriction::Simulation];
}

impl std::fmt::Display for TargetRestriction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hardware => write!(f, "hardware"),
            Self::Simulation => write!(f, "simulation"),
        }
    }
}
