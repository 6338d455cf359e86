//! Ordered classifications produced while probing single-variable moves

/// How a move relates to the feasible region while the solve is infeasible
///
/// Ordered best to worst, so `<` means "better".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Locality {
    /// Every constraint holds after the move
    GlobalValid,
    /// Constraints touching the moved variable hold and the penalty dropped
    LocalValid,
    /// Penalty dropped but local constraints are still violated
    CrossRegion,
    /// Penalty unchanged
    Invalid,
    /// Penalty grew but local constraints hold
    Alternative,
    /// Move impossible, already visited, or strictly harmful
    Reject,
}

impl Locality {
    /// Moves that bring the search closer to feasibility
    pub const fn is_improving(self) -> bool {
        matches!(self, Self::GlobalValid | Self::LocalValid | Self::CrossRegion)
    }
}

/// How a move affects a feasible point
///
/// Ordered best to worst, so `<` means "better".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TunePriority {
    /// Stays feasible and strictly lowers the objective
    Harmless,
    /// Stays feasible with the same objective while tightening buffer use
    Dilated,
    /// Stays feasible with no measurable change
    Normal,
    /// Stays feasible but raises the objective
    Other,
    /// Leaves the feasible region
    Tabu,
    /// Move impossible or lands on an already searched point
    Refuse,
}

impl TunePriority {
    /// Moves worth committing during fine-tuning
    pub const fn is_improving(self) -> bool {
        matches!(self, Self::Harmless | Self::Dilated)
    }
}

/// Role of a general-solver constraint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// Plain inequality
    Leq,
    /// Capacity of an on-chip buffer
    Buffer,
}

/// Function whose finite differences steer a descent probe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuncInfo {
    /// Squared violation over every constraint
    Leq,
    /// Squared violation over buffer constraints only
    Buffer,
    /// Remaining buffer capacity; descending means denser use
    Slack,
}

/// Direction of a single-variable move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateDirection {
    /// Increase the value
    Positive,
    /// Decrease the value
    Negative,
    /// No direction lowers the probed function
    None,
}

impl UpdateDirection {
    /// Direction of travel as a boolean, `None` for a stationary move
    pub const fn is_positive(self) -> Option<bool> {
        match self {
            Self::Positive => Some(true),
            Self::Negative => Some(false),
            Self::None => None,
        }
    }
}
