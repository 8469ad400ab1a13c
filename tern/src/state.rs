//! Solver result state.

/// Verdict of the search so far.
///
/// `Unknown` means the search has not finished; the other two values are final for the loaded
/// formula.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SatState {
    Unknown,
    Sat,
    Unsat,
}

impl SatState {
    /// Whether the search still has work to do.
    pub fn is_open(self) -> bool {
        self == SatState::Unknown
    }
}

impl Default for SatState {
    fn default() -> SatState {
        SatState::Unknown
    }
}

/// Solver state shared by all search strategies.
///
/// Kept deliberately small; anything bigger belongs in its own part of
/// [`Context`](crate::context::Context).
#[derive(Default)]
pub struct SolverState {
    pub sat_state: SatState,
}
