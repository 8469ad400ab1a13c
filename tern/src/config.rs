//! Solver configuration.

/// Selects the search algorithm and the heuristics that run on top of it.
///
/// All strategies share the propagation engine and the trail. The DPLL strategy backtracks
/// chronologically and learns nothing; the CDCL strategies differ only in branching and restart
/// behavior.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolverStrategy {
    /// Chronological backtracking without clause learning.
    Dpll,
    /// CDCL with a fixed branching order, no restarts.
    CdclBasic,
    /// CDCL with VSIDS branching, no restarts.
    CdclVsids,
    /// CDCL with VSIDS branching, Luby restarts and clause database reduction.
    CdclVsidsLuby,
}

impl SolverStrategy {
    /// All strategies, in the order they are usually raced.
    pub const ALL: [SolverStrategy; 4] = [
        SolverStrategy::Dpll,
        SolverStrategy::CdclBasic,
        SolverStrategy::CdclVsids,
        SolverStrategy::CdclVsidsLuby,
    ];

    /// The name used to select this strategy on the command line.
    pub fn name(self) -> &'static str {
        match self {
            SolverStrategy::Dpll => "dpll",
            SolverStrategy::CdclBasic => "cdcl_basic",
            SolverStrategy::CdclVsids => "cdcl_vsids",
            SolverStrategy::CdclVsidsLuby => "cdcl_vsids_luby",
        }
    }

    /// Parse a strategy name, inverse of [`name`](SolverStrategy::name).
    pub fn from_name(name: &str) -> Option<SolverStrategy> {
        SolverStrategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name() == name)
    }

    pub(crate) fn is_dpll(self) -> bool {
        self == SolverStrategy::Dpll
    }

    pub(crate) fn uses_vsids(self) -> bool {
        match self {
            SolverStrategy::CdclVsids | SolverStrategy::CdclVsidsLuby => true,
            _ => false,
        }
    }

    pub(crate) fn uses_restarts(self) -> bool {
        self == SolverStrategy::CdclVsidsLuby
    }

    pub(crate) fn uses_reduction(self) -> bool {
        self == SolverStrategy::CdclVsidsLuby
    }
}

impl Default for SolverStrategy {
    fn default() -> SolverStrategy {
        SolverStrategy::CdclVsidsLuby
    }
}

/// Configurable parameters used during solving.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// The search strategy to run.
    pub strategy: SolverStrategy,

    /// Multiplicative decay for the VSIDS decision heuristic.
    pub vsids_decay: f64,

    /// Multiplicative decay for learned clause activities.
    pub clause_activity_decay: f64,

    /// Scaling factor for Luby sequence based restarts (number of conflicts).
    pub luby_restart_interval_scale: u64,

    /// Number of conflicts before the first learned clause reduction.
    pub reduce_first_interval: u64,

    /// Increase of the reduction interval after each reduction.
    pub reduce_interval_growth: u64,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            strategy: SolverStrategy::default(),
            vsids_decay: 0.95,
            clause_activity_decay: 0.999,
            luby_restart_interval_scale: 100,
            reduce_first_interval: 2000,
            reduce_interval_growth: 500,
        }
    }
}

impl SolverConfig {
    /// Default configuration running the given strategy.
    pub fn with_strategy(strategy: SolverStrategy) -> SolverConfig {
        SolverConfig {
            strategy,
            ..SolverConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_roundtrip() {
        for &strategy in SolverStrategy::ALL.iter() {
            assert_eq!(SolverStrategy::from_name(strategy.name()), Some(strategy));
        }
        assert_eq!(SolverStrategy::from_name("minisat"), None);
    }
}
