//! Solver configuration.

/// Behaviour switches for a [`Solver`](crate::Solver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    /// Re-optimize after every add, remove and strength change.
    ///
    /// When off, call [`Solver::solve`](crate::Solver::solve) before
    /// reading values.
    pub auto_solve: bool,
    /// Attach the conflicting constraints to a required-failure error.
    pub explain_failure: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            auto_solve: false,
            explain_failure: true,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_solve(mut self, auto_solve: bool) -> Self {
        self.auto_solve = auto_solve;
        self
    }

    pub fn with_explain_failure(mut self, explain_failure: bool) -> Self {
        self.explain_failure = explain_failure;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert!(!config.auto_solve);
        assert!(config.explain_failure);

        let config = SolverConfig::new()
            .with_auto_solve(true)
            .with_explain_failure(false);
        assert!(config.auto_solve);
        assert!(!config.explain_failure);
    }
}
