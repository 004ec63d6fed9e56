//! The public solver interface.
//!
//! [`Solver`] owns the tableau and the bookkeeping that ties each added
//! constraint to the auxiliary variables it introduced. The simplex
//! algorithms themselves live in `simplex.rs`.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use trellis_core::{
    near_zero, Constraint, ConstraintId, Expression, Result, SolverError, Strength, Variable,
    VariableAllocator,
};

use crate::config::SolverConfig;
use crate::tableau::Tableau;

/// Bookkeeping for an added constraint.
#[derive(Debug, Clone)]
pub(crate) struct ConstraintInfo {
    pub constraint: Constraint,
    /// The slack, dummy or error variable that identifies the constraint's row.
    pub marker: Variable,
    /// Error variables weighted into the objective.
    pub errors: SmallVec<[Variable; 2]>,
}

/// An incremental Cassowary constraint solver.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    pub(crate) config: SolverConfig,
    pub(crate) variables: VariableAllocator,
    pub(crate) tableau: Tableau,
    pub(crate) constraints: IndexMap<ConstraintId, ConstraintInfo, FxBuildHasher>,
    /// Marker variable -> constraint that introduced it.
    pub(crate) markers: IndexMap<Variable, ConstraintId, FxBuildHasher>,
    next_constraint: u64,
}

impl Solver {
    /// Create a new solver with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> SolverConfig {
        self.config
    }

    pub fn set_auto_solve(&mut self, auto_solve: bool) {
        self.config.auto_solve = auto_solve;
    }

    pub fn set_explain_failure(&mut self, explain_failure: bool) {
        self.config.explain_failure = explain_failure;
    }

    /// Create a new free variable.
    pub fn new_variable(&mut self) -> Variable {
        self.variables.external()
    }

    /// Create a new variable that must stay non-negative.
    pub fn new_restricted_variable(&mut self) -> Variable {
        self.variables.restricted()
    }

    /// Add a constraint to the solver.
    ///
    /// A required constraint that cannot be satisfied together with the
    /// existing ones is rolled back and reported as
    /// [`SolverError::RequiredFailureWithExplanation`] (or
    /// [`SolverError::RequiredFailure`] when explanations are disabled).
    pub fn add(&mut self, constraint: Constraint) -> Result<ConstraintId> {
        let id = ConstraintId::new(self.next_constraint);
        self.next_constraint += 1;

        tracing::debug!(constraint = %id, relation = %constraint.relation(), "adding constraint");

        let expr = self.expression_for(id, constraint);
        match self.choose_subject(&expr) {
            Some(subject) => self.install_row(subject, expr),
            None => {
                if let Err(err) = self.add_with_artificial_variable(id, expr) {
                    // phase 1 pivots survive the rollback
                    if self.config.auto_solve {
                        self.solve()?;
                    }
                    return Err(err);
                }
            }
        }

        if self.config.auto_solve {
            self.solve()?;
        }
        Ok(id)
    }

    /// Remove a previously added constraint.
    pub fn remove(&mut self, id: ConstraintId) -> Result<()> {
        self.remove_constraint(id)?;
        tracing::debug!(constraint = %id, "removed constraint");

        if self.config.auto_solve {
            self.solve()?;
        }
        Ok(())
    }

    /// Move a constraint to compare against `value` (`v == 100` becomes
    /// `v == value`) without removing and re-adding it.
    ///
    /// Unknown ids are a caller bug: they trip a debug assertion and are
    /// ignored in release builds.
    pub fn update_constant(&mut self, id: ConstraintId, value: f64) {
        debug_assert!(
            self.constraints.contains_key(&id),
            "update_constant on unknown constraint {id}"
        );
        let Some(info) = self.constraints.get_mut(&id) else {
            return;
        };

        let current = info.constraint.expression().constant();
        let delta = info.constraint.constant_for_rhs(value) - current;
        if near_zero(delta) {
            return;
        }

        let marker = info.marker;
        info.constraint.set_rhs_constant(value);
        self.tableau.edit_constant(marker, delta);
        tracing::debug!(constraint = %id, value, delta, "updated constant");
        self.resolve();
    }

    /// Change the strength of a non-required constraint.
    ///
    /// Required constraints are fixed: moving a constraint to or from
    /// [`Strength::REQUIRED`] is ignored.
    pub fn update_strength(&mut self, id: ConstraintId, strength: Strength) -> Result<()> {
        let info = self
            .constraints
            .get_mut(&id)
            .ok_or(SolverError::ConstraintNotFound(id))?;

        if info.constraint.strength() == strength {
            return Ok(());
        }
        if info.constraint.is_required() || strength.is_required() {
            tracing::warn!(
                constraint = %id,
                from = info.constraint.weight(),
                to = strength.weight(),
                "ignoring strength change involving a required constraint"
            );
            return Ok(());
        }

        let delta = strength.weight() - info.constraint.weight();
        info.constraint.set_strength(strength);
        let errors = info.errors.clone();
        for error in errors {
            self.tableau.add_to_objective(error, delta);
        }
        tracing::debug!(constraint = %id, weight = strength.weight(), "updated strength");

        if self.config.auto_solve {
            self.solve()?;
        }
        Ok(())
    }

    /// Minimize the objective.
    pub fn solve(&mut self) -> Result<()> {
        self.optimize_objective()
    }

    /// The current value of `variable`.
    ///
    /// Basic variables report their row constant. Non-basic external
    /// variables from this solver are parametric and report 0. Anything
    /// else (including variables of another solver with an id this one
    /// never handed out) is `None`.
    pub fn value_for(&self, variable: Variable) -> Option<f64> {
        if let Some(row) = self.tableau.row(variable) {
            return Some(row.constant());
        }
        if variable.is_external() && self.variables.owns(variable) {
            return Some(0.0);
        }
        None
    }

    /// The current value of `variable`, or 0.
    pub fn value(&self, variable: Variable) -> f64 {
        self.value_for(variable).unwrap_or(0.0)
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(&id).map(|info| &info.constraint)
    }

    pub fn has_constraint(&self, id: ConstraintId) -> bool {
        self.constraints.contains_key(&id)
    }

    /// Iterate over the active constraints in insertion order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &Constraint)> {
        self.constraints
            .iter()
            .map(|(&id, info)| (id, &info.constraint))
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Drop every constraint. Variables stay valid.
    pub fn reset(&mut self) {
        self.tableau.clear();
        self.constraints.clear();
        self.markers.clear();
        tracing::debug!("solver reset");
    }

    /// Validate the tableau invariants.
    #[doc(hidden)]
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.tableau.check_invariants()?;
        for (id, info) in &self.constraints {
            if self.markers.get(&info.marker) != Some(id) {
                return Err(format!("marker {} of {id} is not mapped back", info.marker));
            }
        }
        if self.markers.len() != self.constraints.len() {
            return Err("marker table and constraint table differ in size".to_string());
        }
        Ok(())
    }

    /// Translate a constraint into a tableau expression and record its
    /// bookkeeping.
    ///
    /// Basic variables are replaced by their rows. Inequalities get a slack
    /// (and an error variable when not required), required equalities a
    /// dummy, and other equalities a plus/minus error pair.
    fn expression_for(&mut self, id: ConstraintId, constraint: Constraint) -> Expression {
        let source = constraint.expression();
        let mut expr = Expression::from_constant(source.constant());
        for (var, coeff) in source.terms() {
            self.tableau.add_substituted(&mut expr, var, coeff);
        }

        let weight = constraint.weight();
        let mut errors = SmallVec::new();
        let marker = if constraint.is_inequality() {
            let slack = self.variables.slack();
            expr.add_variable(slack, -1.0);
            if !constraint.is_required() {
                let error = self.variables.error();
                expr.add_variable(error, 1.0);
                self.tableau.add_to_objective(error, weight);
                errors.push(error);
            }
            slack
        } else if constraint.is_required() {
            let dummy = self.variables.dummy();
            expr.add_variable(dummy, -1.0);
            dummy
        } else {
            let plus = self.variables.error();
            let minus = self.variables.error();
            expr.add_variable(plus, -1.0);
            expr.add_variable(minus, 1.0);
            self.tableau.add_to_objective(plus, weight);
            self.tableau.add_to_objective(minus, weight);
            errors.push(plus);
            errors.push(minus);
            plus
        };

        if expr.constant() < 0.0 {
            expr.negate();
        }

        self.markers.insert(marker, id);
        self.constraints.insert(
            id,
            ConstraintInfo {
                constraint,
                marker,
                errors,
            },
        );
        expr
    }

    /// Solve `expr` for `subject` and make it the subject's row.
    pub(crate) fn install_row(&mut self, subject: Variable, mut expr: Expression) {
        expr.solve_for(subject);
        self.tableau.substitute_out(subject, &expr);
        self.tableau.add_row(subject, expr);
    }

    /// Undo a constraint: drop its error terms and eliminate its marker.
    pub(crate) fn remove_constraint(&mut self, id: ConstraintId) -> Result<()> {
        let info = self
            .constraints
            .shift_remove(&id)
            .ok_or(SolverError::ConstraintNotFound(id))?;

        let weight = info.constraint.weight();
        for &error in &info.errors {
            self.tableau.add_to_objective(error, -weight);
            if self.tableau.is_basic(error) {
                self.tableau.remove_row(error);
            }
        }

        let marker = info.marker;
        self.markers.shift_remove(&marker);

        if !self.tableau.is_basic(marker) {
            if let Some(exit) = self.find_exit_var(marker) {
                self.tableau.pivot(marker, exit)?;
            }
        }
        if self.tableau.is_basic(marker) {
            self.tableau.remove_row(marker);
        }
        Ok(())
    }

    /// Re-establish feasibility after constant edits.
    ///
    /// Failures here mean the tableau was already inconsistent before the
    /// edit; they are logged rather than returned.
    fn resolve(&mut self) {
        if let Err(err) = self.dual_optimize() {
            tracing::error!(error = %err, "dual optimization failed");
        }
        self.tableau.clear_infeasible();
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} constraints, {} rows",
            self.constraints.len(),
            self.tableau.row_count()
        )?;
        write!(f, "{}", self.tableau)
    }
}
