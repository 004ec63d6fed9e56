//! Simplex algorithms over the tableau.
//!
//! This is an implementation of the Cassowary linear constraint solving algorithm,
//! as described in "The Cassowary Linear Arithmetic Constraint Solving Algorithm"
//! by Greg J. Badros and Alan Borning.
//!
//! Pivoting is deterministic: entering variables are taken lowest id first and
//! ratio-test ties go to the lowest-id row (Bland's rule).

use trellis_core::{
    near_zero, ConstraintId, Expression, Result, SolverError, Variable, EPSILON,
};

use crate::solver::Solver;

/// Which expression a primal pass minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// The weighted error objective.
    Objective,
    /// The phase-1 objective of an artificial variable.
    Artificial,
}

/// Keep the candidate with the smaller ratio, then the smaller id.
fn better(candidate: (Variable, f64), best: Option<(Variable, f64)>) -> bool {
    match best {
        None => true,
        Some((var, ratio)) => {
            candidate.1 < ratio || (candidate.1 == ratio && candidate.0 < var)
        }
    }
}

impl Solver {
    /// Pick the variable that becomes basic when `expr` is inserted directly.
    ///
    /// A free external variable wins outright. Otherwise a restricted external
    /// with a negative coefficient (or any, if the constant is zero), and
    /// failing that a pivotable variable with a negative coefficient. A
    /// restricted candidate is only taken if substituting its new row leaves
    /// every restricted row it appears in non-negative.
    pub(crate) fn choose_subject(&self, expr: &Expression) -> Option<Variable> {
        let mut subject = None;
        let mut subject_external = None;
        for (var, coeff) in expr.terms() {
            if var.is_external() {
                if !var.is_restricted() {
                    return Some(var);
                }
                if subject_external.is_none()
                    && (coeff < 0.0 || near_zero(expr.constant()))
                    && self.keeps_rows_feasible(expr, var)
                {
                    subject_external = Some(var);
                }
            } else if subject.is_none()
                && var.is_pivotable()
                && coeff < 0.0
                && self.keeps_rows_feasible(expr, var)
            {
                subject = Some(var);
            }
        }
        subject_external.or(subject)
    }

    /// Whether making `subject` basic with row `expr` keeps the restricted
    /// rows that mention it at or above zero.
    fn keeps_rows_feasible(&self, expr: &Expression, subject: Variable) -> bool {
        let value = -expr.constant() / expr.coefficient(subject);
        self.tableau.column(subject).all(|basic| {
            if !basic.is_restricted() {
                return true;
            }
            self.tableau.row(basic).map_or(true, |row| {
                row.constant() + row.coefficient(subject) * value >= -EPSILON
            })
        })
    }

    /// Insert `expr` through a temporary artificial variable (phase 1).
    ///
    /// The artificial variable is given `expr` as its row and the row value
    /// is minimized. A nonzero minimum means the constraint cannot hold
    /// alongside the existing ones: it is rolled back and reported.
    pub(crate) fn add_with_artificial_variable(
        &mut self,
        id: ConstraintId,
        expr: Expression,
    ) -> Result<()> {
        let av = self.variables.slack();
        self.tableau.add_row(av, expr.clone());
        self.tableau.set_artificial(Some(expr));

        let optimized = self.optimize(Target::Artificial);
        let residual = self
            .tableau
            .artificial()
            .map(Expression::constant)
            .unwrap_or(0.0);
        self.tableau.set_artificial(None);

        if let Err(err) = optimized {
            self.discard_artificial(av);
            self.remove_constraint(id)?;
            return Err(err);
        }

        if !near_zero(residual) {
            let explanation = self
                .config
                .explain_failure
                .then(|| self.build_explanation(id, av));
            self.discard_artificial(av);
            self.remove_constraint(id)?;
            tracing::debug!(constraint = %id, residual, "required constraint is unsatisfiable");
            return Err(match explanation {
                Some(conflicts) => SolverError::RequiredFailureWithExplanation(conflicts),
                None => SolverError::RequiredFailure,
            });
        }

        // The artificial variable sits at zero. Get it out of the basis
        // for good, then forget it.
        let replacement = self.tableau.row(av).map(|row| {
            if row.is_constant() {
                None
            } else {
                row.pivotable_variable().or_else(|| row.variables().min())
            }
        });
        match replacement {
            Some(Some(entry)) => self.tableau.pivot(entry, av)?,
            Some(None) => {
                self.tableau.remove_row(av);
            }
            None => {}
        }
        self.tableau.remove_column(av);
        tracing::debug!(constraint = %id, "added constraint through artificial variable");
        Ok(())
    }

    fn discard_artificial(&mut self, av: Variable) {
        self.tableau.remove_row(av);
        self.tableau.remove_column(av);
    }

    /// The constraints implicated when phase 1 leaves `av` positive: the
    /// owner of every marker still in its row. The constraint being added
    /// (`adding`) is left out since it is about to be rolled back.
    fn build_explanation(&self, adding: ConstraintId, av: Variable) -> Vec<ConstraintId> {
        let mut explanation = Vec::new();
        let mut push = |id: ConstraintId| {
            if id != adding && !explanation.contains(&id) {
                explanation.push(id);
            }
        };

        if let Some(&id) = self.markers.get(&av) {
            push(id);
        }
        if let Some(row) = self.tableau.row(av) {
            for var in row.variables() {
                if let Some(&id) = self.markers.get(&var) {
                    push(id);
                }
            }
        }
        explanation.sort();
        explanation
    }

    pub(crate) fn optimize_objective(&mut self) -> Result<()> {
        self.optimize(Target::Objective)
    }

    /// Minimize `target` by pivoting until no entering variable is left.
    fn optimize(&mut self, target: Target) -> Result<()> {
        loop {
            let entry = match target {
                Target::Objective => match self.tableau.pop_entry() {
                    Some(entry) => {
                        if self.tableau.is_basic(entry)
                            || self.tableau.objective().coefficient(entry) >= 0.0
                        {
                            continue;
                        }
                        Some(entry)
                    }
                    None => None,
                },
                Target::Artificial => self.tableau.artificial().and_then(|objective| {
                    objective
                        .terms()
                        .filter(|&(var, coeff)| var.can_enter() && coeff < 0.0)
                        .map(|(var, _)| var)
                        .min()
                }),
            };

            let Some(entry) = entry else {
                return Ok(());
            };

            let Some(exit) = self.ratio_test(entry) else {
                // keep the entry cache exact for the caller
                self.tableau.update_entry(entry);
                return Err(SolverError::ObjectiveUnbound);
            };
            self.tableau.pivot(entry, exit)?;
        }
    }

    /// The restricted row that most tightly bounds `entry`'s increase.
    fn ratio_test(&self, entry: Variable) -> Option<Variable> {
        let mut best: Option<(Variable, f64)> = None;
        for basic in self.tableau.column(entry) {
            if !basic.is_restricted() {
                continue;
            }
            let Some(row) = self.tableau.row(basic) else {
                continue;
            };
            let coeff = row.coefficient(entry);
            if coeff >= 0.0 {
                continue;
            }
            let ratio = -row.constant() / coeff;
            if better((basic, ratio), best) {
                best = Some((basic, ratio));
            }
        }
        best.map(|(basic, _)| basic)
    }

    /// Drive every queued infeasible row back to a non-negative constant
    /// while keeping the objective optimal.
    pub(crate) fn dual_optimize(&mut self) -> Result<()> {
        while let Some(exit) = self.tableau.pop_infeasible() {
            let Some(row) = self.tableau.row(exit) else {
                continue;
            };
            if row.constant() >= 0.0 {
                continue;
            }

            let objective = self.tableau.objective();
            let mut best: Option<(Variable, f64)> = None;
            for (var, coeff) in row.terms() {
                if coeff <= 0.0 || !var.can_enter() {
                    continue;
                }
                let ratio = objective.coefficient(var) / coeff;
                if better((var, ratio), best) {
                    best = Some((var, ratio));
                }
            }

            let Some((entry, _)) = best else {
                return Err(SolverError::InternalError("dual optimize: no pivot found"));
            };
            self.tableau.pivot(entry, exit)?;
        }
        Ok(())
    }

    /// Choose the row to give up when `marker` must become basic.
    ///
    /// Prefers restricted rows with a negative coefficient (smallest
    /// `-constant / coefficient`), then restricted rows with a positive one
    /// (smallest `constant / coefficient`), then any unrestricted row.
    pub(crate) fn find_exit_var(&self, marker: Variable) -> Option<Variable> {
        let mut negative: Option<(Variable, f64)> = None;
        let mut positive: Option<(Variable, f64)> = None;
        let mut unrestricted: Option<Variable> = None;

        for basic in self.tableau.column(marker) {
            let Some(row) = self.tableau.row(basic) else {
                continue;
            };
            let coeff = row.coefficient(marker);
            if !basic.is_restricted() {
                if unrestricted.map_or(true, |current| basic < current) {
                    unrestricted = Some(basic);
                }
            } else if coeff < 0.0 {
                let ratio = -row.constant() / coeff;
                if better((basic, ratio), negative) {
                    negative = Some((basic, ratio));
                }
            } else {
                let ratio = row.constant() / coeff;
                if better((basic, ratio), positive) {
                    positive = Some((basic, ratio));
                }
            }
        }

        negative
            .or(positive)
            .map(|(basic, _)| basic)
            .or(unrestricted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{Constraint, Strength};

    #[test]
    fn test_choose_subject_prefers_free_external() {
        let mut solver = Solver::new();
        let r = solver.new_restricted_variable();
        let x = solver.new_variable();
        let s = solver.variables.slack();

        let mut expr = Expression::from_constant(5.0);
        expr.add_variable(s, -1.0);
        expr.add_variable(r, -1.0);
        expr.add_variable(x, 2.0);
        assert_eq!(solver.choose_subject(&expr), Some(x));

        expr.erase(x);
        assert_eq!(solver.choose_subject(&expr), Some(r));

        expr.erase(r);
        assert_eq!(solver.choose_subject(&expr), Some(s));
    }

    #[test]
    fn test_choose_subject_restricted_with_zero_constant() {
        let mut solver = Solver::new();
        let r = solver.new_restricted_variable();
        let d = solver.variables.dummy();

        let mut expr = Expression::from_variable(r);
        expr.add_variable(d, -1.0);
        assert_eq!(solver.choose_subject(&expr), Some(r));

        expr.set_constant(3.0);
        assert_eq!(solver.choose_subject(&expr), None);
    }

    #[test]
    fn test_redundant_required_equality() {
        let mut solver = Solver::new();
        let x = solver.new_variable();

        let first = solver.add(Constraint::equal(x, 100.0)).unwrap();
        let second = solver.add(Constraint::equal(x, 100.0)).unwrap();
        solver.solve().unwrap();
        solver.check_invariants().unwrap();
        assert!((solver.value(x) - 100.0).abs() < 1e-8);

        solver.remove(first).unwrap();
        solver.check_invariants().unwrap();
        assert!((solver.value(x) - 100.0).abs() < 1e-8);

        solver.remove(second).unwrap();
        solver.check_invariants().unwrap();
        assert_eq!(solver.constraint_count(), 0);
    }

    #[test]
    fn test_explanation_lists_existing_constraints() {
        let mut solver = Solver::new();
        let (v1, v2) = (solver.new_variable(), solver.new_variable());

        let _low = solver.add(Constraint::greater_or_equal(v1, 10.0)).unwrap();
        let a = solver.add(Constraint::equal(v1, 100.0)).unwrap();
        let b = solver.add(Constraint::equal(v2, 200.0)).unwrap();

        let err = solver.add(Constraint::equal(v1, v2)).unwrap_err();
        assert_eq!(err, SolverError::RequiredFailureWithExplanation(vec![a, b]));
        assert_eq!(solver.constraint_count(), 3);
        solver.check_invariants().unwrap();
    }

    #[test]
    fn test_failure_without_explanation() {
        let mut solver = Solver::new();
        solver.set_explain_failure(false);
        let x = solver.new_variable();

        solver.add(Constraint::equal(x, 1.0)).unwrap();
        let err = solver.add(Constraint::equal(x, 2.0)).unwrap_err();
        assert_eq!(err, SolverError::RequiredFailure);
    }

    #[test]
    fn test_unbounded_objective() {
        let mut solver = Solver::new();
        let x = solver.new_variable();

        // Minimizing the violation of `x >= 0` with a negative weight
        // pulls `x` towards infinity once the required bound is gone.
        let id = solver
            .add(Constraint::greater_or_equal(x, 0.0).with_strength(Strength::WEAK))
            .unwrap();
        let error = solver.constraints[&id].errors[0];
        solver.tableau.add_to_objective(error, -20.0);
        assert_eq!(solver.solve(), Err(SolverError::ObjectiveUnbound));
    }

    #[test]
    fn test_find_exit_var_prefers_restricted_rows() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let s = solver.variables.slack();
        let m = solver.variables.dummy();

        // x = 1 + m, s = 4 - 2m
        let mut row_x = Expression::from_constant(1.0);
        row_x.add_variable(m, 1.0);
        solver.tableau.add_row(x, row_x);
        let mut row_s = Expression::from_constant(4.0);
        row_s.add_variable(m, -2.0);
        solver.tableau.add_row(s, row_s);

        assert_eq!(solver.find_exit_var(m), Some(s));
        solver.tableau.remove_row(s);
        assert_eq!(solver.find_exit_var(m), Some(x));
    }
}
