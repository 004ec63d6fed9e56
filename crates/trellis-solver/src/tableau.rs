//! The simplex tableau.
//!
//! Rows map each basic variable to the expression defining it. Columns are
//! the reverse index: for every variable, the set of basic variables whose
//! row mentions it. Both are kept in step by every mutation here, so the
//! engine never has to scan the whole tableau.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;
use trellis_core::{Expression, Result, SolverError, TermChange, Variable, EPSILON};

type VarSet = IndexSet<Variable, FxBuildHasher>;
type Rows = IndexMap<Variable, Expression, FxBuildHasher>;
type Columns = IndexMap<Variable, VarSet, FxBuildHasher>;

/// Record that `basic`'s row gained or lost `var`.
fn track(columns: &mut Columns, var: Variable, basic: Variable, change: TermChange) {
    match change {
        TermChange::Added => {
            columns.entry(var).or_default().insert(basic);
        }
        TermChange::Removed => untrack(columns, var, basic),
        TermChange::Updated | TermChange::Unchanged => {}
    }
}

fn untrack(columns: &mut Columns, var: Variable, basic: Variable) {
    if let Some(column) = columns.get_mut(&var) {
        column.swap_remove(&basic);
        if column.is_empty() {
            columns.swap_remove(&var);
        }
    }
}

/// Solver state: rows, columns, objective and the caches derived from them.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tableau {
    rows: Rows,
    columns: Columns,
    /// The objective function row. Minimized by the primal pass.
    objective: Expression,
    /// Phase-1 objective while an artificial variable is in play.
    artificial: Option<Expression>,
    /// Variables able to enter the basis with a negative objective coefficient.
    entry_vars: BTreeSet<Variable>,
    /// Restricted rows driven negative by an edit, awaiting the dual pass.
    infeasible_rows: VarSet,
}

impl Tableau {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_basic(&self, var: Variable) -> bool {
        self.rows.contains_key(&var)
    }

    pub fn row(&self, var: Variable) -> Option<&Expression> {
        self.rows.get(&var)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The basic variables whose rows mention `var`.
    pub fn column(&self, var: Variable) -> impl Iterator<Item = Variable> + '_ {
        self.columns.get(&var).into_iter().flatten().copied()
    }

    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub fn artificial(&self) -> Option<&Expression> {
        self.artificial.as_ref()
    }

    pub fn set_artificial(&mut self, objective: Option<Expression>) {
        self.artificial = objective;
    }

    /// Add `coefficient * var` to `expr`, replacing `var` by its row if basic.
    pub fn add_substituted(&self, expr: &mut Expression, var: Variable, coefficient: f64) {
        match self.rows.get(&var) {
            Some(row) => expr.add_expression(row, coefficient, |_, _| {}),
            None => {
                expr.add_variable(var, coefficient);
            }
        }
    }

    /// Add `delta * var` to the objective, replacing `var` by its row if basic.
    pub fn add_to_objective(&mut self, var: Variable, delta: f64) {
        let touched: Vec<Variable> = match self.rows.get(&var) {
            Some(row) => {
                self.objective.add_expression(row, delta, |_, _| {});
                row.variables().collect()
            }
            None => {
                self.objective.add_variable(var, delta);
                vec![var]
            }
        };
        for var in touched {
            self.update_entry(var);
        }
    }

    /// Refresh `var`'s membership in the entry cache.
    pub fn update_entry(&mut self, var: Variable) {
        if var.can_enter() && self.objective.coefficient(var) < 0.0 {
            self.entry_vars.insert(var);
        } else {
            self.entry_vars.remove(&var);
        }
    }

    /// Take the lowest-id entry candidate.
    pub fn pop_entry(&mut self) -> Option<Variable> {
        self.entry_vars.pop_first()
    }

    pub fn add_row(&mut self, basic: Variable, expr: Expression) {
        for var in expr.variables() {
            self.columns.entry(var).or_default().insert(basic);
        }
        self.rows.insert(basic, expr);
    }

    pub fn remove_row(&mut self, basic: Variable) -> Option<Expression> {
        let row = self.rows.swap_remove(&basic)?;
        self.infeasible_rows.swap_remove(&basic);
        for var in row.variables() {
            untrack(&mut self.columns, var, basic);
        }
        Some(row)
    }

    /// Erase `var` from every row and both objectives.
    pub fn remove_column(&mut self, var: Variable) {
        if let Some(basics) = self.columns.swap_remove(&var) {
            for basic in basics {
                if let Some(row) = self.rows.get_mut(&basic) {
                    row.erase(var);
                }
            }
        }
        self.objective.erase(var);
        if let Some(artificial) = self.artificial.as_mut() {
            artificial.erase(var);
        }
        self.entry_vars.remove(&var);
    }

    /// Replace `old` by `expr` in every row and in the objectives.
    ///
    /// Restricted rows that turn negative are queued as infeasible.
    pub fn substitute_out(&mut self, old: Variable, expr: &Expression) {
        if let Some(basics) = self.columns.swap_remove(&old) {
            for basic in basics {
                let Some(row) = self.rows.get_mut(&basic) else {
                    continue;
                };
                let columns = &mut self.columns;
                row.substitute_out(old, expr, |var, change| track(columns, var, basic, change));
                if basic.is_restricted() && row.constant() < 0.0 {
                    self.infeasible_rows.insert(basic);
                }
            }
        }

        self.objective.substitute_out(old, expr, |_, _| {});
        if let Some(artificial) = self.artificial.as_mut() {
            artificial.substitute_out(old, expr, |_, _| {});
        }

        self.update_entry(old);
        for var in expr.variables() {
            self.update_entry(var);
        }
    }

    /// Make `entry` basic in place of `exit`.
    pub fn pivot(&mut self, entry: Variable, exit: Variable) -> Result<()> {
        let mut expr = self
            .remove_row(exit)
            .ok_or(SolverError::InternalError("pivot: exit variable is not basic"))?;
        if !expr.contains(entry) {
            return Err(SolverError::InternalError(
                "pivot: entry variable is not in the exit row",
            ));
        }
        expr.change_subject(exit, entry);
        self.substitute_out(entry, &expr);
        self.add_row(entry, expr);
        tracing::trace!(%entry, %exit, "pivot");
        Ok(())
    }

    /// Shift the constants of the rows that depend on `marker`.
    ///
    /// `delta` is the change of the constraint's own constant. Since the
    /// marker entered the constraint row with coefficient -1, a basic
    /// marker moves by `+delta` and every other row by
    /// `-coefficient(marker) * delta`.
    pub fn edit_constant(&mut self, marker: Variable, delta: f64) {
        if let Some(row) = self.rows.get_mut(&marker) {
            row.increase_constant(delta);
            if row.constant() < 0.0 {
                self.infeasible_rows.insert(marker);
            }
            return;
        }

        let Some(basics) = self.columns.get(&marker) else {
            return;
        };
        for &basic in basics {
            let Some(row) = self.rows.get_mut(&basic) else {
                continue;
            };
            let coeff = row.coefficient(marker);
            row.increase_constant(-coeff * delta);
            if basic.is_restricted() && row.constant() < 0.0 {
                self.infeasible_rows.insert(basic);
            }
        }
    }

    pub fn pop_infeasible(&mut self) -> Option<Variable> {
        self.infeasible_rows.pop()
    }

    pub fn clear_infeasible(&mut self) {
        self.infeasible_rows.clear();
    }

    /// Validate the tableau invariants, describing the first violation.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (&basic, row) in &self.rows {
            if row.contains(basic) {
                return Err(format!("{basic} appears in its own row"));
            }
            for var in row.variables() {
                if !self.column(var).any(|b| b == basic) {
                    return Err(format!("column {var} is missing row {basic}"));
                }
            }
            if basic.is_restricted()
                && row.constant() < -EPSILON
                && !self.infeasible_rows.contains(&basic)
            {
                return Err(format!("restricted row {basic} is negative: {row}"));
            }
        }

        for (&var, basics) in &self.columns {
            if basics.is_empty() {
                return Err(format!("column {var} is empty but still indexed"));
            }
            for basic in basics {
                match self.rows.get(basic) {
                    Some(row) if row.contains(var) => {}
                    _ => return Err(format!("column {var} lists {basic} which lacks it")),
                }
            }
        }

        for var in self.objective.variables() {
            if self.is_basic(var) {
                return Err(format!("basic variable {var} appears in the objective"));
            }
        }

        let expected: BTreeSet<Variable> = self
            .objective
            .terms()
            .filter(|&(var, coeff)| var.can_enter() && coeff < 0.0)
            .map(|(var, _)| var)
            .collect();
        if expected != self.entry_vars {
            return Err(format!(
                "entry cache {:?} does not match objective {:?}",
                self.entry_vars, expected
            ));
        }

        Ok(())
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "objective = {}", self.objective)?;
        for (basic, row) in &self.rows {
            writeln!(f, "{basic} = {row}")?;
        }
        Ok(())
    }
}
