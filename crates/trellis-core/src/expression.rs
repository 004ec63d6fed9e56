//! Linear expressions of the form `constant + Σ(coefficient * variable)`.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::variable::Variable;

/// Tolerance for floating-point comparisons.
pub const EPSILON: f64 = 1e-8;

/// Near-zero check for floating point values.
pub fn near_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

type Terms = IndexMap<Variable, f64, FxBuildHasher>;

/// What happened to a term when a coefficient was added to it.
///
/// The tableau uses this to keep its column index in step with its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermChange {
    /// The variable was absent and now has a coefficient.
    Added,
    /// The variable was present and still is.
    Updated,
    /// The coefficient cancelled out and the term was dropped.
    Removed,
    /// The variable was absent and the delta was zero.
    Unchanged,
}

/// A linear expression. Zero coefficients are never stored.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expression {
    constant: f64,
    terms: Terms,
}

impl Expression {
    /// The zero expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a constant expression.
    pub fn from_constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: Terms::default(),
        }
    }

    /// Create an expression from a single variable.
    pub fn from_variable(var: Variable) -> Self {
        Self::from_term(var, 1.0)
    }

    /// Create `coefficient * var`.
    pub fn from_term(var: Variable, coefficient: f64) -> Self {
        let mut expr = Self::new();
        expr.add_variable(var, coefficient);
        expr
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn set_constant(&mut self, value: f64) {
        self.constant = value;
    }

    pub fn increase_constant(&mut self, delta: f64) {
        self.constant += delta;
    }

    /// Iterate over `(variable, coefficient)` pairs.
    pub fn terms(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.terms.iter().map(|(&v, &c)| (v, c))
    }

    /// Iterate over the variables with a nonzero coefficient.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.terms.keys().copied()
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True when the expression has no terms (only a constant).
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Coefficient of `var`, or 0 if absent.
    pub fn coefficient(&self, var: Variable) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, var: Variable) -> bool {
        self.terms.contains_key(&var)
    }

    /// Add `coefficient * var`, dropping the term if it cancels out.
    pub fn add_variable(&mut self, var: Variable, coefficient: f64) -> TermChange {
        match self.terms.get_mut(&var) {
            Some(existing) => {
                *existing += coefficient;
                if near_zero(*existing) {
                    self.terms.swap_remove(&var);
                    TermChange::Removed
                } else {
                    TermChange::Updated
                }
            }
            None if near_zero(coefficient) => TermChange::Unchanged,
            None => {
                self.terms.insert(var, coefficient);
                TermChange::Added
            }
        }
    }

    /// Add `multiplier * other`, reporting every touched term to `on_change`.
    pub fn add_expression(
        &mut self,
        other: &Expression,
        multiplier: f64,
        mut on_change: impl FnMut(Variable, TermChange),
    ) {
        self.constant += other.constant * multiplier;
        for (&var, &coeff) in &other.terms {
            let change = self.add_variable(var, coeff * multiplier);
            on_change(var, change);
        }
    }

    /// Multiply the expression by a scalar.
    pub fn multiply(&mut self, scalar: f64) {
        self.constant *= scalar;
        for coeff in self.terms.values_mut() {
            *coeff *= scalar;
        }
    }

    pub fn negate(&mut self) {
        self.multiply(-1.0);
    }

    /// Rearrange `0 = self` so that `subject` is its subject.
    ///
    /// Divides every term by `-coefficient(subject)` and drops `subject`,
    /// leaving the expression that `subject` equals. No-op if `subject`
    /// is not a term.
    pub fn solve_for(&mut self, subject: Variable) {
        let Some(coeff) = self.terms.swap_remove(&subject) else {
            return;
        };
        self.multiply(-1.0 / coeff);
    }

    /// Turn `old = self` into `new = ...`, where `new` is one of the terms.
    pub fn change_subject(&mut self, old: Variable, new: Variable) {
        self.add_variable(old, -1.0);
        self.solve_for(new);
    }

    /// Replace `var` by `expr`, distributing its coefficient.
    ///
    /// Returns the coefficient `var` had, or `None` if it was absent.
    /// Every term touched (including `var` itself) is reported to
    /// `on_change`.
    pub fn substitute_out(
        &mut self,
        var: Variable,
        expr: &Expression,
        mut on_change: impl FnMut(Variable, TermChange),
    ) -> Option<f64> {
        let coeff = self.terms.swap_remove(&var)?;
        on_change(var, TermChange::Removed);
        self.add_expression(expr, coeff, on_change);
        Some(coeff)
    }

    /// Remove `var` from the expression. Returns whether it was present.
    pub fn erase(&mut self, var: Variable) -> bool {
        self.terms.swap_remove(&var).is_some()
    }

    /// The first pivotable variable among the terms.
    pub fn pivotable_variable(&self) -> Option<Variable> {
        self.terms.keys().copied().find(Variable::is_pivotable)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::from_constant(value)
    }
}

impl From<Variable> for Expression {
    fn from(var: Variable) -> Self {
        Expression::from_variable(var)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.constant)?;
        for (var, coeff) in self.terms() {
            if coeff < 0.0 {
                write!(f, " - {}*{}", -coeff, var)?;
            } else {
                write!(f, " + {}*{}", coeff, var)?;
            }
        }
        Ok(())
    }
}
