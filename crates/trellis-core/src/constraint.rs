//! Constraints and strengths.

use std::fmt;

use crate::expression::Expression;

/// The relation of a constraint (equality or inequality).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relation {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::LessOrEqual => "<=",
            Relation::Equal => "==",
            Relation::GreaterOrEqual => ">=",
        })
    }
}

/// Constraint strength levels.
///
/// Non-required constraints contribute their weight times their violation
/// to the objective the solver minimizes.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Strength(f64);

impl Strength {
    pub const REQUIRED: Strength = Strength(1000.0);
    pub const STRONG: Strength = Strength(750.0);
    pub const MEDIUM: Strength = Strength(250.0);
    pub const WEAK: Strength = Strength(10.0);

    /// Create a custom strength, clamped into `[0, REQUIRED]`.
    pub fn new(weight: f64) -> Self {
        if weight.is_nan() {
            return Self(0.0);
        }
        Self(weight.clamp(0.0, Self::REQUIRED.0))
    }

    pub fn weight(&self) -> f64 {
        self.0
    }

    /// Check if this is a required constraint.
    pub fn is_required(&self) -> bool {
        self.0 >= Self::REQUIRED.0
    }
}

impl Default for Strength {
    fn default() -> Self {
        Self::REQUIRED
    }
}

/// Handle to a constraint added to a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintId(pub(crate) u64);

impl ConstraintId {
    /// Create an id. Solvers number their constraints with this.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A linear constraint `expression RELATION 0`.
///
/// Inequalities are stored normalised to `expression >= 0`: a `<=`
/// constraint keeps the negated expression. The relation as written is kept
/// so that [`Constraint::rhs_constant`] can report the constant the
/// constraint was written against.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint {
    expression: Expression,
    relation: Relation,
    strength: Strength,
}

impl Constraint {
    /// Create `expression RELATION 0`.
    pub fn new(mut expression: Expression, relation: Relation, strength: Strength) -> Self {
        if relation == Relation::LessOrEqual {
            expression.negate();
        }
        Self {
            expression,
            relation,
            strength,
        }
    }

    /// Required `lhs == rhs`.
    pub fn equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::new(lhs.into() - rhs.into(), Relation::Equal, Strength::REQUIRED)
    }

    /// Required `lhs <= rhs`.
    pub fn less_or_equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::new(lhs.into() - rhs.into(), Relation::LessOrEqual, Strength::REQUIRED)
    }

    /// Required `lhs >= rhs`.
    pub fn greater_or_equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::new(lhs.into() - rhs.into(), Relation::GreaterOrEqual, Strength::REQUIRED)
    }

    /// Replace the strength.
    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.strength = strength;
        self
    }

    /// The normalised expression: `== 0` for equalities, `>= 0` otherwise.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub fn set_strength(&mut self, strength: Strength) {
        self.strength = strength;
    }

    pub fn weight(&self) -> f64 {
        self.strength.weight()
    }

    pub fn is_required(&self) -> bool {
        self.strength.is_required()
    }

    pub fn is_inequality(&self) -> bool {
        self.relation != Relation::Equal
    }

    /// The constant the constraint compares against: 100 for `v == 100`,
    /// `v <= 100` and `v >= 100` alike.
    pub fn rhs_constant(&self) -> f64 {
        match self.relation {
            Relation::LessOrEqual => self.expression.constant(),
            Relation::Equal | Relation::GreaterOrEqual => -self.expression.constant(),
        }
    }

    /// The stored expression constant that corresponds to `rhs`.
    pub fn constant_for_rhs(&self, rhs: f64) -> f64 {
        match self.relation {
            Relation::LessOrEqual => rhs,
            Relation::Equal | Relation::GreaterOrEqual => -rhs,
        }
    }

    /// Move the constraint to compare against `rhs`.
    pub fn set_rhs_constant(&mut self, rhs: f64) {
        let constant = self.constant_for_rhs(rhs);
        self.expression.set_constant(constant);
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relation = if self.is_inequality() {
            Relation::GreaterOrEqual
        } else {
            Relation::Equal
        };
        write!(
            f,
            "{} {} 0 | {}",
            self.expression,
            relation,
            self.strength.weight()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableAllocator;

    #[test]
    fn test_strength() {
        assert_eq!(Strength::REQUIRED.weight(), 1000.0);
        assert_eq!(Strength::STRONG.weight(), 750.0);
        assert_eq!(Strength::MEDIUM.weight(), 250.0);
        assert_eq!(Strength::WEAK.weight(), 10.0);
        assert!(Strength::REQUIRED.is_required());
        assert!(!Strength::STRONG.is_required());
        assert_eq!(Strength::new(5000.0), Strength::REQUIRED);
        assert_eq!(Strength::new(-1.0).weight(), 0.0);
        assert_eq!(Strength::new(f64::NAN).weight(), 0.0);
    }

    #[test]
    fn test_constructor() {
        let mut alloc = VariableAllocator::new();
        let (v1, v2, v3) = (alloc.external(), alloc.external(), alloc.external());

        let c1 = Constraint::equal(v1, 0.0);
        assert_eq!(c1.relation(), Relation::Equal);
        assert!(c1.is_required());
        assert!(!c1.is_inequality());
        assert_eq!(c1.weight(), 1000.0);

        let c2 = Constraint::greater_or_equal(v2, 5.0).with_strength(Strength::STRONG);
        assert_eq!(c2.relation(), Relation::GreaterOrEqual);
        assert!(!c2.is_required());
        assert!(c2.is_inequality());
        assert_eq!(c2.weight(), 750.0);

        let c3 = Constraint::less_or_equal(v3, -5.0).with_strength(Strength::WEAK);
        assert_eq!(c3.relation(), Relation::LessOrEqual);
        assert!(c3.is_inequality());
        assert_eq!(c3.weight(), 10.0);
    }

    #[test]
    fn test_operation() {
        let mut alloc = VariableAllocator::new();
        let (v1, v2, v3) = (alloc.external(), alloc.external(), alloc.external());

        let c1 = Constraint::equal(v1, v2);
        let expr = c1.expression();
        assert_eq!(expr.coefficient(v1), 1.0);
        assert_eq!(expr.coefficient(v2), -1.0);
        assert_eq!(expr.constant(), 0.0);

        let c2 = Constraint::greater_or_equal(2.0 * v1 + v2, v3 + 3.0);
        let expr2 = c2.expression();
        assert_eq!(expr2.coefficient(v1), 2.0);
        assert_eq!(expr2.coefficient(v2), 1.0);
        assert_eq!(expr2.coefficient(v3), -1.0);
        assert_eq!(expr2.constant(), -3.0);

        // stored as rhs - lhs so that it reads `>= 0`
        let c3 = Constraint::less_or_equal(v2, 1.0 * v3 - 2.0 * v2 - 5.0);
        let expr3 = c3.expression();
        assert_eq!(expr3.coefficient(v1), 0.0);
        assert_eq!(expr3.coefficient(v2), -3.0);
        assert_eq!(expr3.coefficient(v3), 1.0);
        assert_eq!(expr3.constant(), -5.0);
    }

    #[test]
    fn test_rhs_constant() {
        let mut alloc = VariableAllocator::new();
        let v = alloc.external();

        let mut eq = Constraint::equal(v, 100.0);
        assert_eq!(eq.rhs_constant(), 100.0);
        eq.set_rhs_constant(150.0);
        assert_eq!(eq.expression().constant(), -150.0);

        let mut le = Constraint::less_or_equal(v, 100.0);
        assert_eq!(le.rhs_constant(), 100.0);
        le.set_rhs_constant(20.0);
        assert_eq!(le.expression().constant(), 20.0);

        let ge = Constraint::greater_or_equal(v, 10.0);
        assert_eq!(ge.rhs_constant(), 10.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_strength_serde() {
        let json = serde_json::to_string(&Strength::MEDIUM).unwrap();
        let back: Strength = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Strength::MEDIUM);
    }
}
