//! Operator overloads for building expressions.
//!
//! `Variable`, `Expression` and `f64` combine with `+`, `-`, `*` and `/`
//! into an [`Expression`]. Multiplying two expressions is not supported:
//! the solver only handles linear terms.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::expression::Expression;
use crate::variable::Variable;

impl AddAssign<Expression> for Expression {
    fn add_assign(&mut self, rhs: Expression) {
        self.add_expression(&rhs, 1.0, |_, _| {});
    }
}

impl AddAssign<Variable> for Expression {
    fn add_assign(&mut self, rhs: Variable) {
        self.add_variable(rhs, 1.0);
    }
}

impl AddAssign<f64> for Expression {
    fn add_assign(&mut self, rhs: f64) {
        self.increase_constant(rhs);
    }
}

impl SubAssign<Expression> for Expression {
    fn sub_assign(&mut self, rhs: Expression) {
        self.add_expression(&rhs, -1.0, |_, _| {});
    }
}

impl SubAssign<Variable> for Expression {
    fn sub_assign(&mut self, rhs: Variable) {
        self.add_variable(rhs, -1.0);
    }
}

impl SubAssign<f64> for Expression {
    fn sub_assign(&mut self, rhs: f64) {
        self.increase_constant(-rhs);
    }
}

impl MulAssign<f64> for Expression {
    fn mul_assign(&mut self, rhs: f64) {
        self.multiply(rhs);
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(mut self) -> Expression {
        self.negate();
        self
    }
}

impl Neg for Variable {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::from_term(self, -1.0)
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;

    fn mul(mut self, rhs: f64) -> Expression {
        self.multiply(rhs);
        self
    }
}

impl Mul<Expression> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        rhs * self
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        Expression::from_term(self, rhs)
    }
}

impl Mul<Variable> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Variable) -> Expression {
        Expression::from_term(rhs, self)
    }
}

impl Div<f64> for Expression {
    type Output = Expression;

    fn div(mut self, rhs: f64) -> Expression {
        self.multiply(1.0 / rhs);
        self
    }
}

impl Div<f64> for Variable {
    type Output = Expression;

    fn div(self, rhs: f64) -> Expression {
        Expression::from_term(self, 1.0 / rhs)
    }
}

/// `Add` and `Sub` for every left operand that converts into an
/// expression, against every right operand `AddAssign`/`SubAssign` accept.
macro_rules! impl_additive {
    ($lhs:ty => $($rhs:ty),+) => {
        $(
            impl Add<$rhs> for $lhs {
                type Output = Expression;

                fn add(self, rhs: $rhs) -> Expression {
                    let mut expr: Expression = self.into();
                    expr += rhs;
                    expr
                }
            }

            impl Sub<$rhs> for $lhs {
                type Output = Expression;

                fn sub(self, rhs: $rhs) -> Expression {
                    let mut expr: Expression = self.into();
                    expr -= rhs;
                    expr
                }
            }
        )+
    };
}

impl_additive!(Expression => Expression, Variable, f64);
impl_additive!(Variable => Expression, Variable, f64);
impl_additive!(f64 => Expression, Variable);

#[cfg(test)]
mod tests {
    use crate::variable::VariableAllocator;

    #[test]
    fn test_build_expression() {
        let mut alloc = VariableAllocator::new();
        let (v1, v2, v3) = (alloc.external(), alloc.external(), alloc.external());

        // 2*v1 + v2 - (v3 + 3)
        let expr = 2.0 * v1 + v2 - (v3 + 3.0);
        assert_eq!(expr.coefficient(v1), 2.0);
        assert_eq!(expr.coefficient(v2), 1.0);
        assert_eq!(expr.coefficient(v3), -1.0);
        assert_eq!(expr.constant(), -3.0);
    }

    #[test]
    fn test_cancellation_and_scaling() {
        let mut alloc = VariableAllocator::new();
        let (x, y) = (alloc.external(), alloc.external());

        let expr = (x + y - x) * 4.0 / 2.0;
        assert!(!expr.contains(x));
        assert_eq!(expr.coefficient(y), 2.0);

        let neg = -(10.0 - y);
        assert_eq!(neg.coefficient(y), 1.0);
        assert_eq!(neg.constant(), -10.0);
    }
}
