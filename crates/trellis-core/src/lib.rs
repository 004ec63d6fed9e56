//! Core types for the Trellis constraint solver.
//!
//! This crate defines:
//! - Variables and the allocator that gives them identity
//! - Linear expressions and their operator overloads
//! - Constraints, relations and strengths
//! - The solver error type

mod constraint;
mod error;
mod expression;
mod ops;
mod variable;

pub use constraint::{Constraint, ConstraintId, Relation, Strength};
pub use error::{Result, SolverError};
pub use expression::{near_zero, Expression, TermChange, EPSILON};
pub use variable::{Variable, VariableAllocator, VariableKind};
