//! Incremental linear constraint solving.
//!
//! This crate implements:
//! - The Cassowary simplex engine (incremental add and remove)
//! - Phase-1 insertion through artificial variables, with conflict explanation
//! - Dual re-optimization after constant edits
//! - Strength changes without re-adding constraints
//!
//! ```
//! use trellis_solver::{Constraint, Solver, Strength};
//!
//! let mut solver = Solver::new();
//! solver.set_auto_solve(true);
//! let width = solver.new_variable();
//!
//! solver.add(Constraint::greater_or_equal(width, 100.0)).unwrap();
//! solver
//!     .add(Constraint::equal(width, 40.0).with_strength(Strength::WEAK))
//!     .unwrap();
//!
//! assert!((solver.value(width) - 100.0).abs() < 1e-8);
//! ```

mod config;
mod simplex;
mod solver;
mod tableau;

pub use config::SolverConfig;
pub use solver::Solver;
pub use trellis_core::{
    Constraint, ConstraintId, Expression, Relation, Result, SolverError, Strength, Variable,
    VariableKind,
};
