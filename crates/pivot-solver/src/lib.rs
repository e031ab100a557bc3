mod problem;
mod simplex;
mod solution;

pub use problem::{Constraint, ConstraintViolation, Problem, ProblemError, Relation};
pub use simplex::{Solver, solve};
pub use solution::{Solution, SolutionStatus};
