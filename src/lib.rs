#![deny(missing_docs)]
//! An in-memory model of linear and mixed integer problems,
//! a reader and a writer for the .lp file format,
//! and adapters calling external solvers on them.
//!
//! ```
//! use lp_model::constraint::{Constraint, ConstraintSense};
//! use lp_model::expression::Expression;
//! use lp_model::objective::{Objective, ObjectiveSense};
//! use lp_model::problem::Problem;
//! use lp_model::variable::Variable;
//!
//! let x = Variable::continuous("x");
//! let mut problem = Problem::new("test_problem");
//! let objective = Expression::from_terms([(x.clone(), 998.)], 8.);
//! problem
//!     .set_objective(Objective::new("minimize_cpm", objective, ObjectiveSense::Minimize))
//!     .unwrap();
//! let lhs = Expression::from_terms([(x.clone(), 1.)], 0.);
//! problem
//!     .add_constraint(Constraint::new("c1", lhs, ConstraintSense::Geq, Expression::from_constant(2.)))
//!     .unwrap();
//!
//! let lp = problem.to_lp_string().unwrap();
//! let read: Problem = lp.parse().unwrap();
//! assert_eq!(read.to_lp_string().unwrap(), lp);
//! ```

pub mod constraint;
pub mod error;
pub mod expression;
pub mod lp_format;
pub mod lp_reader;
pub mod objective;
pub mod problem;
pub mod solvers;
pub mod util;
pub mod variable;
