//! This module provides the interface to external solvers.
//!
//! A solver receives a completed [Problem], written to a temporary .lp file,
//! and reports a [Solution]. [SolverTrait::solve] also stores the solution values
//! in the problem variables.
//!
//! The solvers need to be installed on your system. The CBC executable can be given
//! through the `CBC_SOLVER_BIN` environment variable.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::path::Path;
use std::process::Command;

pub use crate::error::SolverError;
use crate::error::ModelError;
use crate::problem::Problem;
use crate::variable::{VarType, Variable};

pub use self::cbc::*;
pub use self::gurobi::*;

pub mod cbc;
pub mod gurobi;

/// Solution values this close to an integer or to a bound are moved onto it
pub const SNAP_TOLERANCE: f64 = 1e-6;

/// Outcome of a solver run
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Status {
    /// An optimal solution was found
    Optimal,
    /// No solution satisfies the constraints
    Infeasible,
    /// The objective can be improved without limit
    Unbounded,
    /// The solver stopped without a conclusion
    NotSolved,
}

/// What a solver returns: a status and a value per variable name
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solver status
    pub status: Status,
    /// Variable values, by variable name
    pub results: HashMap<String, f64>,
}

impl Solution {
    /// Create a solution
    pub fn new(status: Status, results: HashMap<String, f64>) -> Solution {
        Solution { status, results }
    }

    /// Store the values in the variables and slack variables of `problem`.
    ///
    /// Variables missing from the results take the value 0. Every value is
    /// checked before any is stored, so a rejected value leaves the problem untouched.
    pub fn apply(&self, problem: &Problem) -> Result<(), ModelError> {
        let values = problem
            .variables()
            .chain(problem.slack_variables())
            .map(|variable| -> Result<(&Variable, f64), ModelError> {
                let value = self.results.get(variable.name()).copied().unwrap_or(0.);
                let value = snap(variable, value);
                variable.check_value(value)?;
                Ok((variable, value))
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (variable, value) in values {
            variable.set_value(value)?;
        }
        Ok(())
    }
}

/// Remove the numerical noise of solver output
fn snap(variable: &Variable, mut value: f64) -> f64 {
    if variable.var_type() != VarType::Continuous {
        let rounded = value.round();
        if (value - rounded).abs() <= SNAP_TOLERANCE {
            value = rounded;
        }
    }
    if let Some(low) = variable.low_bound() {
        if value < low && low - value <= SNAP_TOLERANCE {
            value = low;
        }
    }
    if let Some(up) = variable.up_bound() {
        if value > up && value - up <= SNAP_TOLERANCE {
            value = up;
        }
    }
    value
}

/// A solver
pub trait SolverTrait {
    /// Solve the problem, leaving its variables untouched
    fn run(&self, problem: &Problem) -> Result<Solution, SolverError>;

    /// Solve the problem. When an optimal solution is found, its values are
    /// stored in the problem variables.
    fn solve(&self, problem: &Problem) -> Result<Status, SolverError> {
        let solution = self.run(problem)?;
        if solution.status == Status::Optimal {
            solution.apply(problem)?;
        }
        Ok(solution.status)
    }
}

/// A solver that writes its results to a solution file
pub trait SolverWithSolutionParsing {
    /// Read and then delete the solution file.
    /// With a problem, variables the file leaves out are reported as 0.
    fn read_solution(&self, solution_file: &Path, problem: Option<&Problem>) -> Result<Solution, SolverError> {
        let f = File::open(solution_file).map_err(|source| SolverError::SolutionFile {
            path: solution_file.to_path_buf(),
            source,
        })?;
        let solution = self.read_specific_solution(&f, problem)?;
        let _ = fs::remove_file(solution_file);
        Ok(solution)
    }

    /// Parse the solver specific solution format
    fn read_specific_solution(&self, f: &File, problem: Option<&Problem>) -> Result<Solution, SolverError>;
}

/// A solver whose running time can be limited
pub trait WithMaxSeconds<T> {
    /// Time limit in seconds
    fn max_seconds(&self) -> Option<u32>;
    /// A copy of the solver with the given time limit
    fn with_max_seconds(&self, seconds: u32) -> T;
}

/// A solver whose number of threads can be set
pub trait WithNbThreads<T> {
    /// Number of threads
    fn nb_threads(&self) -> Option<u32>;
    /// A copy of the solver using the given number of threads
    fn with_nb_threads(&self, threads: u32) -> T;
}

/// A solver run as an external program, reading an .lp file and writing a solution file
pub trait SolverProgram {
    /// Executable to run
    fn command_name(&self) -> &str;

    /// Command line arguments
    fn arguments(&self, lp_file: &Path, solution_file: &Path) -> Vec<OsString>;

    /// Where to write the solution, instead of a temporary directory
    fn preferred_temp_solution_file(&self) -> Option<&Path> {
        None
    }

    /// Status printed by the program, for programs that do not write it to the solution file
    fn parse_stdout_status(&self, _stdout: &[u8]) -> Option<Status> {
        None
    }
}

impl<T: SolverProgram + SolverWithSolutionParsing> SolverTrait for T {
    fn run(&self, problem: &Problem) -> Result<Solution, SolverError> {
        let command_name = self.command_name();
        let lp_file = problem.to_tmp_file()?;
        let temp_dir = tempfile::tempdir()?;
        let solution_file = match self.preferred_temp_solution_file() {
            Some(path) => path.to_path_buf(),
            None => temp_dir.path().join("solution.sol"),
        };

        tracing::debug!(
            component = "solvers",
            operation = "run",
            status = "started",
            command = command_name,
            problem = problem.name(),
            lp_file = %lp_file.path().display(),
            "Launching solver"
        );
        let output = Command::new(command_name)
            .args(self.arguments(lp_file.path(), &solution_file))
            .output()
            .map_err(|source| SolverError::Launch {
                command: command_name.to_string(),
                source,
            })?;
        if !output.status.success() {
            tracing::warn!(
                component = "solvers",
                operation = "run",
                status = "failed",
                command = command_name,
                exit_status = %output.status,
                "Solver exited with an error"
            );
            return Err(SolverError::Failed {
                command: command_name.to_string(),
                status: output.status,
            });
        }

        let stdout_status = self.parse_stdout_status(&output.stdout);
        let mut solution = match (solution_file.exists(), stdout_status) {
            (true, _) => self.read_solution(&solution_file, Some(problem))?,
            (false, Some(status)) => Solution::new(status, HashMap::new()),
            (false, None) => {
                return Err(SolverError::MissingSolution {
                    command: command_name.to_string(),
                })
            }
        };
        if let Some(status) = stdout_status {
            solution.status = status;
        }
        tracing::debug!(
            component = "solvers",
            operation = "run",
            status = "ok",
            command = command_name,
            result = ?solution.status,
            values = solution.results.len(),
            "Solver finished"
        );
        Ok(solution)
    }
}
