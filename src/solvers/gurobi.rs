//! The proprietary gurobi solver
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::problem::Problem;
use crate::solvers::{Solution, SolverError, SolverProgram, SolverWithSolutionParsing, Status, WithMaxSeconds};

/// Relative MIP gap at which gurobi stops, unless configured otherwise
pub const DEFAULT_MIP_GAP: f64 = 0.1;

/// The proprietary gurobi solver
#[derive(Debug, Clone)]
pub struct GurobiSolver {
    command_name: String,
    temp_solution_file: Option<PathBuf>,
    mip_gap: f64,
    seconds: Option<u32>,
}

impl Default for GurobiSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl GurobiSolver {
    /// create a solver instance
    pub fn new() -> GurobiSolver {
        GurobiSolver {
            command_name: "gurobi_cl".to_string(),
            temp_solution_file: None,
            mip_gap: DEFAULT_MIP_GAP,
            seconds: None,
        }
    }

    /// set the name of the commandline gurobi executable to use
    pub fn command_name(&self, command_name: String) -> GurobiSolver {
        GurobiSolver {
            command_name,
            ..self.clone()
        }
    }

    /// Write the solution to the given path instead of a temporary directory
    pub fn with_temp_solution_file(&self, temp_solution_file: impl Into<PathBuf>) -> GurobiSolver {
        GurobiSolver {
            temp_solution_file: Some(temp_solution_file.into()),
            ..self.clone()
        }
    }

    /// Relative gap between the best bound and the incumbent at which the search stops
    pub fn mip_gap(&self) -> f64 {
        self.mip_gap
    }

    /// Stop the search at the given relative gap (`MIPGap` parameter)
    pub fn with_mip_gap(&self, mip_gap: f64) -> GurobiSolver {
        GurobiSolver {
            mip_gap,
            ..self.clone()
        }
    }
}

impl WithMaxSeconds<GurobiSolver> for GurobiSolver {
    fn max_seconds(&self) -> Option<u32> {
        self.seconds
    }
    fn with_max_seconds(&self, seconds: u32) -> GurobiSolver {
        GurobiSolver {
            seconds: Some(seconds),
            ..self.clone()
        }
    }
}

impl SolverWithSolutionParsing for GurobiSolver {
    fn read_specific_solution(&self, f: &File, problem: Option<&Problem>) -> Result<Solution, SolverError> {
        let mut vars_value: HashMap<String, f64> = HashMap::new();
        if let Some(p) = problem {
            for var in p.variables().chain(p.slack_variables()) {
                vars_value.insert(var.name().to_string(), 0.);
            }
        }

        let mut file = BufReader::new(f);
        let mut buffer = String::new();
        if file.read_line(&mut buffer)? == 0 {
            return Err(SolverError::Format("empty solution file".to_string()));
        }

        for line in file.lines() {
            let line = line?;
            // Gurobi version 7 add comments on the header file
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let result_line: Vec<_> = line.split_whitespace().collect();
            if result_line.len() != 2 {
                return Err(SolverError::Format(line.clone()));
            }
            let value = result_line[1]
                .parse::<f64>()
                .map_err(|e| SolverError::Format(format!("{}: {}", line, e)))?;
            vars_value.insert(result_line[0].to_string(), value);
        }
        // the actual status is read from the standard output
        Ok(Solution::new(Status::Optimal, vars_value))
    }
}

impl SolverProgram for GurobiSolver {
    fn command_name(&self) -> &str {
        &self.command_name
    }

    fn arguments(&self, lp_file: &Path, solution_file: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![format!("MIPGap={}", self.mip_gap).into()];
        if let Some(seconds) = self.seconds {
            args.push(format!("TimeLimit={}", seconds).into());
        }
        let mut result_file: OsString = "ResultFile=".into();
        result_file.push(solution_file.as_os_str());
        args.push(result_file);
        args.push(lp_file.into());
        args
    }

    fn preferred_temp_solution_file(&self) -> Option<&Path> {
        self.temp_solution_file.as_deref()
    }

    fn parse_stdout_status(&self, stdout: &[u8]) -> Option<Status> {
        if buf_contains(stdout, "Optimal solution found") {
            Some(Status::Optimal)
        } else if buf_contains(stdout, "infeasible") {
            Some(Status::Infeasible)
        } else if buf_contains(stdout, "unbounded") {
            Some(Status::Unbounded)
        } else {
            None
        }
    }
}

fn buf_contains(haystack: &[u8], needle: &str) -> bool {
    let needle = needle.as_bytes();
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}
