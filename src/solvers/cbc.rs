//! The open source CBC solver
use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::problem::Problem;
use crate::solvers::{
    Solution, SolverError, SolverProgram, SolverWithSolutionParsing, Status, WithMaxSeconds, WithNbThreads,
};

/// Environment variable holding the path of the cbc executable
pub const CBC_SOLVER_BIN: &str = "CBC_SOLVER_BIN";

/// The CBC command line solver
#[derive(Debug, Clone)]
pub struct CbcSolver {
    command_name: String,
    temp_solution_file: Option<PathBuf>,
    threads: Option<u32>,
    seconds: Option<u32>,
}

impl Default for CbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CbcSolver {
    /// Run the executable named by `CBC_SOLVER_BIN`, or `cbc` from the path
    pub fn new() -> CbcSolver {
        CbcSolver {
            command_name: env::var(CBC_SOLVER_BIN).unwrap_or_else(|_| "cbc".to_string()),
            temp_solution_file: None,
            threads: None,
            seconds: None,
        }
    }

    /// Set the cbc executable to run
    pub fn command_name(&self, command_name: String) -> CbcSolver {
        CbcSolver {
            command_name,
            ..self.clone()
        }
    }

    /// Write the solution to the given path instead of a temporary directory
    pub fn with_temp_solution_file(&self, temp_solution_file: impl Into<PathBuf>) -> CbcSolver {
        CbcSolver {
            temp_solution_file: Some(temp_solution_file.into()),
            ..self.clone()
        }
    }
}

/// Map the first word of a cbc solution file to a status
fn parse_status(word: &str) -> Status {
    match word {
        "Optimal" => Status::Optimal,
        // "Infeasible" or "Integer infeasible"
        "Infeasible" | "Integer" => Status::Infeasible,
        "Unbounded" => Status::Unbounded,
        // "Stopped on time", "on iterations", "on difficulties" or "on ctrl-c"
        _ => Status::NotSolved,
    }
}

impl SolverWithSolutionParsing for CbcSolver {
    fn read_specific_solution(&self, f: &File, problem: Option<&Problem>) -> Result<Solution, SolverError> {
        let mut vars_value: HashMap<String, f64> = HashMap::new();

        // cbc may only list non-zero values
        if let Some(p) = problem {
            for var in p.variables().chain(p.slack_variables()) {
                vars_value.insert(var.name().to_string(), 0.);
            }
        }

        let mut file = BufReader::new(f);
        let mut buffer = String::new();
        file.read_line(&mut buffer)?;
        let status = match buffer.split_whitespace().next() {
            Some(word) => parse_status(word),
            None => return Err(SolverError::Format("missing status line".to_string())),
        };

        for line in file.lines() {
            let line = line?;
            if line.trim().len() <= 2 {
                break;
            }
            let mut result_line: Vec<_> = line.split_whitespace().collect();
            // infeasible rows and columns are flagged
            if result_line[0] == "**" {
                result_line.remove(0);
            }
            if result_line.len() < 3 {
                return Err(SolverError::Format(line.clone()));
            }
            let value = result_line[2]
                .parse::<f64>()
                .map_err(|e| SolverError::Format(format!("{}: {}", line, e)))?;
            let name = result_line[1];
            if problem.is_none() || vars_value.contains_key(name) {
                vars_value.insert(name.to_string(), value);
            }
        }
        Ok(Solution::new(status, vars_value))
    }
}

impl WithMaxSeconds<CbcSolver> for CbcSolver {
    fn max_seconds(&self) -> Option<u32> {
        self.seconds
    }
    fn with_max_seconds(&self, seconds: u32) -> CbcSolver {
        CbcSolver {
            seconds: Some(seconds),
            ..(*self).clone()
        }
    }
}

impl WithNbThreads<CbcSolver> for CbcSolver {
    fn nb_threads(&self) -> Option<u32> {
        self.threads
    }
    fn with_nb_threads(&self, threads: u32) -> CbcSolver {
        CbcSolver {
            threads: Some(threads),
            ..(*self).clone()
        }
    }
}

impl SolverProgram for CbcSolver {
    fn command_name(&self) -> &str {
        &self.command_name
    }

    fn arguments(&self, lp_file: &Path, solution_file: &Path) -> Vec<OsString> {
        let mut args = vec![lp_file.as_os_str().to_owned()];
        for (name, value) in [("seconds", self.max_seconds()), ("threads", self.nb_threads())] {
            if let Some(val) = value {
                args.push(name.into());
                args.push(val.to_string().into());
            }
        }
        args.extend_from_slice(&[
            "branch".into(),
            "printingOptions".into(),
            "all".into(),
            "solution".into(),
            solution_file.into(),
        ]);
        args
    }

    fn preferred_temp_solution_file(&self) -> Option<&Path> {
        self.temp_solution_file.as_deref()
    }
}
