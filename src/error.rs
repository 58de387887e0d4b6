//! Error types for model building, reading and writing .lp files, and running solvers.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while building or mutating a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Lower bound above upper bound, or a NaN bound
    #[error("bounds [{lower:?}, {upper:?}] of variable {name} are invalid: they must be numbers and lower cannot be above upper")]
    InvalidBounds {
        /// Variable name
        name: String,
        /// Rejected lower bound
        lower: Option<f64>,
        /// Rejected upper bound
        upper: Option<f64>,
    },

    /// Value outside of the variable bounds
    #[error("value {value} of variable {name} cannot be outside of its bounds [{lower:?}, {upper:?}]")]
    OutOfBounds {
        /// Variable name
        name: String,
        /// Rejected value
        value: f64,
        /// Current lower bound
        lower: Option<f64>,
        /// Current upper bound
        upper: Option<f64>,
    },

    /// Value not representable by the variable type
    #[error("value {value} of variable {name} must match var_type {var_type}")]
    TypeMismatch {
        /// Variable name
        name: String,
        /// Rejected value
        value: f64,
        /// Type of the variable
        var_type: &'static str,
    },

    /// Variable evaluated before a value was assigned
    #[error("value of variable {0} is None")]
    UnsetValue(String),

    /// Unknown variable type
    #[error("var_type must be one of Continuous, Integer, Binary, not {0}")]
    InvalidVarType(String),

    /// Unknown constraint or objective sense
    #[error("sense must be one of {expected}, not {found}")]
    InvalidSense {
        /// Accepted senses
        expected: &'static str,
        /// The rejected text
        found: String,
    },

    /// Negative or non-finite slack penalty
    #[error("slack penalty must be finite and non-negative (got {0})")]
    InvalidSlackPenalty(f64),

    /// Another variable is registered under the same name
    #[error("LP variable name {0} conflicts with an existing LP variable")]
    VariableNameConflict(String),

    /// Another constraint is registered under the same name
    #[error("LP constraint name {0} conflicts with an existing LP constraint")]
    ConstraintNameConflict(String),

    /// The problem already has an objective
    #[error("LP objective is already set")]
    ObjectiveAlreadySet,
}

/// The rule broken by an invalid variable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    /// Starts with a digit or a period
    LeadingDigitOrPeriod,
    /// Contains a whitespace character
    Whitespace,
    /// Contains a reserved or non printable character
    ForbiddenCharacter(char),
}

impl fmt::Display for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRule::LeadingDigitOrPeriod => {
                f.write_str("A variable name should not begin with a number or a period")
            }
            NameRule::Whitespace => f.write_str("A variable name should not have whitespaces"),
            NameRule::ForbiddenCharacter(c) => {
                write!(f, "A variable name should not contain the character {:?}", c)
            }
        }
    }
}

/// Errors raised while parsing an .lp document. Parsing aborts on the first one.
#[derive(Error, Debug)]
pub enum ReadError {
    /// No `Minimize` or `Maximize` section
    #[error("file must start with an objective")]
    MissingObjective,

    /// No `End` keyword
    #[error("file must end with an \"end\" keyword")]
    MissingEnd,

    /// Constraint text that does not parse, as found in the document
    #[error("constraint {0} doesn't appear to be valid")]
    InvalidConstraint(String),

    /// Bound declaration that does not parse
    #[error("bound {0} doesn't appear to be valid")]
    InvalidBound(String),

    /// Malformed or NaN number
    #[error("invalid numeric literal {0}")]
    InvalidNumber(String),

    /// Name breaking one of the naming rules
    #[error("variable '{name}' does not have a valid name: {rule}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// The broken rule
        rule: NameRule,
    },

    /// Declared bounds the variable refuses
    #[error("bounds of variable {name} are inconsistent: {source}")]
    InvalidVariableBound {
        /// Variable name
        name: String,
        /// Validation failure
        #[source]
        source: ModelError,
    },

    /// The document defines the same name twice
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Reading the source failed
    #[error("unable to read lp content: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while writing a problem in the .lp format.
#[derive(Error, Debug)]
pub enum WriteError {
    /// The problem has no objective
    #[error("No objective")]
    NoObjective,

    /// A variable name the .lp format cannot hold
    #[error("name {name} is longer than the {max} characters allowed in lp files")]
    NameTooLong {
        /// The long name
        name: String,
        /// Maximum length
        max: usize,
    },

    /// Formatting failed
    #[error(transparent)]
    Fmt(#[from] fmt::Error),

    /// Writing to the sink failed
    #[error("unable to write lp file: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while running an external solver or reading its solution.
#[derive(Error, Debug)]
pub enum SolverError {
    /// The problem could not be written for the solver
    #[error("unable to write the problem file: {0}")]
    Write(#[from] WriteError),

    /// The solver program could not be started
    #[error("error running {command}: {source}")]
    Launch {
        /// Executable
        command: String,
        /// Launch failure
        #[source]
        source: io::Error,
    },

    /// The solver program exited with an error
    #[error("{command} exited with {status}")]
    Failed {
        /// Executable
        command: String,
        /// Exit status of the process
        status: ExitStatus,
    },

    /// Neither a solution file nor a status on stdout
    #[error("{command} did not write a solution file")]
    MissingSolution {
        /// Executable
        command: String,
    },

    /// The solution file could not be opened
    #[error("unable to open solution file {path}: {source}")]
    SolutionFile {
        /// Solution file
        path: PathBuf,
        /// Open failure
        #[source]
        source: io::Error,
    },

    /// Unexpected solution file content
    #[error("incorrect solution format: {0}")]
    Format(String),

    /// Scratch file handling failed
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A solution value the variable refuses
    #[error("cannot store the solution: {0}")]
    Model(#[from] ModelError),
}
