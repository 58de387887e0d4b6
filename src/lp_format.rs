//! Writing problems in the .lp file format
//!
//! The output is deterministic: constraints and bounds are sorted by name, terms by
//! variable name, numbers use at most 12 significant digits and long rows are wrapped
//! at the same points as the legacy tools that consume these files.
use std::fmt;
use std::fmt::Formatter;
use std::fmt::Write as _;
use std::io::prelude::*;

use tempfile::NamedTempFile;

use crate::error::WriteError;
use crate::expression::Expression;
use crate::objective::ObjectiveSense;
use crate::problem::Problem;
use crate::util::format_number;
use crate::variable::{VarType, Variable};

/// Rows are wrapped before reaching this many characters
pub const LP_LINE_LENGTH: usize = 80;

/// Longest variable name accepted in .lp files
pub const MAX_NAME_LENGTH: usize = 255;

/// Name given to an unnamed objective
pub const DEFAULT_OBJECTIVE_NAME: &str = "OBJ";

/// Implemented by types that have a representation in the .lp format
pub trait WriteToLpFileFormat {
    /// Write the object to the given formatter in the .lp format
    fn to_lp_file_format(&self, f: &mut fmt::Formatter) -> fmt::Result;
}

impl<'a, T: WriteToLpFileFormat> WriteToLpFileFormat for &'a T {
    fn to_lp_file_format(&self, f: &mut Formatter) -> fmt::Result {
        (*self).to_lp_file_format(f)
    }
}

/// The declaration of the variable in the `Bounds` section
impl WriteToLpFileFormat for Variable {
    fn to_lp_file_format(&self, f: &mut Formatter) -> fmt::Result {
        if self.is_free() {
            return write!(f, "{} free", self.name());
        }
        let low = self.low_bound();
        if let (true, Some(value)) = (self.is_constant(), low) {
            return write!(f, "{} = {}", self.name(), format_number(value));
        }
        match low {
            None => f.write_str("-inf <= ")?,
            Some(low) if low == 0. && self.var_type() == VarType::Continuous => {}
            Some(low) => write!(f, "{} <= ", format_number(low))?,
        }
        f.write_str(self.name())?;
        if let Some(up) = self.up_bound() {
            write!(f, " <= {}", format_number(up))?;
        }
        Ok(())
    }
}

/// A problem whose `Display` implementation outputs valid .lp syntax
pub struct DisplayedLp<'a>(&'a Problem);

impl<'a> fmt::Display for DisplayedLp<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.to_lp_file_format(f)
    }
}

impl WriteToLpFileFormat for Problem {
    fn to_lp_file_format(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "\\* {} *\\", self.name())?;
        objective_lp_file_block(self, f)?;
        write_constraints_lp_file_block(self, f)?;
        write_bounds_lp_file_block(self, f)?;
        writeln!(f, "End")
    }
}

impl Problem {
    /// Return an object whose [fmt::Display] implementation is the problem in the .lp format.
    ///
    /// Fails as [Problem::check_writable] does, so formatting the result cannot fail.
    pub fn display_lp(&self) -> Result<DisplayedLp<'_>, WriteError> {
        self.check_writable()?;
        Ok(DisplayedLp(self))
    }

    /// Check that the problem can be written in the .lp format
    pub fn check_writable(&self) -> Result<(), WriteError> {
        if self.objective().is_none() {
            return Err(WriteError::NoObjective);
        }
        let too_long = self
            .variables()
            .chain(self.slack_variables())
            .find(|v| v.name().len() > MAX_NAME_LENGTH);
        match too_long {
            Some(variable) => Err(WriteError::NameTooLong {
                name: variable.name().to_string(),
                max: MAX_NAME_LENGTH,
            }),
            None => Ok(()),
        }
    }

    /// The problem in the .lp format
    pub fn to_lp_string(&self) -> Result<String, WriteError> {
        let mut lp = String::new();
        write!(lp, "{}", self.display_lp()?)?;
        tracing::debug!(
            component = "lp_format",
            operation = "write",
            status = "ok",
            problem = self.name(),
            bytes = lp.len(),
            "Wrote lp document"
        );
        Ok(lp)
    }

    /// Write the problem in the .lp format to `sink`, then flush it
    pub fn write_lp<W: Write>(&self, mut sink: W) -> Result<(), WriteError> {
        let lp = self.to_lp_string()?;
        sink.write_all(lp.as_bytes())?;
        sink.flush()?;
        Ok(())
    }

    /// Write the problem to a temporary `.lp` file
    pub fn to_tmp_file(&self) -> Result<NamedTempFile, WriteError> {
        let mut f = tempfile::Builder::new()
            .prefix(self.name())
            .suffix(".lp")
            .tempfile()?;
        self.write_lp(&mut f)?;
        Ok(f)
    }
}

/// Split a row into physical lines, breaking only between terms.
///
/// A term moves to a new line when the current line, its separating spaces
/// and the term would reach `max_line_length` characters.
///
/// ```
/// use lp_model::lp_format::group_terms;
///
/// let terms = ["c1:", "x", "+ y", "<=", "3"].map(String::from);
/// assert_eq!(group_terms(&terms, 80), vec!["c1: x + y <= 3"]);
/// assert_eq!(group_terms(&terms, 10), vec!["c1: x + y", "<= 3"]);
/// ```
pub fn group_terms(terms: &[String], max_line_length: usize) -> Vec<String> {
    let mut lines = vec![];
    let mut line_length = 0;
    let mut start = 0;
    for (i, term) in terms.iter().enumerate() {
        if i > start && line_length + term.len() >= max_line_length {
            lines.push(terms[start..i].join(" "));
            start = i;
            line_length = 0;
        }
        line_length += term.len() + 1;
    }
    if start < terms.len() {
        lines.push(terms[start..].join(" "));
    }
    lines
}

/// The terms of an expression as written in .lp files, in variable name order.
///
/// Zero coefficients are skipped, unit coefficients are implicit and every term
/// but a positive first one carries its sign. An expression without any term is `0`.
pub fn expression_terms(expression: &Expression) -> Vec<String> {
    let mut terms = vec![];
    for (variable, coeff) in expression.sorted_terms() {
        if coeff == 0. {
            continue;
        }
        let sign = match (coeff < 0., terms.is_empty()) {
            (true, _) => "- ",
            (false, true) => "",
            (false, false) => "+ ",
        };
        let magnitude = coeff.abs();
        if magnitude == 1. {
            terms.push(format!("{}{}", sign, variable.name()));
        } else {
            terms.push(format!("{}{} {}", sign, format_number(magnitude), variable.name()));
        }
    }
    let constant = expression.constant();
    if constant < 0. {
        terms.push(format!("- {}", format_number(-constant)));
    } else if constant > 0. && !terms.is_empty() {
        terms.push(format!("+ {}", format_number(constant)));
    } else if constant > 0. || terms.is_empty() {
        terms.push(format_number(constant));
    }
    terms
}

fn write_row(f: &mut Formatter, terms: &[String]) -> fmt::Result {
    for line in group_terms(terms, LP_LINE_LENGTH) {
        writeln!(f, "{}", line)?;
    }
    Ok(())
}

fn objective_lp_file_block(prob: &Problem, f: &mut Formatter) -> fmt::Result {
    let objective = prob.objective().ok_or(fmt::Error)?;
    writeln!(f, "{}", objective.sense())?;

    // Slack penalties enter through the objective
    let penalty_sign = match objective.sense() {
        ObjectiveSense::Minimize => 1.,
        ObjectiveSense::Maximize => -1.,
    };
    let mut expression = objective.expression().clone();
    for constraint in prob.constraints() {
        if let Some(slack_variable) = constraint.slack_variable() {
            expression.add_term(slack_variable, constraint.slack_penalty() * penalty_sign);
        }
    }

    let name = match objective.name() {
        "" => DEFAULT_OBJECTIVE_NAME,
        name => name,
    };
    let mut terms = vec![format!("{}:", name)];
    terms.extend(expression_terms(&expression));
    write_row(f, &terms)
}

fn write_constraints_lp_file_block(prob: &Problem, f: &mut Formatter) -> fmt::Result {
    writeln!(f, "Subject To")?;
    for constraint in prob.constraints() {
        let (expression, constant) = constraint.shifted();
        let mut terms = vec![format!("{}:", constraint.name())];
        terms.extend(expression_terms(&expression));
        terms.push(constraint.sense().operator().to_string());
        terms.push(format_number(constant));
        write_row(f, &terms)?;
    }
    Ok(())
}

fn write_bounds_lp_file_block(prob: &Problem, f: &mut Formatter) -> fmt::Result {
    let bounded: Vec<_> = prob.variables().filter(|v| !v.is_positive_free()).collect();
    if !bounded.is_empty() {
        writeln!(f, "Bounds")?;
        for variable in bounded {
            variable.to_lp_file_format(f)?;
            writeln!(f)?;
        }
    }
    write_names_block(f, "Generals", prob, VarType::Integer)?;
    write_names_block(f, "Binaries", prob, VarType::Binary)
}

fn write_names_block(f: &mut Formatter, header: &str, prob: &Problem, var_type: VarType) -> fmt::Result {
    let mut variables = prob.variables().filter(|v| v.var_type() == var_type).peekable();
    if variables.peek().is_some() {
        writeln!(f, "{}", header)?;
        for variable in variables {
            writeln!(f, "{}", variable.name())?;
        }
    }
    Ok(())
}
