//! A linear problem: variables, constraints and an objective sharing one namespace
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::constraint::{Constraint, SLACK_VARIABLE_SUFFIX};
use crate::error::{ModelError, ReadError};
use crate::expression::Expression;
use crate::lp_reader;
use crate::objective::Objective;
use crate::variable::Variable;

/// A linear or mixed integer problem.
///
/// Variables and constraints are indexed by name, and iterated in name order.
/// Variables referenced by the objective or by a constraint are registered automatically.
#[derive(Debug, Clone)]
pub struct Problem {
    name: String,
    variables: BTreeMap<String, Variable>,
    constraints: BTreeMap<String, Constraint>,
    objective: Option<Objective>,
}

impl Problem {
    /// An empty problem
    pub fn new(name: impl Into<String>) -> Problem {
        Problem {
            name: name.into(),
            variables: BTreeMap::new(),
            constraints: BTreeMap::new(),
            objective: None,
        }
    }

    /// Problem name, written as the leading comment of .lp files
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a variable.
    ///
    /// Adding the same variable twice is a no-op. Adding a different variable
    /// under a name already in use, including the name of a constraint's slack
    /// variable, fails.
    pub fn add_variable(&mut self, variable: &Variable) -> Result<(), ModelError> {
        self.check_variable(variable)?;
        self.variables
            .entry(variable.name().to_string())
            .or_insert_with(|| variable.clone());
        Ok(())
    }

    /// Set the objective and register its variables. A problem has at most one objective.
    pub fn set_objective(&mut self, objective: Objective) -> Result<(), ModelError> {
        if self.objective.is_some() {
            return Err(ModelError::ObjectiveAlreadySet);
        }
        self.check_expressions(&[objective.expression()])?;
        for (variable, coeff) in objective.terms() {
            self.add_variable(variable)?;
            variable.set_obj_coeff(coeff);
        }
        tracing::debug!(
            component = "problem",
            operation = "set_objective",
            status = "ok",
            sense = objective.sense().as_str(),
            terms = objective.len(),
            "Set objective"
        );
        self.objective = Some(objective);
        Ok(())
    }

    /// Add a constraint and register the variables of both of its sides.
    ///
    /// Fails without modifying the problem if the constraint name is taken or one
    /// of its variables, slack variable included, conflicts with a registered variable.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ModelError> {
        if self.constraints.contains_key(constraint.name()) {
            return Err(ModelError::ConstraintNameConflict(
                constraint.name().to_string(),
            ));
        }
        let slack_terms = match constraint.slack_variable() {
            Some(slack_variable) => Expression::from_terms([(slack_variable.clone(), 1.)], 0.),
            None => Expression::new(),
        };
        self.check_expressions(&[constraint.lhs(), constraint.rhs(), &slack_terms])?;
        for variable in constraint.lhs().variables().chain(constraint.rhs().variables()) {
            self.add_variable(variable)?;
        }
        tracing::debug!(
            component = "problem",
            operation = "add_constraint",
            status = "ok",
            constraint = constraint.name(),
            sense = constraint.sense().as_str(),
            slack = constraint.slack(),
            "Added constraint"
        );
        self.constraints
            .insert(constraint.name().to_string(), constraint);
        Ok(())
    }

    /// The objective, if set
    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Registered variables, in name order
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Look up a registered variable
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Constraints, in name order
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    /// Look up a constraint
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.get(name)
    }

    /// Slack variables of the slack-bearing constraints, in constraint name order
    pub fn slack_variables(&self) -> impl Iterator<Item = &Variable> {
        self.constraints().filter_map(Constraint::slack_variable)
    }

    fn check_variable(&self, variable: &Variable) -> Result<(), ModelError> {
        let name = variable.name();
        let conflict = self
            .variables
            .get(name)
            .into_iter()
            .chain(self.slack_variable_named(name))
            .any(|registered| registered != variable);
        if conflict {
            return Err(ModelError::VariableNameConflict(name.to_string()));
        }
        Ok(())
    }

    fn slack_variable_named(&self, name: &str) -> Option<&Variable> {
        let constraint = self.constraints.get(name.strip_suffix(SLACK_VARIABLE_SUFFIX)?)?;
        constraint.slack_variable().filter(|slack| slack.name() == name)
    }

    fn check_expressions(&self, expressions: &[&Expression]) -> Result<(), ModelError> {
        let mut seen: BTreeMap<&str, &Variable> = BTreeMap::new();
        for variable in expressions.iter().flat_map(|e| e.variables()) {
            self.check_variable(variable)?;
            if let Some(other) = seen.insert(variable.name(), variable) {
                if other != variable {
                    return Err(ModelError::VariableNameConflict(
                        variable.name().to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Parse a problem written in the .lp format
impl FromStr for Problem {
    type Err = ReadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lp_reader::read_lp_str(s)
    }
}
