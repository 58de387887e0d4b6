//! Linear constraints between two expressions
use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::expression::Expression;
use crate::variable::Variable;

/// Appended to a constraint name to name its slack variable
pub const SLACK_VARIABLE_SUFFIX: &str = "_slack_variable";

/// Relation between the two sides of a constraint
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum ConstraintSense {
    /// lhs <= rhs
    Leq,
    /// lhs = rhs
    Eq,
    /// lhs >= rhs
    Geq,
}

impl ConstraintSense {
    /// `leq`, `eq` or `geq`
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintSense::Leq => "leq",
            ConstraintSense::Eq => "eq",
            ConstraintSense::Geq => "geq",
        }
    }

    /// The operator used in .lp files
    pub fn operator(self) -> &'static str {
        match self {
            ConstraintSense::Leq => "<=",
            ConstraintSense::Eq => "=",
            ConstraintSense::Geq => ">=",
        }
    }

    /// The sense obtained when swapping both sides
    pub fn reversed(self) -> ConstraintSense {
        match self {
            ConstraintSense::Leq => ConstraintSense::Geq,
            ConstraintSense::Eq => ConstraintSense::Eq,
            ConstraintSense::Geq => ConstraintSense::Leq,
        }
    }

    /// Parse a relational operator. Strict operators are read as their non-strict counterpart.
    pub fn from_operator(operator: &str) -> Option<ConstraintSense> {
        match operator {
            "<=" | "=<" | "<" => Some(ConstraintSense::Leq),
            ">=" | "=>" | ">" => Some(ConstraintSense::Geq),
            "=" => Some(ConstraintSense::Eq),
            _ => None,
        }
    }

    /// Sign of the slack term, which always loosens the constraint
    fn slack_coefficient(self) -> Option<f64> {
        match self {
            ConstraintSense::Leq => Some(-1.),
            ConstraintSense::Geq => Some(1.),
            ConstraintSense::Eq => None,
        }
    }

    fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            ConstraintSense::Leq => lhs <= rhs,
            ConstraintSense::Eq => lhs == rhs,
            ConstraintSense::Geq => lhs >= rhs,
        }
    }
}

impl fmt::Display for ConstraintSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstraintSense {
    type Err = ModelError;

    /// Accepts `leq`, `eq`, `geq` in any case, and the .lp operators
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "leq" => Ok(ConstraintSense::Leq),
            "eq" => Ok(ConstraintSense::Eq),
            "geq" => Ok(ConstraintSense::Geq),
            other => ConstraintSense::from_operator(other).ok_or_else(|| {
                ModelError::InvalidSense {
                    expected: "('leq', 'eq', 'geq')",
                    found: s.to_string(),
                }
            }),
        }
    }
}

/// A constraint `lhs <sense> rhs`, optionally relaxed by a penalized slack variable
#[derive(Debug, Clone)]
pub struct Constraint {
    name: String,
    lhs: Expression,
    sense: ConstraintSense,
    rhs: Expression,
    slack: bool,
    slack_penalty: f64,
    slack_variable: OnceCell<Variable>,
}

impl Constraint {
    /// Create a constraint without slack
    pub fn new(
        name: impl Into<String>,
        lhs: Expression,
        sense: ConstraintSense,
        rhs: Expression,
    ) -> Constraint {
        Constraint {
            name: name.into(),
            lhs,
            sense,
            rhs,
            slack: false,
            slack_penalty: 0.,
            slack_variable: OnceCell::new(),
        }
    }

    /// Enable slack with the given objective penalty
    pub fn with_slack(mut self, penalty: f64) -> Result<Constraint, ModelError> {
        self.set_slack_penalty(penalty)?;
        self.set_slack(true);
        Ok(self)
    }

    /// Constraint name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Left-hand side
    pub fn lhs(&self) -> &Expression {
        &self.lhs
    }

    /// Right-hand side
    pub fn rhs(&self) -> &Expression {
        &self.rhs
    }

    /// Relation between the two sides
    pub fn sense(&self) -> ConstraintSense {
        self.sense
    }

    /// Change the relation between the two sides
    pub fn set_sense(&mut self, sense: ConstraintSense) {
        self.sense = sense;
    }

    /// Whether the constraint may be violated at a cost
    pub fn slack(&self) -> bool {
        self.slack
    }

    /// Turn slack on or off
    pub fn set_slack(&mut self, slack: bool) {
        if slack && self.slack_penalty == 0. {
            tracing::warn!(
                component = "constraint",
                operation = "set_slack",
                status = "zero_penalty",
                constraint = self.name.as_str(),
                "Slack penalty is zero. No incentive to meet this constraint"
            );
        }
        self.slack = slack;
    }

    /// Objective cost of one unit of slack
    pub fn slack_penalty(&self) -> f64 {
        self.slack_penalty
    }

    /// Set the slack penalty, which must be finite and non-negative
    pub fn set_slack_penalty(&mut self, penalty: f64) -> Result<(), ModelError> {
        if !penalty.is_finite() || penalty < 0. {
            return Err(ModelError::InvalidSlackPenalty(penalty));
        }
        self.slack_penalty = penalty;
        Ok(())
    }

    /// The slack variable `<name>_slack_variable`, created on first access.
    ///
    /// `None` when the constraint has no slack.
    pub fn slack_variable(&self) -> Option<&Variable> {
        if !self.slack {
            return None;
        }
        Some(self.slack_variable.get_or_init(|| {
            Variable::continuous(format!("{}{}", self.name, SLACK_VARIABLE_SUFFIX))
        }))
    }

    /// Lower bound on the shifted expression, absent for `leq` constraints
    pub fn lower_bound(&self) -> Option<f64> {
        match self.sense {
            ConstraintSense::Leq => None,
            _ => Some(self.rhs.constant() - self.lhs.constant()),
        }
    }

    /// Upper bound on the shifted expression, absent for `geq` constraints
    pub fn upper_bound(&self) -> Option<f64> {
        match self.sense {
            ConstraintSense::Geq => None,
            _ => Some(self.rhs.constant() - self.lhs.constant()),
        }
    }

    /// The constraint with every variable moved to the left and the constant to the right.
    ///
    /// Returns `lhs - rhs` without constant, plus the slack term when there is one,
    /// and the constant `rhs.constant - lhs.constant`.
    pub fn shifted(&self) -> (Expression, f64) {
        let mut expression = Expression::new();
        for (variable, coeff) in self.lhs.terms() {
            expression.add_term(variable, coeff);
        }
        for (variable, coeff) in self.rhs.terms() {
            expression.add_term(variable, -coeff);
        }
        if let (Some(slack_variable), Some(coeff)) =
            (self.slack_variable(), self.sense.slack_coefficient())
        {
            expression.set_coefficient(slack_variable, coeff);
        }
        (expression, self.rhs.constant() - self.lhs.constant())
    }

    /// Whether the values assigned to the variables satisfy the constraint
    pub fn check(&self) -> Result<bool, ModelError> {
        let mut lhs = self.lhs.evaluate()?;
        if let (Some(slack_variable), Some(coeff)) =
            (self.slack_variable(), self.sense.slack_coefficient())
        {
            lhs += coeff * slack_variable.evaluate()?;
        }
        Ok(self.sense.holds(lhs, self.rhs.evaluate()?))
    }

    /// Split an equality into `<name>_ub` (`leq`) and `<name>_lb` (`geq`) on the shifted expression.
    ///
    /// `None` unless the sense is [ConstraintSense::Eq].
    pub fn split_equality(&self) -> Option<(Constraint, Constraint)> {
        if self.sense != ConstraintSense::Eq {
            return None;
        }
        let (expression, constant) = self.shifted();
        let half = |suffix: &str, sense| Constraint {
            name: format!("{}_{}", self.name, suffix),
            lhs: expression.clone(),
            sense,
            rhs: Expression::from_constant(constant),
            slack: self.slack,
            slack_penalty: self.slack_penalty,
            slack_variable: OnceCell::new(),
        };
        Some((half("ub", ConstraintSense::Leq), half("lb", ConstraintSense::Geq)))
    }
}
