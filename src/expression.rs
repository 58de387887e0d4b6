//! Sparse linear expressions over [Variable]s.
use std::collections::HashMap;

use approx::relative_eq;

use crate::error::ModelError;
use crate::variable::Variable;

/// Relative tolerance used to compare coefficients and constants
pub const COEFFICIENT_TOLERANCE: f64 = 1e-9;

/// A linear combination of variables plus a constant.
///
/// Terms are keyed by variable identity. A term whose coefficient is zero is kept
/// until the expression is written out.
#[derive(Debug, Clone, Default)]
pub struct Expression {
    terms: HashMap<Variable, f64>,
    constant: f64,
}

impl Expression {
    /// The empty expression, equal to 0
    pub fn new() -> Expression {
        Expression::default()
    }

    /// An expression without variables
    pub fn from_constant(constant: f64) -> Expression {
        Expression {
            terms: HashMap::new(),
            constant,
        }
    }

    /// Build an expression from `(variable, coefficient)` pairs. Repeated variables are summed.
    pub fn from_terms<I>(terms: I, constant: f64) -> Expression
    where
        I: IntoIterator<Item = (Variable, f64)>,
    {
        let mut expression = Expression::from_constant(constant);
        for (variable, coeff) in terms {
            expression.add_term(&variable, coeff);
        }
        expression
    }

    /// Coefficient of `variable`, 0 if it does not appear
    pub fn coefficient(&self, variable: &Variable) -> f64 {
        self.terms.get(variable).copied().unwrap_or(0.)
    }

    /// Overwrite the coefficient of `variable`
    pub fn set_coefficient(&mut self, variable: &Variable, coeff: f64) {
        self.terms.insert(variable.clone(), coeff);
    }

    /// The constant term
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Overwrite the constant term
    pub fn set_constant(&mut self, constant: f64) {
        self.constant = constant;
    }

    /// Iterate over the terms in no particular order, zero coefficients included
    pub fn terms(&self) -> impl Iterator<Item = (&Variable, f64)> {
        self.terms.iter().map(|(variable, &coeff)| (variable, coeff))
    }

    /// The variables referenced by the expression
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.terms.keys()
    }

    /// Number of stored terms, zero coefficients included
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the expression has no stored term
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms ordered by variable name. This order drives the .lp output.
    pub fn sorted_terms(&self) -> Vec<(&Variable, f64)> {
        let mut terms: Vec<_> = self.terms().collect();
        terms.sort_by(|(a, _), (b, _)| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        terms
    }

    /// Add the terms and constant of `other` to this expression
    pub fn add_expression(&mut self, other: &Expression) {
        for (variable, coeff) in other.terms() {
            self.add_term(variable, coeff);
        }
        self.constant += other.constant;
    }

    /// Add `variable` with coefficient 1
    pub fn add_variable(&mut self, variable: &Variable) {
        self.add_term(variable, 1.);
    }

    /// Add `coeff * variable`
    pub fn add_term(&mut self, variable: &Variable, coeff: f64) {
        *self.terms.entry(variable.clone()).or_insert(0.) += coeff;
    }

    /// Add to the constant term
    pub fn add_constant(&mut self, constant: f64) {
        self.constant += constant;
    }

    /// Value of the expression given the values assigned to its variables.
    ///
    /// Fails if one of the variables has no value.
    pub fn evaluate(&self) -> Result<f64, ModelError> {
        let mut total = self.constant;
        for (variable, coeff) in self.terms() {
            total += coeff * variable.evaluate()?;
        }
        Ok(total)
    }
}

fn is_close(a: f64, b: f64) -> bool {
    relative_eq!(a, b, epsilon = f64::EPSILON, max_relative = COEFFICIENT_TOLERANCE)
}

/// Coefficient-wise comparison within [COEFFICIENT_TOLERANCE]. Absent terms count as zero.
impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        is_close(self.constant, other.constant)
            && self
                .variables()
                .chain(other.variables())
                .all(|variable| is_close(self.coefficient(variable), other.coefficient(variable)))
    }
}
