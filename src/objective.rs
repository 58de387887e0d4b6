//! Objective functions
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use crate::error::ModelError;
use crate::expression::Expression;

/// Optimization sense
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum ObjectiveSense {
    /// min
    Minimize,
    /// max
    Maximize,
}

impl ObjectiveSense {
    /// Section header used in .lp files
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectiveSense::Minimize => "Minimize",
            ObjectiveSense::Maximize => "Maximize",
        }
    }
}

impl fmt::Display for ObjectiveSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectiveSense {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimize" | "minimum" | "min" => Ok(ObjectiveSense::Minimize),
            "maximize" | "maximum" | "max" => Ok(ObjectiveSense::Maximize),
            _ => Err(ModelError::InvalidSense {
                expected: "(Minimize, Maximize)",
                found: s.to_string(),
            }),
        }
    }
}

/// An expression to minimize or maximize.
///
/// Derefs to its [Expression], so terms can be added in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    name: String,
    expression: Expression,
    sense: ObjectiveSense,
}

impl Objective {
    /// Create an objective. An empty name is written as `OBJ`.
    pub fn new(name: impl Into<String>, expression: Expression, sense: ObjectiveSense) -> Objective {
        Objective {
            name: name.into(),
            expression,
            sense,
        }
    }

    /// Objective name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The objective expression
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Whether to minimize or maximize
    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Change the optimization direction
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }
}

impl Deref for Objective {
    type Target = Expression;

    fn deref(&self) -> &Expression {
        &self.expression
    }
}

impl DerefMut for Objective {
    fn deref_mut(&mut self) -> &mut Expression {
        &mut self.expression
    }
}
