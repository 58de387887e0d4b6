//! Decision variables.
//!
//! A [Variable] is a cheap, cloneable handle. Clones refer to the same variable:
//! setting a value through one clone is visible through all of them. Two variables
//! created separately are distinct even when they share a name.
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ModelError;

static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(0);

/// Kind of values a variable may take
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum VarType {
    /// any real value within bounds
    Continuous,
    /// integral values within bounds
    Integer,
    /// 0 or 1
    Binary,
}

impl VarType {
    /// Name of the variable type
    pub fn as_str(self) -> &'static str {
        match self {
            VarType::Continuous => "Continuous",
            VarType::Integer => "Integer",
            VarType::Binary => "Binary",
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VarType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continuous" => Ok(VarType::Continuous),
            "integer" => Ok(VarType::Integer),
            "binary" => Ok(VarType::Binary),
            _ => Err(ModelError::InvalidVarType(s.to_string())),
        }
    }
}

#[derive(Debug)]
struct VariableState {
    var_type: VarType,
    low_bound: Option<f64>,
    up_bound: Option<f64>,
    value: Option<f64>,
    obj_coeff: f64,
}

#[derive(Debug)]
struct Shared {
    id: u64,
    name: String,
    state: RefCell<VariableState>,
}

/// A variable to optimize. `None` bounds mean the variable is unbounded on that side.
#[derive(Clone)]
pub struct Variable(Rc<Shared>);

impl Variable {
    /// Create a variable, checking that `low_bound <= up_bound`.
    ///
    /// Binary variables have their bounds clamped into `[0, 1]`.
    ///
    /// ```
    /// use lp_model::variable::{Variable, VarType};
    ///
    /// let b = Variable::new("b", VarType::Binary, None, Some(5.)).unwrap();
    /// assert_eq!(b.low_bound(), Some(0.));
    /// assert_eq!(b.up_bound(), Some(1.));
    /// assert!(Variable::new("x", VarType::Continuous, Some(2.), Some(1.)).is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        var_type: VarType,
        low_bound: Option<f64>,
        up_bound: Option<f64>,
    ) -> Result<Variable, ModelError> {
        let name = name.into();
        check_bounds(&name, low_bound, up_bound)?;
        let (low_bound, up_bound) = match var_type {
            VarType::Binary => (
                Some(low_bound.unwrap_or(0.).max(0.)),
                Some(up_bound.unwrap_or(1.).min(1.)),
            ),
            _ => (low_bound, up_bound),
        };
        check_bounds(&name, low_bound, up_bound)?;
        Ok(Variable::from_parts(name, var_type, low_bound, up_bound))
    }

    /// A continuous variable with the default .lp bounds `[0, +inf)`
    pub fn continuous(name: impl Into<String>) -> Variable {
        Variable::from_parts(name.into(), VarType::Continuous, Some(0.), None)
    }

    fn from_parts(
        name: String,
        var_type: VarType,
        low_bound: Option<f64>,
        up_bound: Option<f64>,
    ) -> Variable {
        Variable(Rc::new(Shared {
            id: NEXT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed),
            name,
            state: RefCell::new(VariableState {
                var_type,
                low_bound,
                up_bound,
                value: None,
                obj_coeff: 0.,
            }),
        }))
    }

    /// Unique identity of this variable, shared by all of its clones
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Variable name. It should be unique within a problem.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Current type of the variable
    pub fn var_type(&self) -> VarType {
        self.0.state.borrow().var_type
    }

    /// Change the variable type. Switching to [VarType::Binary] resets the bounds to `[0, 1]`.
    pub fn set_var_type(&self, var_type: VarType) {
        let mut state = self.0.state.borrow_mut();
        state.var_type = var_type;
        if var_type == VarType::Binary {
            state.low_bound = Some(0.);
            state.up_bound = Some(1.);
        }
    }

    /// Minimum allowed value, `None` when unbounded below
    pub fn low_bound(&self) -> Option<f64> {
        self.0.state.borrow().low_bound
    }

    /// Maximum allowed value, `None` when unbounded above
    pub fn up_bound(&self) -> Option<f64> {
        self.0.state.borrow().up_bound
    }

    /// Set the lower bound. Fails, leaving the bounds unchanged, if it is NaN or would exceed the upper bound.
    pub fn set_low_bound(&self, bound: Option<f64>) -> Result<(), ModelError> {
        let up_bound = self.up_bound();
        self.set_bounds(bound, up_bound)
    }

    /// Set the upper bound. Fails, leaving the bounds unchanged, if it would be below the lower bound.
    pub fn set_up_bound(&self, bound: Option<f64>) -> Result<(), ModelError> {
        let low_bound = self.low_bound();
        self.set_bounds(low_bound, bound)
    }

    /// Replace both bounds at once
    pub fn set_bounds(&self, low_bound: Option<f64>, up_bound: Option<f64>) -> Result<(), ModelError> {
        check_bounds(self.name(), low_bound, up_bound)?;
        let mut state = self.0.state.borrow_mut();
        state.low_bound = low_bound;
        state.up_bound = up_bound;
        Ok(())
    }

    /// Value assigned by a solver, if any
    pub fn value(&self) -> Option<f64> {
        self.0.state.borrow().value
    }

    /// Assign a value, checking it against the bounds and the variable type
    pub fn set_value(&self, value: f64) -> Result<(), ModelError> {
        self.check_value(value)?;
        self.0.state.borrow_mut().value = Some(value);
        Ok(())
    }

    /// Whether [Variable::set_value] would accept `value`
    pub fn check_value(&self, value: f64) -> Result<(), ModelError> {
        let state = self.0.state.borrow();
        let below = matches!(state.low_bound, Some(low) if value < low);
        let above = matches!(state.up_bound, Some(up) if value > up);
        if below || above || value.is_nan() {
            return Err(ModelError::OutOfBounds {
                name: self.0.name.clone(),
                value,
                lower: state.low_bound,
                upper: state.up_bound,
            });
        }
        let valid_type = match state.var_type {
            VarType::Continuous => true,
            VarType::Integer => value.fract() == 0.,
            VarType::Binary => value == 0. || value == 1.,
        };
        if !valid_type {
            return Err(ModelError::TypeMismatch {
                name: self.0.name.clone(),
                value,
                var_type: state.var_type.as_str(),
            });
        }
        Ok(())
    }

    /// The assigned value, or [ModelError::UnsetValue]
    pub fn evaluate(&self) -> Result<f64, ModelError> {
        self.value()
            .ok_or_else(|| ModelError::UnsetValue(self.0.name.clone()))
    }

    /// Coefficient of the variable in the problem objective, 0 if absent
    pub fn obj_coeff(&self) -> f64 {
        self.0.state.borrow().obj_coeff
    }

    /// Cache the coefficient of the variable in the problem objective
    pub fn set_obj_coeff(&self, coeff: f64) {
        self.0.state.borrow_mut().obj_coeff = coeff;
    }

    /// Whether the variable is non-negative and has no upper bound, the .lp default
    pub fn is_positive_free(&self) -> bool {
        let state = self.0.state.borrow();
        state.low_bound == Some(0.) && state.up_bound.is_none()
    }

    /// Whether the variable is unbounded in both directions
    pub fn is_free(&self) -> bool {
        let state = self.0.state.borrow();
        state.low_bound.is_none() && state.up_bound.is_none()
    }

    /// Whether both bounds restrict the variable to a single value
    pub fn is_constant(&self) -> bool {
        let state = self.0.state.borrow();
        state.low_bound.is_some() && state.low_bound == state.up_bound
    }
}

fn check_bounds(name: &str, low_bound: Option<f64>, up_bound: Option<f64>) -> Result<(), ModelError> {
    let has_nan = low_bound.is_some_and(f64::is_nan) || up_bound.is_some_and(f64::is_nan);
    let crossed = matches!((low_bound, up_bound), (Some(lower), Some(upper)) if lower > upper);
    if has_nan || crossed {
        return Err(ModelError::InvalidBounds {
            name: name.to_string(),
            lower: low_bound,
            upper: up_bound,
        });
    }
    Ok(())
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.borrow();
        f.debug_struct("Variable")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("var_type", &state.var_type)
            .field("low_bound", &state.low_bound)
            .field("up_bound", &state.up_bound)
            .field("value", &state.value)
            .finish()
    }
}
