//! Static parameter declarations for validating concrete values.
//!
//! A [`Param`] states which runtime types (and, for intervals and strings,
//! which values) a parameter accepts. It is a one-shot predicate, used by
//! [`Model::validate_params`](crate::model::Model::validate_params); the
//! sampling engine never consults it.
//!
//! # Example
//!
//! ```
//! use paramspace::parameter::{Interval, Param};
//! use paramspace::value::Value;
//!
//! let c = Param::FloatInterval(Interval::new().lower(0.0).exclusive_lower());
//! assert!(c.validate("C", &Value::Float(1.0)).is_ok());
//! assert!(c.validate("C", &Value::Int(0)).is_err());
//!
//! let state = Param::random_state();
//! assert!(state.validate("random_state", &Value::None).is_ok());
//! assert!(state.validate("random_state", &Value::from("seed")).is_err());
//! ```

use core::fmt;

use crate::error::{Error, Result};
use crate::value::Value;

/// A numeric interval with optional, individually inclusive or exclusive bounds.
///
/// Bounds are inclusive by default.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval<T> {
    /// Lower bound, or unbounded below.
    pub lower: Option<T>,
    /// Upper bound, or unbounded above.
    pub upper: Option<T>,
    /// Whether `lower` itself is accepted.
    pub include_lower: bool,
    /// Whether `upper` itself is accepted.
    pub include_upper: bool,
}

impl<T> Interval<T> {
    /// Creates an interval unbounded in both directions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lower: None,
            upper: None,
            include_lower: true,
            include_upper: true,
        }
    }

    /// Sets the lower bound.
    #[must_use]
    pub fn lower(mut self, lower: T) -> Self {
        self.lower = Some(lower);
        self
    }

    /// Sets the upper bound.
    #[must_use]
    pub fn upper(mut self, upper: T) -> Self {
        self.upper = Some(upper);
        self
    }

    /// Excludes the lower bound itself.
    #[must_use]
    pub fn exclusive_lower(mut self) -> Self {
        self.include_lower = false;
        self
    }

    /// Excludes the upper bound itself.
    #[must_use]
    pub fn exclusive_upper(mut self) -> Self {
        self.include_upper = false;
        self
    }
}

impl<T: PartialOrd> Interval<T> {
    /// Returns `true` if `value` lies within the interval.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        let above = match &self.lower {
            Some(lower) if self.include_lower => lower <= value,
            Some(lower) => lower < value,
            None => true,
        };
        let below = match &self.upper {
            Some(upper) if self.include_upper => value <= upper,
            Some(upper) => value < upper,
            None => true,
        };
        above && below
    }
}

impl<T> Default for Interval<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Display> fmt::Display for Interval<T> {
    /// Renders like `[0, 1)` or `(-inf, 10]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Some(lower) if self.include_lower => write!(f, "[{lower}, ")?,
            Some(lower) => write!(f, "({lower}, ")?,
            None => f.write_str("(-inf, ")?,
        }
        match &self.upper {
            Some(upper) if self.include_upper => write!(f, "{upper}]"),
            Some(upper) => write!(f, "{upper})"),
            None => f.write_str("inf)"),
        }
    }
}

/// The declared type of one parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    /// A boolean.
    Bool,
    /// Exactly `None`.
    None,
    /// Any number; integers are accepted.
    Float,
    /// An integer.
    Int,
    /// One of a fixed set of strings.
    String(Vec<String>),
    /// A number within an interval; integers are accepted.
    FloatInterval(Interval<f64>),
    /// An integer within an interval.
    IntInterval(Interval<i64>),
    /// An opaque object of the named type.
    Object(String),
    /// Any value accepted by at least one member.
    Union(Vec<Param>),
}

impl Param {
    /// A string parameter accepting `choices`.
    pub fn string<S: Into<String>>(choices: impl IntoIterator<Item = S>) -> Self {
        Param::String(choices.into_iter().map(Into::into).collect())
    }

    /// An opaque object parameter.
    pub fn object(type_name: impl Into<String>) -> Self {
        Param::Object(type_name.into())
    }

    /// A union of `members`.
    pub fn union(members: impl IntoIterator<Item = Param>) -> Self {
        Param::Union(members.into_iter().collect())
    }

    /// The usual `random_state` declaration: `None`, a seed, or a
    /// `RandomState` object.
    #[must_use]
    pub fn random_state() -> Self {
        Param::Union(vec![
            Param::None,
            Param::Int,
            Param::Object("RandomState".to_owned()),
        ])
    }

    /// Names the runtime types this parameter accepts, comma separated.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Param::Bool => "bool".to_owned(),
            Param::None => "NoneType".to_owned(),
            Param::Float | Param::FloatInterval(_) => "float,int".to_owned(),
            Param::Int | Param::IntInterval(_) => "int".to_owned(),
            Param::String(_) => "str".to_owned(),
            Param::Object(name) => name.clone(),
            Param::Union(members) => members
                .iter()
                .map(Param::type_name)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    fn accepts_type(&self, value: &Value) -> bool {
        match self {
            Param::Bool => matches!(value, Value::Bool(_)),
            Param::None => value.is_none(),
            Param::Float | Param::FloatInterval(_) => {
                matches!(value, Value::Int(_) | Value::Float(_))
            }
            Param::Int | Param::IntInterval(_) => matches!(value, Value::Int(_)),
            Param::String(_) => matches!(value, Value::Str(_)),
            Param::Object(name) => {
                matches!(value, Value::Object { type_name } if type_name == name)
            }
            Param::Union(members) => members.iter().any(|m| m.accepts_type(value)),
        }
    }

    /// Checks `value` against this declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParamType`] for a value of the wrong runtime
    /// type, [`Error::InvalidParamRange`] for a number outside its interval,
    /// or [`Error::InvalidParamChoices`] for a string outside its choices.
    pub fn validate(&self, name: &str, value: &Value) -> Result<()> {
        if let Param::Union(members) = self {
            return validate_union(members, self, name, value);
        }
        if !self.accepts_type(value) {
            return Err(Error::InvalidParamType {
                name: name.to_owned(),
                expected: self.type_name(),
            });
        }
        match (self, value) {
            (Param::String(choices), Value::Str(s)) if !choices.contains(s) => {
                Err(Error::InvalidParamChoices {
                    name: name.to_owned(),
                    choices: choices.clone(),
                })
            }
            (Param::FloatInterval(interval), _) => {
                let in_range = value.as_f64().is_some_and(|v| interval.contains(&v));
                range_check(in_range, interval, name, value)
            }
            (Param::IntInterval(interval), _) => {
                let in_range = value.as_i64().is_some_and(|v| interval.contains(&v));
                range_check(in_range, interval, name, value)
            }
            _ => Ok(()),
        }
    }
}

fn range_check<T: fmt::Display>(
    in_range: bool,
    interval: &Interval<T>,
    name: &str,
    value: &Value,
) -> Result<()> {
    if in_range {
        Ok(())
    } else {
        Err(Error::InvalidParamRange {
            name: name.to_owned(),
            value: value.to_string(),
            range: interval.to_string(),
        })
    }
}

/// Accepts the value if any member does. Otherwise reports the last error
/// from a member that takes the value's runtime type, or a type error for the
/// whole union when none does.
fn validate_union(members: &[Param], union: &Param, name: &str, value: &Value) -> Result<()> {
    let mut last_err = None;
    for member in members.iter().filter(|m| m.accepts_type(value)) {
        match member.validate(name, value) {
            Ok(()) => return Ok(()),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| Error::InvalidParamType {
        name: name.to_owned(),
        expected: union.type_name(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_types() {
        assert!(Param::Bool.validate("shrinking", &Value::Bool(true)).is_ok());
        assert!(Param::Bool.validate("shrinking", &Value::Int(1)).is_err());
        assert!(Param::Int.validate("n", &Value::Bool(true)).is_err());
        assert!(Param::Float.validate("tol", &Value::Int(1)).is_ok());
        assert!(Param::None.validate("x", &Value::None).is_ok());

        let err = Param::Int.validate("max_iter", &Value::Float(1.5)).unwrap_err();
        assert_eq!(err.to_string(), "max_iter must be of type int");
    }

    #[test]
    fn string_choices() {
        let penalty = Param::string(["l1", "l2"]);
        assert!(penalty.validate("penalty", &"l1".into()).is_ok());
        assert!(matches!(
            penalty.validate("penalty", &"elasticnet".into()),
            Err(Error::InvalidParamChoices { .. })
        ));
        assert!(matches!(
            penalty.validate("penalty", &Value::Int(1)),
            Err(Error::InvalidParamType { .. })
        ));
    }

    #[test]
    fn intervals() {
        let tol = Param::FloatInterval(Interval::new().lower(0.0).exclusive_lower());
        assert!(tol.validate("tol", &Value::Float(1e-4)).is_ok());
        let err = tol.validate("tol", &Value::Float(0.0)).unwrap_err();
        assert_eq!(err.to_string(), "tol with value 0.0 not in range: (0, inf)");

        let degree = Param::IntInterval(Interval::new().lower(1).upper(5));
        assert!(degree.validate("degree", &Value::Int(5)).is_ok());
        assert!(degree.validate("degree", &Value::Int(6)).is_err());
        assert!(degree.validate("degree", &Value::Float(3.0)).is_err());

        let below = Interval::new().upper(10).exclusive_upper();
        assert!(below.contains(&-100));
        assert!(!below.contains(&10));
        assert_eq!(below.to_string(), "(-inf, 10)");
    }

    #[test]
    fn unions() {
        let state = Param::random_state();
        assert!(state.validate("random_state", &Value::Int(0)).is_ok());
        assert!(state.validate("random_state", &Value::object("RandomState")).is_ok());
        let err = state.validate("random_state", &Value::Float(0.5)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "random_state must be of type NoneType,int,RandomState"
        );

        // A single typed member reports its own error
        let class_weight = Param::union([Param::None, Param::string(["balanced"])]);
        assert!(matches!(
            class_weight.validate("class_weight", &"auto".into()),
            Err(Error::InvalidParamChoices { .. })
        ));

        let either = Param::union([
            Param::IntInterval(Interval::new().upper(0)),
            Param::IntInterval(Interval::new().lower(10)),
        ]);
        assert!(either.validate("n", &Value::Int(-3)).is_ok());
        assert!(either.validate("n", &Value::Int(12)).is_ok());
        assert!(matches!(
            either.validate("n", &Value::Int(5)),
            Err(Error::InvalidParamRange { .. })
        ));
    }
}
