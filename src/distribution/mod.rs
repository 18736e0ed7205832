//! Distributions: how to draw a domain value for one parameter.
//!
//! A [`Distribution`] knows how to
//!
//! - register itself with a [`ConfigSpace`] as one or more primitives,
//! - turn a raw draw back into a domain [`Value`] ([`post_process`](Distribution::post_process)),
//! - decide whether a value lies in its support ([`in_support`](Distribution::in_support)),
//! - translate logical names and values into the encoded namespace the
//!   space actually holds ([`child_encoded_name`](Distribution::child_encoded_name),
//!   [`value_to_encoded`](Distribution::value_to_encoded)).
//!
//! Only [`UnionDistribution`] makes the encoded namespace differ from the
//! logical one; see its docs for the selector/slot scheme.
//!
//! # Example
//!
//! ```
//! use paramspace::distribution::{Distribution, UniformFloatDistribution};
//! use paramspace::value::Value;
//!
//! let c: Distribution = UniformFloatDistribution::new(1e-3, 1e3).log().into();
//! assert!(c.in_support(&Value::Float(1.0)));
//!
//! let alpha = Distribution::union([Distribution::int(0, 10), Distribution::categorical(["auto"])]);
//! assert!(alpha.in_support(&Value::from("auto")));
//! assert!(!alpha.in_support(&Value::Float(0.5)));
//! ```

mod record;
mod union;

use core::fmt;

use serde::{Deserialize, Serialize};

pub use record::Record;
pub use union::UnionDistribution;

use crate::error::{Error, Result};
use crate::space::{ConfigSpace, Hyperparameter};
use crate::value::{Assignment, Value, ValueType};

const TRUE_TOKEN: &str = "T";
const FALSE_TOKEN: &str = "F";

fn default_true() -> bool {
    true
}

/// Uniform choice between `true` and `false`.
///
/// Registered as a categorical over the tokens `"T"` and `"F"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformBoolDistribution {
    /// Default value.
    #[serde(default = "default_true")]
    pub default: bool,
}

impl UniformBoolDistribution {
    /// Creates a boolean distribution defaulting to `true`.
    #[must_use]
    pub fn new() -> Self {
        Self { default: true }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }
}

impl Default for UniformBoolDistribution {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for UniformBoolDistribution {
    const TAG: &'static str = "UniformBoolDistribution";

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Uniform integers in `[lower, upper]`, optionally log-scaled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformIntDistribution {
    /// Lower bound (inclusive).
    pub lower: i64,
    /// Upper bound (inclusive).
    pub upper: i64,
    /// Default value; `lower` when unset.
    #[serde(default)]
    pub default: Option<i64>,
    /// Whether to sample in log space.
    #[serde(default)]
    pub log: bool,
}

impl UniformIntDistribution {
    /// Creates an integer distribution over `[lower, upper]`.
    #[must_use]
    pub fn new(lower: i64, upper: i64) -> Self {
        Self {
            lower,
            upper,
            default: None,
            log: false,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: i64) -> Self {
        self.default = Some(default);
        self
    }

    /// Enables log-scale sampling.
    #[must_use]
    pub fn log(mut self) -> Self {
        self.log = true;
        self
    }

    /// Returns the effective default.
    #[must_use]
    pub fn default_value(&self) -> i64 {
        self.default.unwrap_or(self.lower)
    }
}

impl Record for UniformIntDistribution {
    const TAG: &'static str = "UniformIntDistribution";

    #[allow(clippy::cast_precision_loss)]
    fn validate(&self) -> Result<()> {
        if self.lower > self.upper {
            return Err(Error::InvalidBounds {
                low: self.lower as f64,
                high: self.upper as f64,
            });
        }
        if self.log && self.lower < 1 {
            return Err(Error::InvalidLogBounds);
        }
        let default = self.default_value();
        if !(self.lower..=self.upper).contains(&default) {
            return Err(Error::InvalidDefault {
                default: default.to_string(),
            });
        }
        Ok(())
    }
}

/// Uniform floats in `[lower, upper]`, optionally log-scaled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformFloatDistribution {
    /// Lower bound (inclusive).
    pub lower: f64,
    /// Upper bound (inclusive).
    pub upper: f64,
    /// Default value; `lower` when unset.
    #[serde(default)]
    pub default: Option<f64>,
    /// Whether to sample in log space.
    #[serde(default)]
    pub log: bool,
}

impl UniformFloatDistribution {
    /// Creates a float distribution over `[lower, upper]`.
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            default: None,
            log: false,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    /// Enables log-scale sampling.
    #[must_use]
    pub fn log(mut self) -> Self {
        self.log = true;
        self
    }

    /// Returns the effective default.
    #[must_use]
    pub fn default_value(&self) -> f64 {
        self.default.unwrap_or(self.lower)
    }
}

impl Record for UniformFloatDistribution {
    const TAG: &'static str = "UniformFloatDistribution";

    fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() || self.lower > self.upper {
            return Err(Error::InvalidBounds {
                low: self.lower,
                high: self.upper,
            });
        }
        if self.log && self.lower <= 0.0 {
            return Err(Error::InvalidLogBounds);
        }
        let default = self.default_value();
        if !(self.lower..=self.upper).contains(&default) {
            return Err(Error::InvalidDefault {
                default: default.to_string(),
            });
        }
        Ok(())
    }
}

/// Uniform choice among string choices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalDistribution {
    /// Allowed choices, in order.
    pub choices: Vec<String>,
    /// Default choice; the first choice when unset.
    #[serde(default)]
    pub default: Option<String>,
}

impl CategoricalDistribution {
    /// Creates a categorical distribution over `choices`.
    pub fn new<S: Into<String>>(choices: impl IntoIterator<Item = S>) -> Self {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
            default: None,
        }
    }

    /// Sets the default choice.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Returns the effective default, or `None` if there are no choices.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default
            .as_deref()
            .or_else(|| self.choices.first().map(String::as_str))
    }
}

impl Record for CategoricalDistribution {
    const TAG: &'static str = "CategoricalDistribution";

    fn validate(&self) -> Result<()> {
        if self.choices.is_empty() {
            return Err(Error::EmptyChoices);
        }
        if let Some(default) = &self.default
            && !self.choices.contains(default)
        {
            return Err(Error::InvalidDefault {
                default: default.clone(),
            });
        }
        Ok(())
    }
}

/// A single fixed value.
///
/// Constants are exempt from forbidden-clause pruning: forbidding a value a
/// constant cannot take is vacuous, and forbidding the value it always takes
/// excludes the parameter entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstantDistribution {
    /// The only value.
    pub value: Value,
}

impl ConstantDistribution {
    /// Creates a constant distribution.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Record for ConstantDistribution {
    const TAG: &'static str = "ConstantDistribution";

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// How to draw a value for one parameter.
///
/// Serializes as an internally tagged record (see [`Record`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Distribution {
    /// See [`UniformBoolDistribution`].
    #[serde(rename = "UniformBoolDistribution")]
    UniformBool(UniformBoolDistribution),
    /// See [`UniformIntDistribution`].
    #[serde(rename = "UniformIntDistribution")]
    UniformInt(UniformIntDistribution),
    /// See [`UniformFloatDistribution`].
    #[serde(rename = "UniformFloatDistribution")]
    UniformFloat(UniformFloatDistribution),
    /// See [`CategoricalDistribution`].
    #[serde(rename = "CategoricalDistribution")]
    Categorical(CategoricalDistribution),
    /// See [`ConstantDistribution`].
    #[serde(rename = "ConstantDistribution")]
    Constant(ConstantDistribution),
    /// See [`UnionDistribution`].
    #[serde(rename = "UnionDistribution")]
    Union(UnionDistribution),
}

impl Distribution {
    /// Shorthand for a [`UniformBoolDistribution`] defaulting to `true`.
    #[must_use]
    pub fn boolean() -> Self {
        Distribution::UniformBool(UniformBoolDistribution::new())
    }

    /// Shorthand for a linear [`UniformIntDistribution`].
    #[must_use]
    pub fn int(lower: i64, upper: i64) -> Self {
        Distribution::UniformInt(UniformIntDistribution::new(lower, upper))
    }

    /// Shorthand for a linear [`UniformFloatDistribution`].
    #[must_use]
    pub fn float(lower: f64, upper: f64) -> Self {
        Distribution::UniformFloat(UniformFloatDistribution::new(lower, upper))
    }

    /// Shorthand for a [`CategoricalDistribution`].
    pub fn categorical<S: Into<String>>(choices: impl IntoIterator<Item = S>) -> Self {
        Distribution::Categorical(CategoricalDistribution::new(choices))
    }

    /// Shorthand for a [`ConstantDistribution`].
    pub fn constant(value: impl Into<Value>) -> Self {
        Distribution::Constant(ConstantDistribution::new(value))
    }

    /// Shorthand for a [`UnionDistribution`].
    pub fn union(members: impl IntoIterator<Item = Distribution>) -> Self {
        Distribution::Union(UnionDistribution::new(members))
    }

    /// Returns the record tag of this variant.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Distribution::UniformBool(_) => UniformBoolDistribution::TAG,
            Distribution::UniformInt(_) => UniformIntDistribution::TAG,
            Distribution::UniformFloat(_) => UniformFloatDistribution::TAG,
            Distribution::Categorical(_) => CategoricalDistribution::TAG,
            Distribution::Constant(_) => ConstantDistribution::TAG,
            Distribution::Union(_) => UnionDistribution::TAG,
        }
    }

    /// Returns the runtime type of the values this distribution produces,
    /// or `None` for a union.
    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Distribution::UniformBool(_) => Some(ValueType::Bool),
            Distribution::UniformInt(_) => Some(ValueType::Int),
            Distribution::UniformFloat(_) => Some(ValueType::Float),
            Distribution::Categorical(_) => Some(ValueType::Str),
            Distribution::Constant(d) => Some(d.value.value_type()),
            Distribution::Union(_) => None,
        }
    }

    /// Checks the construction invariants of this distribution.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        match self {
            Distribution::UniformBool(d) => d.validate(),
            Distribution::UniformInt(d) => d.validate(),
            Distribution::UniformFloat(d) => d.validate(),
            Distribution::Categorical(d) => d.validate(),
            Distribution::Constant(d) => d.validate(),
            Distribution::Union(d) => d.validate(),
        }
    }

    /// Returns `true` only for [`Distribution::Constant`].
    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Distribution::Constant(_))
    }

    /// Returns `true` if `value` can be produced by this distribution.
    ///
    /// Numeric bounds are inclusive and accept either numeric kind. A union
    /// delegates to the member matching the value's runtime type.
    #[must_use]
    pub fn in_support(&self, value: &Value) -> bool {
        match self {
            Distribution::UniformBool(_) => matches!(value, Value::Bool(_)),
            Distribution::UniformInt(d) => match value {
                Value::Int(v) => (d.lower..=d.upper).contains(v),
                #[allow(clippy::cast_precision_loss)]
                Value::Float(v) => (d.lower as f64..=d.upper as f64).contains(v),
                _ => false,
            },
            Distribution::UniformFloat(d) => value
                .as_f64()
                .is_some_and(|v| (d.lower..=d.upper).contains(&v)),
            Distribution::Categorical(d) => value
                .as_str()
                .is_some_and(|s| d.choices.iter().any(|c| c == s)),
            Distribution::Constant(d) => d.value == *value,
            Distribution::Union(d) => d.in_support(value),
        }
    }

    /// Registers this distribution under `name` and returns the name that
    /// conditions on this parameter should target.
    ///
    /// # Errors
    ///
    /// Propagates registration errors from the space.
    pub fn register(&self, name: &str, space: &mut dyn ConfigSpace) -> Result<String> {
        let hyperparameter = match self {
            Distribution::UniformBool(d) => Hyperparameter::Categorical {
                name: name.to_owned(),
                choices: vec![TRUE_TOKEN.to_owned(), FALSE_TOKEN.to_owned()],
                default: bool_token(d.default).to_owned(),
            },
            Distribution::UniformInt(d) => Hyperparameter::Integer {
                name: name.to_owned(),
                lower: d.lower,
                upper: d.upper,
                default: d.default_value(),
                log: d.log,
            },
            Distribution::UniformFloat(d) => Hyperparameter::Float {
                name: name.to_owned(),
                lower: d.lower,
                upper: d.upper,
                default: d.default_value(),
                log: d.log,
            },
            Distribution::Categorical(d) => Hyperparameter::Categorical {
                name: name.to_owned(),
                choices: d.choices.clone(),
                default: d.default_value().ok_or(Error::EmptyChoices)?.to_owned(),
            },
            Distribution::Constant(d) => Hyperparameter::Constant {
                name: name.to_owned(),
                value: raw_constant(&d.value),
            },
            Distribution::Union(d) => return d.register(name, space),
        };
        space.add_hyperparameter(hyperparameter)?;
        Ok(name.to_owned())
    }

    /// Rewrites the raw entries for `name` in `raw` into a single domain value.
    ///
    /// Leaves `raw` untouched when the parameter was inactive in the draw.
    /// Booleans map `"T"`/`"F"` back to `true`/`false`; constants always
    /// yield their fixed value; unions resolve their selector and remove
    /// their encoded keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw entries cannot be decoded.
    pub fn post_process(&self, name: &str, raw: &mut Assignment) -> Result<()> {
        if let Distribution::Union(d) = self {
            return d.post_process(name, raw);
        }
        let decoded = match raw.get(name) {
            Some(raw_value) => self.decode(name, raw_value)?,
            None => return Ok(()),
        };
        raw.insert(name.to_owned(), decoded);
        Ok(())
    }

    /// Maps one raw value of a non-union distribution to its domain value.
    pub(crate) fn decode(&self, name: &str, raw_value: &Value) -> Result<Value> {
        match self {
            Distribution::UniformBool(_) => match raw_value {
                Value::Str(token) if token == TRUE_TOKEN => Ok(Value::Bool(true)),
                Value::Str(token) if token == FALSE_TOKEN => Ok(Value::Bool(false)),
                Value::Bool(b) => Ok(Value::Bool(*b)),
                other => Err(Error::UnrecognizedType {
                    name: name.to_owned(),
                    value: other.to_string(),
                }),
            },
            Distribution::Constant(d) => Ok(d.value.clone()),
            Distribution::UniformInt(_)
            | Distribution::UniformFloat(_)
            | Distribution::Categorical(_) => Ok(raw_value.clone()),
            Distribution::Union(_) => Err(Error::NestedUnion),
        }
    }

    /// Returns the encoded name that conditions on parameter `name` should target.
    ///
    /// The identity for every variant except [`Distribution::Union`], which
    /// answers with its selector.
    #[must_use]
    pub fn child_encoded_name(&self, name: &str) -> String {
        match self {
            Distribution::Union(_) => UnionDistribution::control_name(name),
            _ => name.to_owned(),
        }
    }

    /// Translates a logical `(name, value)` pair into the encoded namespace.
    ///
    /// Booleans become their `"T"`/`"F"` tokens; a union routes the value to
    /// the slot of the member matching its runtime type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnrecognizedType`] if a union has no member for the
    /// value's runtime type.
    pub fn value_to_encoded(&self, name: &str, value: &Value) -> Result<(String, Value)> {
        match self {
            Distribution::UniformBool(_) => {
                let encoded = match value {
                    Value::Bool(b) => Value::from(bool_token(*b)),
                    other => other.clone(),
                };
                Ok((name.to_owned(), encoded))
            }
            Distribution::Constant(_) => Ok((name.to_owned(), raw_constant(value))),
            Distribution::Union(d) => d.value_to_encoded(name, value),
            Distribution::UniformInt(_)
            | Distribution::UniformFloat(_)
            | Distribution::Categorical(_) => Ok((name.to_owned(), value.clone())),
        }
    }

    /// Serializes into a tagged record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serde`] if serialization fails.
    pub fn to_record(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Restores any variant from a tagged record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] if the tag is missing or names no
    /// known distribution, [`Error::Serde`] for malformed fields, or a
    /// validation error.
    pub fn from_record(record: &serde_json::Value) -> Result<Self> {
        match record::record_tag(record) {
            Some(UniformBoolDistribution::TAG) => {
                UniformBoolDistribution::from_record(record).map(Distribution::UniformBool)
            }
            Some(UniformIntDistribution::TAG) => {
                UniformIntDistribution::from_record(record).map(Distribution::UniformInt)
            }
            Some(UniformFloatDistribution::TAG) => {
                UniformFloatDistribution::from_record(record).map(Distribution::UniformFloat)
            }
            Some(CategoricalDistribution::TAG) => {
                CategoricalDistribution::from_record(record).map(Distribution::Categorical)
            }
            Some(ConstantDistribution::TAG) => {
                ConstantDistribution::from_record(record).map(Distribution::Constant)
            }
            Some(UnionDistribution::TAG) => {
                UnionDistribution::from_record(record).map(Distribution::Union)
            }
            found => Err(Error::SchemaMismatch {
                expected: "a distribution record".to_owned(),
                found: found.unwrap_or("<missing>").to_owned(),
            }),
        }
    }
}

fn bool_token(value: bool) -> &'static str {
    if value { TRUE_TOKEN } else { FALSE_TOKEN }
}

/// Raw form of a constant's value: spaces only hold strings and numbers.
fn raw_constant(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::from(if *b { "True" } else { "False" }),
        Value::None => Value::from("None"),
        Value::Object { type_name } => Value::Str(type_name.clone()),
        Value::Int(_) | Value::Float(_) | Value::Str(_) => value.clone(),
    }
}

impl From<UniformBoolDistribution> for Distribution {
    fn from(d: UniformBoolDistribution) -> Self {
        Distribution::UniformBool(d)
    }
}

impl From<UniformIntDistribution> for Distribution {
    fn from(d: UniformIntDistribution) -> Self {
        Distribution::UniformInt(d)
    }
}

impl From<UniformFloatDistribution> for Distribution {
    fn from(d: UniformFloatDistribution) -> Self {
        Distribution::UniformFloat(d)
    }
}

impl From<CategoricalDistribution> for Distribution {
    fn from(d: CategoricalDistribution) -> Self {
        Distribution::Categorical(d)
    }
}

impl From<ConstantDistribution> for Distribution {
    fn from(d: ConstantDistribution) -> Self {
        Distribution::Constant(d)
    }
}

impl From<UnionDistribution> for Distribution {
    fn from(d: UnionDistribution) -> Self {
        Distribution::Union(d)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::UniformBool(d) => {
                write!(f, "{}(default={})", UniformBoolDistribution::TAG, d.default)
            }
            Distribution::UniformInt(d) => write!(
                f,
                "{}(lower={}, upper={}, default={}, log={})",
                UniformIntDistribution::TAG,
                d.lower,
                d.upper,
                d.default_value(),
                d.log
            ),
            Distribution::UniformFloat(d) => write!(
                f,
                "{}(lower={:?}, upper={:?}, default={:?}, log={})",
                UniformFloatDistribution::TAG,
                d.lower,
                d.upper,
                d.default_value(),
                d.log
            ),
            Distribution::Categorical(d) => write!(
                f,
                "{}(choices={:?}, default={})",
                CategoricalDistribution::TAG,
                d.choices,
                d.default_value().unwrap_or_default()
            ),
            Distribution::Constant(d) => {
                write!(f, "{}(value={})", ConstantDistribution::TAG, d.value)
            }
            Distribution::Union(d) => {
                let members: Vec<String> = d.members.iter().map(ToString::to_string).collect();
                write!(f, "{}({})", UnionDistribution::TAG, members.join(", "))
            }
        }
    }
}
