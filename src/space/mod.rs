//! The constraint-satisfying sampler that reduced spaces are registered with.
//!
//! A [`ConfigSpace`] accepts primitive [`Hyperparameter`] declarations plus
//! conditions and forbidden clauses over them, and draws feasible flat
//! assignments. The [`Sampler`](crate::Sampler) treats it as an oracle: it
//! never inspects how draws are produced, only that every draw honors every
//! registered constraint.
//!
//! [`RandomSpace`] is the bundled implementation (uniform draws with
//! rejection of forbidden combinations). Implement the trait to plug in
//! another engine.

mod random;

use core::fmt;

pub use random::RandomSpace;

use crate::condition::Condition;
use crate::error::Result;
use crate::forbidden::ForbiddenClause;
use crate::value::{Assignment, Value};

/// A primitive parameter declaration understood by a [`ConfigSpace`].
///
/// Raw values drawn for these are strings, integers, or floats; mapping them
/// back to domain values is the job of [`Distribution`](crate::distribution::Distribution).
#[derive(Clone, Debug, PartialEq)]
pub enum Hyperparameter {
    /// One of a fixed list of string tokens.
    Categorical {
        /// Registered name.
        name: String,
        /// Allowed tokens.
        choices: Vec<String>,
        /// Default token.
        default: String,
    },
    /// An integer in `[lower, upper]`.
    Integer {
        /// Registered name.
        name: String,
        /// Lower bound (inclusive).
        lower: i64,
        /// Upper bound (inclusive).
        upper: i64,
        /// Default value.
        default: i64,
        /// Whether to sample in log space.
        log: bool,
    },
    /// A float in `[lower, upper]`.
    Float {
        /// Registered name.
        name: String,
        /// Lower bound (inclusive).
        lower: f64,
        /// Upper bound (inclusive).
        upper: f64,
        /// Default value.
        default: f64,
        /// Whether to sample in log space.
        log: bool,
    },
    /// A single fixed value.
    Constant {
        /// Registered name.
        name: String,
        /// The only value.
        value: Value,
    },
}

impl Hyperparameter {
    /// Returns the registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Hyperparameter::Categorical { name, .. }
            | Hyperparameter::Integer { name, .. }
            | Hyperparameter::Float { name, .. }
            | Hyperparameter::Constant { name, .. } => name,
        }
    }

    /// Returns the default raw value.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Hyperparameter::Categorical { default, .. } => Value::Str(default.clone()),
            Hyperparameter::Integer { default, .. } => Value::Int(*default),
            Hyperparameter::Float { default, .. } => Value::Float(*default),
            Hyperparameter::Constant { value, .. } => value.clone(),
        }
    }

    /// Returns `true` if `value` is a legal raw value for this primitive.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Hyperparameter::Categorical { choices, .. } => value
                .as_str()
                .is_some_and(|s| choices.iter().any(|c| c == s)),
            Hyperparameter::Integer { lower, upper, .. } => {
                value.as_i64().is_some_and(|v| (*lower..=*upper).contains(&v))
            }
            Hyperparameter::Float { lower, upper, .. } => {
                value.as_f64().is_some_and(|v| (*lower..=*upper).contains(&v))
            }
            Hyperparameter::Constant { value: fixed, .. } => fixed == value,
        }
    }
}

impl fmt::Display for Hyperparameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hyperparameter::Categorical { name, choices, .. } => {
                write!(f, "{name}, Type: Categorical, Choices: {{{}}}", choices.join(", "))
            }
            Hyperparameter::Integer {
                name,
                lower,
                upper,
                log,
                ..
            } => write!(
                f,
                "{name}, Type: UniformInteger, Range: [{lower}, {upper}]{}",
                if *log { ", on log-scale" } else { "" }
            ),
            Hyperparameter::Float {
                name,
                lower,
                upper,
                log,
                ..
            } => write!(
                f,
                "{name}, Type: UniformFloat, Range: [{lower}, {upper}]{}",
                if *log { ", on log-scale" } else { "" }
            ),
            Hyperparameter::Constant { name, value } => {
                write!(f, "{name}, Type: Constant, Value: {value}")
            }
        }
    }
}

/// A space of primitive parameters, conditions, and forbidden clauses that
/// can draw feasible assignments.
///
/// Conditions and forbidden clauses may only refer to names that were
/// registered earlier. The trait requires `Send + Sync` so a sampler holding
/// a space can be shared across threads for read-only sampling.
pub trait ConfigSpace: Send + Sync {
    /// Registers a primitive parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered.
    fn add_hyperparameter(&mut self, hyperparameter: Hyperparameter) -> Result<()>;

    /// Registers a condition between two or more registered primitives.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced name is unknown or the condition
    /// would create a cycle.
    fn add_condition(&mut self, condition: Condition) -> Result<()>;

    /// Registers a forbidden clause over registered primitives.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced name is unknown.
    fn add_forbidden(&mut self, clause: ForbiddenClause) -> Result<()>;

    /// Returns the registered primitives in registration order.
    fn hyperparameters(&self) -> Vec<&Hyperparameter>;

    /// Draws `count` feasible assignments.
    ///
    /// Each assignment holds exactly the primitives that are active in that
    /// draw, satisfies every registered condition, and matches no registered
    /// forbidden clause.
    ///
    /// # Errors
    ///
    /// Returns an error if the space cannot produce a feasible draw.
    fn sample(&self, count: usize) -> Result<Vec<Assignment>>;

    /// Looks up a registered primitive by name.
    fn hyperparameter(&self, name: &str) -> Option<&Hyperparameter> {
        self.hyperparameters().into_iter().find(|hp| hp.name() == name)
    }
}
