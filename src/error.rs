/// Errors produced while declaring, reducing, sampling, or validating a parameter space.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a name is not declared on the model.
    #[error("unknown parameter '{name}'")]
    UnknownParameter {
        /// The undeclared name.
        name: String,
    },

    /// Returned when a model declares the same parameter twice.
    #[error("parameter '{name}' is declared more than once")]
    DuplicateParameter {
        /// The duplicated name.
        name: String,
    },

    /// Returned when a sampler is given two distributions for one parameter.
    #[error("parameter '{name}' is bound more than once")]
    DuplicateBinding {
        /// The duplicated name.
        name: String,
    },

    /// Returned when a forbidden `In` clause spans values that encode to different names.
    #[error(
        "forbidden clause on '{name}' mixes values encoded as '{first}' and '{second}'; split it by value type"
    )]
    InconsistentForbiddenEncoding {
        /// The logical parameter name.
        name: String,
        /// The encoded name of the first value.
        first: String,
        /// The conflicting encoded name.
        second: String,
    },

    /// Returned when a serialized distribution record carries an unexpected type tag.
    #[error("schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch {
        /// The tag (or set of tags) that was expected.
        expected: String,
        /// The tag that was found, or `<missing>`.
        found: String,
    },

    /// Returned when a combinator is built from conditions with different children,
    /// or from no conditions or clauses at all.
    #[error("invalid combinator: children must share one name, got {names:?}")]
    InvalidCombinator {
        /// The distinct child names that were found.
        names: Vec<String>,
    },

    /// Returned when a bound is not finite or the lower bound is greater than
    /// the upper bound.
    #[error("invalid bounds: lower ({low}) must be less than or equal to upper ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when log scale is used with non-positive bounds.
    #[error("invalid log bounds: lower must be positive for log scale")]
    InvalidLogBounds,

    /// Returned when categorical choices are empty.
    #[error("categorical choices cannot be empty")]
    EmptyChoices,

    /// Returned when a default lies outside the distribution's support.
    #[error("default {default} is outside the distribution's support")]
    InvalidDefault {
        /// The rejected default, rendered for display.
        default: String,
    },

    /// Returned when a union has two members with the same runtime type.
    #[error("union already has a member of type '{type_tag}'")]
    DuplicateUnionMember {
        /// The repeated runtime type tag.
        type_tag: String,
    },

    /// Returned when a union has no members.
    #[error("union distribution needs at least one member")]
    EmptyUnion,

    /// Returned when a union contains another union.
    #[error("union members cannot themselves be unions")]
    NestedUnion,

    /// Returned when a union has no member for the runtime type of a value.
    #[error("unrecognized type for '{name}' with value {value}")]
    UnrecognizedType {
        /// The parameter name.
        name: String,
        /// The offending value, rendered for display.
        value: String,
    },

    /// Returned when a raw draw lacks a key needed to recover a domain value.
    #[error("raw sample is missing '{name}'")]
    MissingSample {
        /// The missing key.
        name: String,
    },

    /// Returned when a space refers to a primitive that was never registered.
    #[error("hyperparameter '{name}' is not registered")]
    UnknownHyperparameter {
        /// The unregistered name.
        name: String,
    },

    /// Returned when a primitive is registered twice.
    #[error("hyperparameter '{name}' is already registered")]
    DuplicateHyperparameter {
        /// The duplicated name.
        name: String,
    },

    /// Returned when registered conditions form a cycle.
    #[error("conditions form a cycle through '{name}'")]
    ConditionCycle {
        /// A primitive on the cycle.
        name: String,
    },

    /// Returned when rejection sampling cannot find a feasible draw.
    #[error("no feasible configuration found after {attempts} attempts")]
    SamplingExhausted {
        /// The number of rejected draws.
        attempts: usize,
    },

    /// Returned when a parameter name is not accepted by the validator.
    #[error("{name} is a invalid parameter name")]
    InvalidParamName {
        /// The rejected name.
        name: String,
    },

    /// Returned when a value has the wrong runtime type.
    #[error("{name} must be of type {expected}")]
    InvalidParamType {
        /// The parameter name.
        name: String,
        /// The accepted type names.
        expected: String,
    },

    /// Returned when a numeric value falls outside its interval.
    #[error("{name} with value {value} not in range: {range}")]
    InvalidParamRange {
        /// The parameter name.
        name: String,
        /// The offending value, rendered for display.
        value: String,
        /// The interval, e.g. `[0, inf)`.
        range: String,
    },

    /// Returned when a string value is not among the allowed choices.
    #[error("{name} must be one of {choices:?}")]
    InvalidParamChoices {
        /// The parameter name.
        name: String,
        /// The allowed choices.
        choices: Vec<String>,
    },

    /// Returned when a configuration matches a forbidden clause.
    #[error("{name} with value {value} is forbidden")]
    ForbiddenValue {
        /// The forbidden name(s), joined with `and`.
        name: String,
        /// The forbidden value(s), joined with `and`.
        value: String,
    },

    /// Returned when a conditioned parameter is set while its condition is inactive.
    #[error("{name} has an unmet condition: {condition}")]
    InactiveConditionedValue {
        /// The conditioned parameter.
        name: String,
        /// The condition, rendered for display.
        condition: String,
    },

    /// Returned when JSON (de)serialization fails.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Convenience alias with [`Error`] as the error type.
pub type Result<T> = core::result::Result<T, Error>;
