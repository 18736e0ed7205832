#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Declarative parameter spaces with conditions, forbidden combinations, and
//! union-typed distributions, plus a sampler that draws valid configurations
//! from any subset of them.
//!
//! # Getting Started
//!
//! Declare the component once, bind distributions to the parameters you want
//! to explore, and sample:
//!
//! ```
//! use paramspace::prelude::*;
//!
//! let model = Model::builder()
//!     .param("kernel", Param::string(["linear", "poly", "rbf"]))
//!     .param("degree", Param::Int)
//!     .param("gamma", Param::union([Param::string(["scale", "auto"]), Param::Float]))
//!     .condition(Condition::equals("degree", "kernel", "poly"))
//!     .condition(Condition::is_in("gamma", "kernel", ["poly", "rbf"]))
//!     .build()
//!     .unwrap();
//!
//! let sampler = Sampler::with_seed(
//!     model,
//!     [
//!         ("kernel", Distribution::categorical(["linear", "poly", "rbf"])),
//!         ("degree", Distribution::int(2, 5)),
//!         (
//!             "gamma",
//!             Distribution::union([
//!                 Distribution::categorical(["scale", "auto"]),
//!                 UniformFloatDistribution::new(1e-4, 1.0).log().into(),
//!             ]),
//!         ),
//!     ],
//!     7,
//! )
//! .unwrap();
//!
//! for config in sampler.sample(20).unwrap() {
//!     let poly = config["kernel"] == Value::from("poly");
//!     assert_eq!(config.contains_key("degree"), poly);
//!     assert!(!config.contains_key("gamma:control"));
//! }
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Model`](model::Model) | Declared parameters, conditions, forbidden clauses, and defaults. |
//! | [`Distribution`](distribution::Distribution) | How to draw one parameter: bool, int, float, categorical, constant, or a union of these. |
//! | [`Condition`](condition::Condition) | A child parameter is only meaningful when its parent satisfies a predicate. |
//! | [`ForbiddenClause`](forbidden::ForbiddenClause) | A value, or a conjunction of values, that may never co-occur. |
//! | [`Sampler`] | Reduces the model to the bound parameters and draws configurations. |
//! | [`ConfigSpace`](space::ConfigSpace) | The constraint-satisfying engine the reduced space is registered with. |
//!
//! # Reduction
//!
//! Binding only some parameters can leave conditions and forbidden clauses
//! pointing at parameters that will never be drawn. The [`reduce`](reduce::reduce)
//! pass drops those constraints (and the children they were the only way to
//! enable), then rewrites what survives so that union-typed parameters appear
//! as a selector plus one slot per member type. The sampler folds the slots
//! back into a single value after every draw.
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) during reduction and sampling | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod condition;
pub mod distribution;
mod error;
pub mod forbidden;
pub mod model;
pub mod parameter;
pub mod reduce;
mod rng_util;
mod sampler;
pub mod space;
pub mod value;

pub use error::{Error, Result};
pub use sampler::{Sampler, SpaceFactory};
pub use value::{Assignment, Value};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use paramspace::prelude::*;
/// ```
pub mod prelude {
    pub use crate::condition::Condition;
    pub use crate::distribution::{
        CategoricalDistribution, ConstantDistribution, Distribution, UniformBoolDistribution,
        UniformFloatDistribution, UniformIntDistribution, UnionDistribution,
    };
    pub use crate::error::{Error, Result};
    pub use crate::forbidden::ForbiddenClause;
    pub use crate::model::Model;
    pub use crate::parameter::{Interval, Param};
    pub use crate::sampler::Sampler;
    pub use crate::space::{ConfigSpace, RandomSpace};
    pub use crate::value::{Assignment, Value, ValueType};
}
