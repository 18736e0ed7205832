//! The sampler facade: bind distributions, reduce, register, draw.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::reduce::{ActiveSpace, reduce};
use crate::space::{ConfigSpace, RandomSpace};
use crate::value::Assignment;

/// Creates a fresh, empty [`ConfigSpace`] for every rebuild of the active space.
pub type SpaceFactory = dyn Fn() -> Box<dyn ConfigSpace> + Send + Sync;

/// The reduced space together with the oracle it was registered with.
/// Rebuilt as a whole and swapped in, never patched.
struct ActiveState {
    active: ActiveSpace,
    space: Box<dyn ConfigSpace>,
}

/// Draws configurations for the parameters bound to distributions.
///
/// Construction binds distributions to a subset of a [`Model`]'s parameters,
/// reduces the model's constraints to that subset, and registers the result
/// with a [`ConfigSpace`]. [`sample`](Self::sample) then returns assignments
/// keyed by logical parameter name with domain-typed values.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use paramspace::prelude::*;
///
/// let model = Model::builder()
///     .param("kernel", Param::string(["linear", "rbf"]))
///     .param("gamma", Param::Float)
///     .condition(Condition::equals("gamma", "kernel", "rbf"))
///     .build()
///     .unwrap();
///
/// let sampler = Sampler::with_seed(
///     Arc::new(model),
///     [
///         ("kernel", Distribution::categorical(["linear", "rbf"])),
///         ("gamma", Distribution::float(0.001, 1.0)),
///     ],
///     42,
/// )
/// .unwrap();
///
/// for config in sampler.sample(10).unwrap() {
///     let rbf = config["kernel"] == Value::from("rbf");
///     assert_eq!(config.contains_key("gamma"), rbf);
/// }
/// ```
pub struct Sampler {
    model: Arc<Model>,
    distributions: BTreeMap<String, Distribution>,
    factory: Arc<SpaceFactory>,
    state: ActiveState,
}

impl Sampler {
    /// Creates a sampler backed by a [`RandomSpace`] with a random seed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownParameter`](crate::Error::UnknownParameter) if a
    /// name is not declared on `model`,
    /// [`Error::DuplicateBinding`](crate::Error::DuplicateBinding) if a name
    /// is bound twice, a validation error for an invalid distribution, or any
    /// reduction or registration error.
    pub fn new<S: Into<String>>(
        model: impl Into<Arc<Model>>,
        distributions: impl IntoIterator<Item = (S, Distribution)>,
    ) -> Result<Self> {
        Self::with_space(model, distributions, || Box::new(RandomSpace::new()))
    }

    /// Creates a sampler backed by a [`RandomSpace`] seeded with `seed`.
    ///
    /// Every rebuild (including [`restore`](Self::restore)) reseeds, so the
    /// same distributions always produce the same draws.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_seed<S: Into<String>>(
        model: impl Into<Arc<Model>>,
        distributions: impl IntoIterator<Item = (S, Distribution)>,
        seed: u64,
    ) -> Result<Self> {
        Self::with_space(model, distributions, move || Box::new(RandomSpace::with_seed(seed)))
    }

    /// Creates a sampler backed by spaces produced by `factory`.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_space<S: Into<String>>(
        model: impl Into<Arc<Model>>,
        distributions: impl IntoIterator<Item = (S, Distribution)>,
        factory: impl Fn() -> Box<dyn ConfigSpace> + Send + Sync + 'static,
    ) -> Result<Self> {
        let model = model.into();
        let factory: Arc<SpaceFactory> = Arc::new(factory);
        let mut bound = BTreeMap::new();
        for (name, dist) in distributions {
            let name: String = name.into();
            if bound.contains_key(&name) {
                return Err(Error::DuplicateBinding { name });
            }
            bound.insert(name, dist);
        }
        let distributions = bound;
        let state = build_state(&model, &distributions, factory.as_ref())?;
        Ok(Self {
            model,
            distributions,
            factory,
            state,
        })
    }

    /// Recreates a sampler from records produced by [`to_records`](Self::to_records).
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`](crate::Error::SchemaMismatch) for a
    /// record with a missing or unknown tag, or any error from [`new`](Self::new).
    pub fn from_records(
        model: impl Into<Arc<Model>>,
        records: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Self> {
        Self::new(model, parse_records(records)?)
    }

    /// Recreates a sampler from JSON produced by [`to_json`](Self::to_json).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serde`](crate::Error::Serde) for malformed JSON, or
    /// any error from [`from_records`](Self::from_records).
    pub fn from_json(model: impl Into<Arc<Model>>, json: &str) -> Result<Self> {
        let records: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        Self::from_records(model, &records)
    }

    /// Draws `count` configurations.
    ///
    /// Each configuration maps every active bound parameter to a value in its
    /// distribution's support. Inactive parameters are absent; union
    /// selectors and slots never appear. `count == 0` yields an empty `Vec`.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying space, or
    /// [`Error::UnrecognizedType`](crate::Error::UnrecognizedType) if a raw
    /// draw cannot be decoded.
    pub fn sample(&self, count: usize) -> Result<Vec<Assignment>> {
        let mut draws = self.state.space.sample(count)?;
        for draw in &mut draws {
            for (name, dist) in &self.distributions {
                dist.post_process(name, draw)?;
            }
        }
        Ok(draws)
    }

    /// Describes the bound distributions as one tagged record per parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serde`](crate::Error::Serde) if a distribution fails
    /// to serialize.
    pub fn to_records(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        self.distributions
            .iter()
            .map(|(name, dist)| dist.to_record().map(|record| (name.clone(), record)))
            .collect()
    }

    /// Serializes [`to_records`](Self::to_records) as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serde`](crate::Error::Serde) if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_records()?)?)
    }

    /// Replaces the bound distributions with those in `records` and rebuilds
    /// the active space.
    ///
    /// On error the sampler is left unchanged.
    ///
    /// # Errors
    ///
    /// See [`from_records`](Self::from_records).
    pub fn restore(&mut self, records: &BTreeMap<String, serde_json::Value>) -> Result<()> {
        let distributions = parse_records(records)?;
        let state = build_state(&self.model, &distributions, self.factory.as_ref())?;
        self.distributions = distributions;
        self.state = state;
        Ok(())
    }

    /// The model this sampler draws for.
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The bound distributions, by logical name.
    #[must_use]
    pub fn distributions(&self) -> &BTreeMap<String, Distribution> {
        &self.distributions
    }

    /// The reduced, encoded constraint subgraph currently registered.
    #[must_use]
    pub fn active_space(&self) -> &ActiveSpace {
        &self.state.active
    }

    /// The space the active subgraph is registered with.
    #[must_use]
    pub fn space(&self) -> &dyn ConfigSpace {
        self.state.space.as_ref()
    }
}

fn parse_records(records: &BTreeMap<String, serde_json::Value>) -> Result<BTreeMap<String, Distribution>> {
    records
        .iter()
        .map(|(name, record)| Distribution::from_record(record).map(|dist| (name.clone(), dist)))
        .collect()
}

fn build_state(
    model: &Model,
    distributions: &BTreeMap<String, Distribution>,
    factory: &SpaceFactory,
) -> Result<ActiveState> {
    for dist in distributions.values() {
        dist.validate()?;
    }
    let active = reduce(model, distributions)?;
    let mut space = factory();
    active.register(distributions, space.as_mut())?;
    trace_info!(
        bound = distributions.len(),
        active = active.names().len(),
        "active space rebuilt"
    );
    Ok(ActiveState { active, space })
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("distributions", &self.distributions)
            .field("active", &self.state.active)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, dist)) in self.distributions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{name}: {dist}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::parameter::Param;
    use crate::value::Value;

    fn svc() -> Arc<Model> {
        Arc::new(
            Model::builder()
                .param("kernel", Param::string(["linear", "rbf"]))
                .param("gamma", Param::Float)
                .param("C", Param::Float)
                .condition(Condition::equals("gamma", "kernel", "rbf"))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn single_draw_is_still_a_vec() {
        let sampler = Sampler::with_seed(svc(), [("C", Distribution::float(0.1, 10.0))], 1).unwrap();
        let draws = sampler.sample(1).unwrap();
        assert_eq!(draws.len(), 1);
        assert!(sampler.sample(0).unwrap().is_empty());
    }

    #[test]
    fn invalid_distribution_is_rejected() {
        assert!(matches!(
            Sampler::new(svc(), [("C", Distribution::float(10.0, 0.1))]),
            Err(Error::InvalidBounds { .. })
        ));
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let err = Sampler::new(
            svc(),
            [
                ("C", Distribution::float(0.1, 1.0)),
                ("C", Distribution::float(1.0, 10.0)),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateBinding { ref name } if name == "C"));
        assert_eq!(err.to_string(), "parameter 'C' is bound more than once");
    }

    #[test]
    fn restore_swaps_distributions() {
        let mut sampler = Sampler::with_seed(svc(), [("C", Distribution::float(0.1, 10.0))], 3).unwrap();
        let records = BTreeMap::from([(
            "kernel".to_owned(),
            Distribution::categorical(["linear"]).to_record().unwrap(),
        )]);
        sampler.restore(&records).unwrap();
        assert_eq!(sampler.active_space().names(), ["kernel"]);
        for draw in sampler.sample(5).unwrap() {
            assert_eq!(draw.len(), 1);
            assert_eq!(draw["kernel"], Value::from("linear"));
        }
    }

    #[test]
    fn failed_restore_keeps_previous_state() {
        let mut sampler = Sampler::with_seed(svc(), [("C", Distribution::float(0.1, 10.0))], 3).unwrap();
        let records = BTreeMap::from([("degree".to_owned(), Distribution::int(1, 3).to_record().unwrap())]);
        assert!(matches!(
            sampler.restore(&records),
            Err(Error::UnknownParameter { .. })
        ));
        assert_eq!(sampler.active_space().names(), ["C"]);
        assert!(sampler.distributions().contains_key("C"));
    }

    #[test]
    fn display_lists_bindings() {
        let sampler = Sampler::with_seed(
            svc(),
            [
                ("kernel", Distribution::categorical(["rbf"])),
                ("C", Distribution::int(1, 10)),
            ],
            0,
        )
        .unwrap();
        assert_eq!(
            sampler.to_string(),
            "C: UniformIntDistribution(lower=1, upper=10, default=1, log=false)\n\
             kernel: CategoricalDistribution(choices=[\"rbf\"], default=rbf)"
        );
    }
}
