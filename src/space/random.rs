//! Uniform random configuration space with rejection of forbidden draws.

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;

use super::{ConfigSpace, Hyperparameter};
use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::forbidden::ForbiddenClause;
use crate::rng_util;
use crate::value::{Assignment, Value};

const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// A configuration space that draws every active primitive uniformly at random.
///
/// Primitives are visited parents-first. A primitive with conditions is drawn
/// only when all of its conditions are satisfied by the values drawn so far.
/// A draw that matches any forbidden clause is rejected and redrawn, up to
/// [`max_attempts`](Self::max_attempts) times per requested assignment.
///
/// # Examples
///
/// ```
/// use paramspace::condition::Condition;
/// use paramspace::space::{ConfigSpace, Hyperparameter, RandomSpace};
///
/// let mut space = RandomSpace::with_seed(42);
/// space
///     .add_hyperparameter(Hyperparameter::Categorical {
///         name: "kernel".into(),
///         choices: vec!["linear".into(), "rbf".into()],
///         default: "rbf".into(),
///     })
///     .unwrap();
/// space
///     .add_hyperparameter(Hyperparameter::Float {
///         name: "gamma".into(),
///         lower: 1e-3,
///         upper: 1.0,
///         default: 0.1,
///         log: true,
///     })
///     .unwrap();
/// space
///     .add_condition(Condition::equals("gamma", "kernel", "rbf"))
///     .unwrap();
///
/// for draw in space.sample(20).unwrap() {
///     assert_eq!(draw.contains_key("gamma"), draw["kernel"].as_str() == Some("rbf"));
/// }
/// ```
pub struct RandomSpace {
    hyperparameters: Vec<Hyperparameter>,
    index: HashMap<String, usize>,
    conditions: Vec<Condition>,
    forbiddens: Vec<ForbiddenClause>,
    order: Vec<usize>,
    max_attempts: usize,
    rng: Mutex<fastrand::Rng>,
}

impl RandomSpace {
    /// Creates an empty space with a default random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(fastrand::Rng::new())
    }

    /// Creates an empty space with a fixed seed for reproducibility.
    ///
    /// Using the same seed and the same registrations produces the same draws.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(fastrand::Rng::with_seed(seed))
    }

    fn from_rng(rng: fastrand::Rng) -> Self {
        Self {
            hyperparameters: Vec::new(),
            index: HashMap::new(),
            conditions: Vec::new(),
            forbiddens: Vec::new(),
            order: Vec::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rng: Mutex::new(rng),
        }
    }

    /// Sets how many rejected draws are tolerated per requested assignment.
    ///
    /// Defaults to 1000. Values below 1 are treated as 1.
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Returns the registered conditions in registration order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns the registered forbidden clauses in registration order.
    #[must_use]
    pub fn forbiddens(&self) -> &[ForbiddenClause] {
        &self.forbiddens
    }

    fn require(&self, name: &str) -> Result<()> {
        if self.index.contains_key(name) {
            Ok(())
        } else {
            Err(Error::UnknownHyperparameter {
                name: name.to_owned(),
            })
        }
    }

    /// Orders primitives parents-first, preferring registration order among
    /// primitives that are ready at the same time.
    fn topological_order(&self) -> Result<Vec<usize>> {
        let n = self.hyperparameters.len();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0_usize; n];
        for condition in &self.conditions {
            let child = self.index[condition.child()];
            for parent in condition.parents() {
                let parent = self.index[parent];
                children[parent].push(child);
                in_degree[child] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &child in &children[next] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    ready.insert(child);
                }
            }
        }

        if order.len() < n {
            let stuck = (0..n).find(|&i| in_degree[i] > 0).unwrap_or(0);
            return Err(Error::ConditionCycle {
                name: self.hyperparameters[stuck].name().to_owned(),
            });
        }
        Ok(order)
    }

    fn draw(&self, rng: &mut fastrand::Rng) -> Assignment {
        let mut values = Assignment::with_capacity(self.order.len());
        for &i in &self.order {
            let hp = &self.hyperparameters[i];
            let active = self
                .conditions
                .iter()
                .filter(|c| c.child() == hp.name())
                .all(|c| c.is_satisfied(&values));
            if active {
                values.insert(hp.name().to_owned(), sample_hyperparameter(hp, rng));
            }
        }
        values
    }
}

impl Default for RandomSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSpace for RandomSpace {
    #[allow(clippy::cast_precision_loss)]
    fn add_hyperparameter(&mut self, hyperparameter: Hyperparameter) -> Result<()> {
        let name = hyperparameter.name().to_owned();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateHyperparameter { name });
        }
        match &hyperparameter {
            Hyperparameter::Categorical { choices, .. } if choices.is_empty() => {
                return Err(Error::EmptyChoices);
            }
            Hyperparameter::Integer { lower, upper, .. } if lower > upper => {
                return Err(Error::InvalidBounds {
                    low: *lower as f64,
                    high: *upper as f64,
                });
            }
            Hyperparameter::Float { lower, upper, .. } if !lower.is_finite() || !upper.is_finite() || lower > upper => {
                return Err(Error::InvalidBounds {
                    low: *lower,
                    high: *upper,
                });
            }
            _ => {}
        }
        self.index.insert(name, self.hyperparameters.len());
        self.order.push(self.hyperparameters.len());
        self.hyperparameters.push(hyperparameter);
        Ok(())
    }

    fn add_condition(&mut self, condition: Condition) -> Result<()> {
        self.require(condition.child())?;
        for parent in condition.parents() {
            self.require(parent)?;
        }
        self.conditions.push(condition);
        match self.topological_order() {
            Ok(order) => {
                self.order = order;
                Ok(())
            }
            Err(err) => {
                self.conditions.pop();
                Err(err)
            }
        }
    }

    fn add_forbidden(&mut self, clause: ForbiddenClause) -> Result<()> {
        for name in clause.names() {
            self.require(name)?;
        }
        self.forbiddens.push(clause);
        Ok(())
    }

    fn hyperparameters(&self) -> Vec<&Hyperparameter> {
        self.hyperparameters.iter().collect()
    }

    fn sample(&self, count: usize) -> Result<Vec<Assignment>> {
        let mut rng = self.rng.lock();
        let mut draws = Vec::with_capacity(count);
        let mut rejected_total = 0_usize;

        while draws.len() < count {
            let mut attempts = 0;
            loop {
                let draw = self.draw(&mut rng);
                if !self.forbiddens.iter().any(|f| f.is_forbidden(&draw)) {
                    draws.push(draw);
                    break;
                }
                attempts += 1;
                rejected_total += 1;
                if attempts >= self.max_attempts {
                    return Err(Error::SamplingExhausted { attempts });
                }
            }
        }

        trace_debug!(count, rejected = rejected_total, "configuration batch drawn");
        Ok(draws)
    }

    fn hyperparameter(&self, name: &str) -> Option<&Hyperparameter> {
        self.index.get(name).map(|&i| &self.hyperparameters[i])
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn sample_hyperparameter(hp: &Hyperparameter, rng: &mut fastrand::Rng) -> Value {
    match hp {
        Hyperparameter::Categorical { choices, .. } => {
            let index = rng.usize(0..choices.len());
            Value::Str(choices[index].clone())
        }
        Hyperparameter::Integer {
            lower, upper, log, ..
        } => {
            let value = if *log {
                rng_util::log_i64_range(rng, *lower, *upper)
            } else {
                rng.i64(*lower..=*upper)
            };
            Value::Int(value)
        }
        Hyperparameter::Float {
            lower, upper, log, ..
        } => {
            let value = if *log {
                rng_util::log_f64_range(rng, *lower, *upper)
            } else {
                rng_util::f64_range(rng, *lower, *upper)
            };
            Value::Float(value)
        }
        Hyperparameter::Constant { value, .. } => value.clone(),
    }
}
