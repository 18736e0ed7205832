//! Active-space reduction.
//!
//! Given a [`Model`] and the distributions a caller bound to a subset of its
//! parameters, [`reduce`] derives the constraint subgraph that can actually be
//! sampled:
//!
//! 1. Conditions are kept only if every parent they need is active and the
//!    conditioned value lies in the parent's support. A child whose condition
//!    is dropped is excluded too, unless it is a constant. Exclusions cascade
//!    until the active set is stable.
//! 2. Constants that no surviving condition gates appear in every draw. A
//!    forbidden clause that always fires on such constants excludes them, and
//!    step 1 runs again until nothing more is excluded.
//! 3. Forbidden clauses are kept only if every conjunct could occur. Values
//!    outside a parameter's support are filtered out. Conjuncts on ungated
//!    constants always hold and are dropped from conjunctions; conjuncts on
//!    gated constants are kept, since they only hold while the constant is
//!    active.
//! 4. Everything that survives is rewritten into the encoded namespace, where
//!    unions appear as a selector plus one slot per member type.
//!
//! Reduction never fails because a constraint became unsatisfiable; it drops
//! the constraint (and, for conditions, the child) instead.

use std::collections::{BTreeMap, HashSet};

use crate::condition::{CompoundKind, Condition, InCondition, ValueCondition};
use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::forbidden::{ForbiddenClause, ForbiddenIn};
use crate::model::Model;
use crate::space::ConfigSpace;
use crate::value::Value;

/// The reduced, encoded constraint subgraph for one distribution assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveSpace {
    names: Vec<String>,
    conditions: Vec<Condition>,
    forbiddens: Vec<ForbiddenClause>,
}

impl ActiveSpace {
    /// Logical names of the active parameters, in model declaration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Surviving conditions, in the encoded namespace.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Surviving forbidden clauses, in the encoded namespace.
    #[must_use]
    pub fn forbiddens(&self) -> &[ForbiddenClause] {
        &self.forbiddens
    }

    /// Returns `true` if the logical parameter `name` is active.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Registers the active parameters, then the conditions, then the
    /// forbidden clauses with `space`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownParameter`] if an active name has no entry in
    /// `distributions`, or any registration error from the space.
    pub fn register(
        &self,
        distributions: &BTreeMap<String, Distribution>,
        space: &mut dyn ConfigSpace,
    ) -> Result<()> {
        for name in &self.names {
            lookup(distributions, name)?.register(name, space)?;
        }
        for condition in &self.conditions {
            space.add_condition(condition.clone())?;
        }
        for clause in &self.forbiddens {
            space.add_forbidden(clause.clone())?;
        }
        Ok(())
    }
}

/// Outcome of pruning one forbidden clause against the active set.
enum Pruned {
    /// The (possibly narrowed) clause can fire on some configurations.
    Keep(ForbiddenClause),
    /// The clause can never fire.
    Vacuous,
    /// The clause fires on every configuration.
    AlwaysFires,
}

/// Reduces `model` to the parameters bound in `distributions`.
///
/// # Errors
///
/// Returns [`Error::UnknownParameter`] if `distributions` binds a name the
/// model does not declare, [`Error::InconsistentForbiddenEncoding`] if a
/// forbidden `In` clause spans several union slots, or
/// [`Error::UnrecognizedType`] if a surviving value has no union member.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use paramspace::condition::Condition;
/// use paramspace::distribution::Distribution;
/// use paramspace::model::Model;
/// use paramspace::parameter::Param;
/// use paramspace::reduce::reduce;
///
/// let model = Model::builder()
///     .param("kernel", Param::string(["linear", "poly"]))
///     .param("degree", Param::Int)
///     .condition(Condition::equals("degree", "kernel", "poly"))
///     .build()
///     .unwrap();
///
/// // `kernel` can never be "poly", so `degree` can never be active.
/// let dists = BTreeMap::from([
///     ("kernel".to_owned(), Distribution::categorical(["linear"])),
///     ("degree".to_owned(), Distribution::int(1, 5)),
/// ]);
/// let active = reduce(&model, &dists).unwrap();
/// assert_eq!(active.names(), ["kernel"]);
/// assert!(active.conditions().is_empty());
/// ```
pub fn reduce(model: &Model, distributions: &BTreeMap<String, Distribution>) -> Result<ActiveSpace> {
    if let Some(name) = distributions.keys().find(|name| !model.contains(name)) {
        return Err(Error::UnknownParameter { name: name.clone() });
    }

    let mut active: HashSet<&str> = model
        .param_names()
        .filter(|name| distributions.contains_key(*name))
        .collect();

    let (conditions, unconditional) = loop {
        let conditions = prune_conditions(model, distributions, &mut active);
        let unconditional = unconditional_constants(&active, &conditions, distributions);
        if !exclude_forbidden_constants(model, distributions, &unconditional, &mut active) {
            break (conditions, unconditional);
        }
    };

    let mut forbiddens = Vec::new();
    for clause in model.forbiddens() {
        match prune_forbidden(clause, &active, &unconditional, distributions) {
            Pruned::Keep(kept) => forbiddens.push(kept),
            Pruned::Vacuous => {
                trace_debug!(clause = %clause, "forbidden clause dropped");
            }
            Pruned::AlwaysFires => {
                return Err(Error::Internal("forbidden clause fires on every configuration"));
            }
        }
    }

    let names: Vec<String> = model
        .param_names()
        .filter(|name| active.contains(name))
        .map(str::to_owned)
        .collect();
    let conditions = conditions
        .iter()
        .map(|c| encode_condition(c, distributions))
        .collect::<Result<Vec<_>>>()?;
    let forbiddens = forbiddens
        .iter()
        .map(|f| encode_forbidden(f, distributions))
        .collect::<Result<Vec<_>>>()?;

    trace_info!(
        params = names.len(),
        conditions = conditions.len(),
        forbiddens = forbiddens.len(),
        "active space reduced"
    );
    Ok(ActiveSpace {
        names,
        conditions,
        forbiddens,
    })
}

/// Active constants that no surviving condition gates, and so appear in
/// every draw.
fn unconditional_constants<'m>(
    active: &HashSet<&'m str>,
    conditions: &[Condition],
    distributions: &BTreeMap<String, Distribution>,
) -> HashSet<&'m str> {
    active
        .iter()
        .copied()
        .filter(|name| distributions.get(*name).is_some_and(Distribution::is_constant))
        .filter(|name| conditions.iter().all(|c| c.child() != *name))
        .collect()
}

/// A forbidden clause that fires whatever is drawn can only be honored by
/// never sampling the constants it names. Returns `true` if any constant
/// was excluded.
fn exclude_forbidden_constants<'m>(
    model: &'m Model,
    distributions: &BTreeMap<String, Distribution>,
    unconditional: &HashSet<&str>,
    active: &mut HashSet<&'m str>,
) -> bool {
    let mut excluded = false;
    for clause in model.forbiddens() {
        if !matches!(
            prune_forbidden(clause, active, unconditional, distributions),
            Pruned::AlwaysFires
        ) {
            continue;
        }
        for name in clause.names() {
            if unconditional.contains(name) && active.remove(name) {
                excluded = true;
                trace_debug!(name, reason = "forbidden constant", "parameter dropped");
            }
        }
    }
    excluded
}

/// Scans the conditions in declaration order, dropping unsatisfiable ones
/// and their children, and rescans until no more children are dropped.
fn prune_conditions<'m>(
    model: &'m Model,
    distributions: &BTreeMap<String, Distribution>,
    active: &mut HashSet<&'m str>,
) -> Vec<Condition> {
    loop {
        let before = active.len();
        let mut kept = Vec::new();
        for condition in model.conditions() {
            let child = condition.child();
            if !active.contains(child) {
                continue;
            }
            if let Some(pruned) = prune_condition(condition, active, distributions) {
                kept.push(pruned);
                continue;
            }
            trace_debug!(condition = %condition, "condition dropped");
            let constant = distributions.get(child).is_some_and(Distribution::is_constant);
            if !constant {
                active.remove(child);
                trace_debug!(name = child, reason = "unsatisfiable condition", "parameter dropped");
            }
        }
        if active.len() == before {
            return kept;
        }
    }
}

/// The distribution of `parent` if it is active.
fn active_parent<'d>(
    parent: &str,
    active: &HashSet<&str>,
    distributions: &'d BTreeMap<String, Distribution>,
) -> Option<&'d Distribution> {
    if active.contains(parent) {
        distributions.get(parent)
    } else {
        None
    }
}

fn prune_condition(
    condition: &Condition,
    active: &HashSet<&str>,
    distributions: &BTreeMap<String, Distribution>,
) -> Option<Condition> {
    match condition {
        Condition::Or(c) => {
            let survivors: Vec<Condition> = c
                .conditions()
                .iter()
                .filter_map(|inner| prune_condition(inner, active, distributions))
                .collect();
            if survivors.is_empty() {
                None
            } else {
                Some(Condition::compound(CompoundKind::Or, c.child().to_owned(), survivors))
            }
        }
        Condition::And(c) => {
            let survivors = c
                .conditions()
                .iter()
                .map(|inner| prune_condition(inner, active, distributions))
                .collect::<Option<Vec<_>>>()?;
            Some(Condition::compound(CompoundKind::And, c.child().to_owned(), survivors))
        }
        Condition::In(c) => {
            let dist = active_parent(&c.parent, active, distributions)?;
            let values: Vec<Value> = c.values.iter().filter(|v| dist.in_support(v)).cloned().collect();
            if values.is_empty() {
                return None;
            }
            Some(Condition::In(InCondition {
                child: c.child.clone(),
                parent: c.parent.clone(),
                values,
            }))
        }
        Condition::Equals(c)
        | Condition::NotEquals(c)
        | Condition::LessThan(c)
        | Condition::GreaterThan(c) => {
            let dist = active_parent(&c.parent, active, distributions)?;
            dist.in_support(&c.value).then(|| condition.clone())
        }
    }
}

fn prune_forbidden(
    clause: &ForbiddenClause,
    active: &HashSet<&str>,
    unconditional: &HashSet<&str>,
    distributions: &BTreeMap<String, Distribution>,
) -> Pruned {
    let bound = |name: &str| active_parent(name, active, distributions);
    match clause {
        ForbiddenClause::Equals(c) => match bound(&c.name) {
            None => Pruned::Vacuous,
            Some(Distribution::Constant(k)) => {
                constant_conjunct(&c.name, &k.value, k.value == c.value, unconditional)
            }
            Some(dist) if dist.in_support(&c.value) => Pruned::Keep(clause.clone()),
            Some(_) => Pruned::Vacuous,
        },
        ForbiddenClause::In(c) => match bound(&c.name) {
            None => Pruned::Vacuous,
            Some(Distribution::Constant(k)) => {
                constant_conjunct(&c.name, &k.value, c.values.contains(&k.value), unconditional)
            }
            Some(dist) => {
                let values: Vec<Value> = c.values.iter().filter(|v| dist.in_support(v)).cloned().collect();
                if values.is_empty() {
                    Pruned::Vacuous
                } else {
                    Pruned::Keep(ForbiddenClause::In(ForbiddenIn {
                        name: c.name.clone(),
                        values,
                    }))
                }
            }
        },
        ForbiddenClause::And(c) => {
            let mut kept = Vec::with_capacity(c.clauses().len());
            for conjunct in c.clauses() {
                match prune_forbidden(conjunct, active, unconditional, distributions) {
                    Pruned::Vacuous => return Pruned::Vacuous,
                    Pruned::AlwaysFires => {}
                    Pruned::Keep(k) => kept.push(k),
                }
            }
            match kept.len() {
                0 => Pruned::AlwaysFires,
                1 => kept.pop().map_or(Pruned::AlwaysFires, Pruned::Keep),
                _ => Pruned::Keep(ForbiddenClause::conjunction(kept)),
            }
        }
    }
}

/// A clause on a constant. It always holds when the constant appears in every
/// draw; a constant gated by a condition only matches while it is active, so
/// the clause is kept for the space to apply.
fn constant_conjunct(name: &str, value: &Value, matches: bool, unconditional: &HashSet<&str>) -> Pruned {
    if value.is_none() || !matches {
        Pruned::Vacuous
    } else if unconditional.contains(name) {
        Pruned::AlwaysFires
    } else {
        Pruned::Keep(ForbiddenClause::equals(name, value.clone()))
    }
}

fn lookup<'d>(distributions: &'d BTreeMap<String, Distribution>, name: &str) -> Result<&'d Distribution> {
    distributions.get(name).ok_or_else(|| Error::UnknownParameter {
        name: name.to_owned(),
    })
}

/// Rewrites a pruned condition into the encoded namespace. `In` becomes an
/// `Or` of `Equals`, since each literal may land in a different union slot.
fn encode_condition(condition: &Condition, distributions: &BTreeMap<String, Distribution>) -> Result<Condition> {
    let child = lookup(distributions, condition.child())?.child_encoded_name(condition.child());
    match condition {
        Condition::And(c) | Condition::Or(c) => {
            let kind = if matches!(condition, Condition::And(_)) {
                CompoundKind::And
            } else {
                CompoundKind::Or
            };
            let mut encoded = Vec::with_capacity(c.conditions().len());
            for inner in c.conditions() {
                match (kind, encode_condition(inner, distributions)?) {
                    (CompoundKind::Or, Condition::Or(nested)) => {
                        encoded.extend(nested.conditions().iter().cloned());
                    }
                    (_, other) => encoded.push(other),
                }
            }
            Ok(Condition::compound(kind, child, encoded))
        }
        Condition::In(c) => {
            let parent_dist = lookup(distributions, &c.parent)?;
            let mut branches = Vec::with_capacity(c.values.len());
            for value in &c.values {
                let (parent, value) = parent_dist.value_to_encoded(&c.parent, value)?;
                branches.push(Condition::equals(child.clone(), parent, value));
            }
            if branches.len() == 1 {
                return branches.pop().ok_or(Error::Internal("empty condition"));
            }
            Ok(Condition::compound(CompoundKind::Or, child, branches))
        }
        Condition::Equals(c)
        | Condition::NotEquals(c)
        | Condition::LessThan(c)
        | Condition::GreaterThan(c) => {
            let (parent, value) = lookup(distributions, &c.parent)?.value_to_encoded(&c.parent, &c.value)?;
            let encoded = ValueCondition { child, parent, value };
            Ok(match condition {
                Condition::NotEquals(_) => Condition::NotEquals(encoded),
                Condition::LessThan(_) => Condition::LessThan(encoded),
                Condition::GreaterThan(_) => Condition::GreaterThan(encoded),
                _ => Condition::Equals(encoded),
            })
        }
    }
}

/// Rewrites a pruned forbidden clause into the encoded namespace.
fn encode_forbidden(clause: &ForbiddenClause, distributions: &BTreeMap<String, Distribution>) -> Result<ForbiddenClause> {
    match clause {
        ForbiddenClause::Equals(c) => {
            let (name, value) = lookup(distributions, &c.name)?.value_to_encoded(&c.name, &c.value)?;
            Ok(ForbiddenClause::equals(name, value))
        }
        ForbiddenClause::In(c) => {
            let dist = lookup(distributions, &c.name)?;
            let mut encoded_name: Option<String> = None;
            let mut values = Vec::with_capacity(c.values.len());
            for value in &c.values {
                let (name, value) = dist.value_to_encoded(&c.name, value)?;
                match &encoded_name {
                    Some(first) if *first != name => {
                        return Err(Error::InconsistentForbiddenEncoding {
                            name: c.name.clone(),
                            first: first.clone(),
                            second: name,
                        });
                    }
                    Some(_) => {}
                    None => encoded_name = Some(name),
                }
                values.push(value);
            }
            let name = encoded_name.ok_or(Error::Internal("empty forbidden clause"))?;
            Ok(ForbiddenClause::In(ForbiddenIn { name, values }))
        }
        ForbiddenClause::And(c) => {
            let clauses = c
                .clauses()
                .iter()
                .map(|k| encode_forbidden(k, distributions))
                .collect::<Result<Vec<_>>>()?;
            Ok(ForbiddenClause::conjunction(clauses))
        }
    }
}
