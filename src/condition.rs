//! Conditions that make a child parameter meaningful only when its parent
//! satisfies a predicate.
//!
//! Conditions are plain immutable data. A [`Model`](crate::model::Model)
//! owns the full set; the reducer derives pruned, renamed copies of them for
//! each [`Sampler`](crate::Sampler).
//!
//! Two evaluators are provided:
//!
//! - [`Condition::is_active`] is the static check used by validation. An
//!   absent parent makes `Equals`/`NotEquals` inactive, but leaves
//!   `LessThan`/`GreaterThan`/`In` active.
//! - [`Condition::is_satisfied`] is the draw-time check used by a
//!   [`ConfigSpace`](crate::space::ConfigSpace): an absent parent always
//!   deactivates the child.

use core::fmt;
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::value::{Assignment, Value};

/// A comparison between a parent's value and a fixed value.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueCondition {
    /// The conditioned parameter.
    pub child: String,
    /// The parameter whose value is tested.
    pub parent: String,
    /// The value the parent is compared against.
    pub value: Value,
}

/// A membership test of a parent's value against a set of values.
#[derive(Clone, Debug, PartialEq)]
pub struct InCondition {
    /// The conditioned parameter.
    pub child: String,
    /// The parameter whose value is tested.
    pub parent: String,
    /// The accepted values.
    pub values: Vec<Value>,
}

/// A conjunction or disjunction of conditions sharing one child.
#[derive(Clone, Debug, PartialEq)]
pub struct CompoundCondition {
    child: String,
    conditions: Vec<Condition>,
}

impl CompoundCondition {
    fn new(conditions: Vec<Condition>) -> Result<Self> {
        let names: BTreeSet<&str> = conditions.iter().map(Condition::child).collect();
        if names.len() != 1 {
            return Err(Error::InvalidCombinator {
                names: names.into_iter().map(str::to_owned).collect(),
            });
        }
        let child = conditions[0].child().to_owned();
        Ok(Self { child, conditions })
    }

    /// Returns the shared child name.
    #[must_use]
    pub fn child(&self) -> &str {
        &self.child
    }

    /// Returns the combined conditions in declaration order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// A dependency of one parameter on another.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Child is active when the parent equals the value.
    Equals(ValueCondition),
    /// Child is active when the parent differs from the value.
    NotEquals(ValueCondition),
    /// Child is active when the parent is less than the value.
    LessThan(ValueCondition),
    /// Child is active when the parent is greater than the value.
    GreaterThan(ValueCondition),
    /// Child is active when the parent is one of the values.
    In(InCondition),
    /// Child is active when every condition is.
    And(CompoundCondition),
    /// Child is active when any condition is.
    Or(CompoundCondition),
}

fn value_condition(
    child: impl Into<String>,
    parent: impl Into<String>,
    value: impl Into<Value>,
) -> ValueCondition {
    ValueCondition {
        child: child.into(),
        parent: parent.into(),
        value: value.into(),
    }
}

impl Condition {
    /// `child` is active when `parent == value`.
    pub fn equals(
        child: impl Into<String>,
        parent: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Condition::Equals(value_condition(child, parent, value))
    }

    /// `child` is active when `parent != value`.
    pub fn not_equals(
        child: impl Into<String>,
        parent: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Condition::NotEquals(value_condition(child, parent, value))
    }

    /// `child` is active when `parent < value`.
    pub fn less_than(
        child: impl Into<String>,
        parent: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Condition::LessThan(value_condition(child, parent, value))
    }

    /// `child` is active when `parent > value`.
    pub fn greater_than(
        child: impl Into<String>,
        parent: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Condition::GreaterThan(value_condition(child, parent, value))
    }

    /// `child` is active when `parent` is one of `values`.
    pub fn is_in<V: Into<Value>>(
        child: impl Into<String>,
        parent: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Condition::In(InCondition {
            child: child.into(),
            parent: parent.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Combines conditions on the same child with logical AND.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCombinator`] if `conditions` is empty or the
    /// conditions do not all share one child.
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Result<Self> {
        CompoundCondition::new(conditions.into_iter().collect()).map(Condition::And)
    }

    /// Combines conditions on the same child with logical OR.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCombinator`] if `conditions` is empty or the
    /// conditions do not all share one child.
    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Result<Self> {
        CompoundCondition::new(conditions.into_iter().collect()).map(Condition::Or)
    }

    /// Returns the conditioned parameter's name.
    #[must_use]
    pub fn child(&self) -> &str {
        match self {
            Condition::Equals(c)
            | Condition::NotEquals(c)
            | Condition::LessThan(c)
            | Condition::GreaterThan(c) => &c.child,
            Condition::In(c) => &c.child,
            Condition::And(c) | Condition::Or(c) => &c.child,
        }
    }

    /// Returns every parent referenced by this condition, in order, without duplicates.
    #[must_use]
    pub fn parents(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_parents(&mut out);
        out
    }

    fn collect_parents<'a>(&'a self, out: &mut Vec<&'a str>) {
        let parent = match self {
            Condition::Equals(c)
            | Condition::NotEquals(c)
            | Condition::LessThan(c)
            | Condition::GreaterThan(c) => c.parent.as_str(),
            Condition::In(c) => c.parent.as_str(),
            Condition::And(c) | Condition::Or(c) => {
                for inner in &c.conditions {
                    inner.collect_parents(out);
                }
                return;
            }
        };
        if !out.contains(&parent) {
            out.push(parent);
        }
    }

    /// Static activity check against a (possibly partial) assignment.
    ///
    /// A parent that is missing or `None` counts as absent: `Equals` and
    /// `NotEquals` are then inactive, while `LessThan`, `GreaterThan` and `In`
    /// stay active.
    #[must_use]
    pub fn is_active(&self, assignment: &Assignment) -> bool {
        match self {
            Condition::And(c) => c.conditions.iter().all(|inner| inner.is_active(assignment)),
            Condition::Or(c) => c.conditions.iter().any(|inner| inner.is_active(assignment)),
            leaf => match parent_value(leaf, assignment) {
                Some(value) => leaf.holds(value),
                None => matches!(
                    leaf,
                    Condition::LessThan(_) | Condition::GreaterThan(_) | Condition::In(_)
                ),
            },
        }
    }

    /// Draw-time activity check: a leaf holds only when its parent is present.
    #[must_use]
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        match self {
            Condition::And(c) => c.conditions.iter().all(|inner| inner.is_satisfied(assignment)),
            Condition::Or(c) => c.conditions.iter().any(|inner| inner.is_satisfied(assignment)),
            leaf => parent_value(leaf, assignment).is_some_and(|value| leaf.holds(value)),
        }
    }

    fn holds(&self, value: &Value) -> bool {
        match self {
            Condition::Equals(c) => *value == c.value,
            Condition::NotEquals(c) => *value != c.value,
            Condition::LessThan(c) => value < &c.value,
            Condition::GreaterThan(c) => value > &c.value,
            Condition::In(c) => c.values.contains(value),
            Condition::And(_) | Condition::Or(_) => false,
        }
    }

    pub(crate) fn compound(kind: CompoundKind, child: String, conditions: Vec<Condition>) -> Self {
        let compound = CompoundCondition { child, conditions };
        match kind {
            CompoundKind::And => Condition::And(compound),
            CompoundKind::Or => Condition::Or(compound),
        }
    }
}

/// Which combinator a rebuilt compound condition should use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CompoundKind {
    And,
    Or,
}

fn parent_value<'a>(leaf: &Condition, assignment: &'a Assignment) -> Option<&'a Value> {
    let parent = match leaf {
        Condition::Equals(c)
        | Condition::NotEquals(c)
        | Condition::LessThan(c)
        | Condition::GreaterThan(c) => &c.parent,
        Condition::In(c) => &c.parent,
        Condition::And(_) | Condition::Or(_) => return None,
    };
    assignment.get(parent).filter(|v| !v.is_none())
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (c, op) = match self {
            Condition::Equals(c) => (c, "=="),
            Condition::NotEquals(c) => (c, "!="),
            Condition::LessThan(c) => (c, "<"),
            Condition::GreaterThan(c) => (c, ">"),
            Condition::In(c) => {
                let values: Vec<String> = c.values.iter().map(ToString::to_string).collect();
                return write!(
                    f,
                    "Child: {} Condition: {} in [{}]",
                    c.child,
                    c.parent,
                    values.join(", ")
                );
            }
            Condition::And(c) | Condition::Or(c) => {
                let sep = if matches!(self, Condition::And(_)) {
                    " & "
                } else {
                    " | "
                };
                let parts: Vec<String> = c
                    .conditions
                    .iter()
                    .map(|inner| format!("({inner})"))
                    .collect();
                return f.write_str(&parts.join(sep));
            }
        };
        write!(f, "Child: {} Condition: {} {op} {}", c.child, c.parent, c.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(pairs: &[(&str, Value)]) -> Assignment {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
    }

    #[test]
    fn equals_is_inactive_without_parent() {
        let cond = Condition::equals("gamma", "kernel", "rbf");
        assert!(!cond.is_active(&Assignment::new()));
        assert!(cond.is_active(&assignment(&[("kernel", "rbf".into())])));
        assert!(!cond.is_active(&assignment(&[("kernel", "linear".into())])));
    }

    #[test]
    fn not_equals_is_inactive_without_parent() {
        let cond = Condition::not_equals("gamma", "kernel", "linear");
        assert!(!cond.is_active(&Assignment::new()));
        assert!(cond.is_active(&assignment(&[("kernel", "rbf".into())])));
    }

    // Ordering and membership predicates stay active while the parent is unknown,
    // unlike Equals/NotEquals above.
    #[test]
    fn ordering_predicates_are_active_without_parent() {
        let empty = Assignment::new();
        assert!(Condition::less_than("tol", "max_iter", 100).is_active(&empty));
        assert!(Condition::greater_than("tol", "max_iter", 100).is_active(&empty));
        assert!(Condition::is_in("gamma", "kernel", ["rbf", "poly"]).is_active(&empty));

        let none = assignment(&[("max_iter", Value::None)]);
        assert!(Condition::less_than("tol", "max_iter", 100).is_active(&none));
        assert!(!Condition::equals("tol", "max_iter", 100).is_active(&none));
    }

    #[test]
    fn draw_time_check_requires_parent() {
        let empty = Assignment::new();
        assert!(!Condition::less_than("tol", "max_iter", 100).is_satisfied(&empty));
        assert!(!Condition::is_in("gamma", "kernel", ["rbf"]).is_satisfied(&empty));

        let present = assignment(&[("max_iter", Value::Int(50))]);
        assert!(Condition::less_than("tol", "max_iter", 100).is_satisfied(&present));
        assert!(!Condition::greater_than("tol", "max_iter", 100).is_satisfied(&present));
    }

    #[test]
    fn ordering_compares_numbers_across_kinds() {
        let cond = Condition::greater_than("tol", "alpha", 0.5);
        assert!(cond.is_active(&assignment(&[("alpha", Value::Int(1))])));
        assert!(!cond.is_active(&assignment(&[("alpha", Value::Float(0.25))])));
    }

    #[test]
    fn and_or_combinators() {
        let and = Condition::and([
            Condition::equals("gamma", "kernel", "rbf"),
            Condition::greater_than("gamma", "degree", 1),
        ])
        .unwrap();
        let or = Condition::or([
            Condition::equals("gamma", "kernel", "rbf"),
            Condition::equals("gamma", "kernel", "poly"),
        ])
        .unwrap();

        let rbf = assignment(&[("kernel", "rbf".into()), ("degree", Value::Int(3))]);
        let poly = assignment(&[("kernel", "poly".into()), ("degree", Value::Int(1))]);
        assert!(and.is_active(&rbf));
        assert!(!and.is_active(&poly));
        assert!(or.is_active(&rbf));
        assert!(or.is_active(&poly));
        assert_eq!(and.child(), "gamma");
        assert_eq!(and.parents(), vec!["kernel", "degree"]);
    }

    #[test]
    fn combinator_rejects_mixed_children() {
        let err = Condition::and([
            Condition::equals("gamma", "kernel", "rbf"),
            Condition::equals("degree", "kernel", "poly"),
        ])
        .unwrap_err();
        match err {
            Error::InvalidCombinator { names } => assert_eq!(names, vec!["degree", "gamma"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            Condition::or(Vec::new()),
            Err(Error::InvalidCombinator { .. })
        ));
    }

    #[test]
    fn display() {
        assert_eq!(
            Condition::equals("gamma", "kernel", "rbf").to_string(),
            "Child: gamma Condition: kernel == rbf"
        );
        let or = Condition::or([
            Condition::less_than("tol", "max_iter", 10),
            Condition::is_in("tol", "solver", ["sag", "saga"]),
        ])
        .unwrap();
        assert_eq!(
            or.to_string(),
            "(Child: tol Condition: max_iter < 10) | (Child: tol Condition: solver in [sag, saga])"
        );
    }
}
