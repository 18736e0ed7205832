//! Forbidden clauses: values, or conjunctions of values, that may never co-occur.

use core::fmt;
use core::ops::BitAnd;

use crate::error::{Error, Result};
use crate::value::{Assignment, Value};

/// Forbids a single value of one parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ForbiddenEquals {
    /// The constrained parameter.
    pub name: String,
    /// The forbidden value.
    pub value: Value,
}

/// Forbids any of several values of one parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ForbiddenIn {
    /// The constrained parameter.
    pub name: String,
    /// The forbidden values.
    pub values: Vec<Value>,
}

/// A conjunction of single-parameter clauses, possibly over different names.
///
/// Always flat: it never contains another conjunction.
#[derive(Clone, Debug, PartialEq)]
pub struct ForbiddenAnd {
    clauses: Vec<ForbiddenClause>,
}

impl ForbiddenAnd {
    /// Returns the conjuncts in declaration order.
    #[must_use]
    pub fn clauses(&self) -> &[ForbiddenClause] {
        &self.clauses
    }
}

/// A combination of values that a configuration must not contain.
#[derive(Clone, Debug, PartialEq)]
pub enum ForbiddenClause {
    /// `name == value` is forbidden.
    Equals(ForbiddenEquals),
    /// `name in values` is forbidden.
    In(ForbiddenIn),
    /// Every conjunct holding at once is forbidden.
    And(ForbiddenAnd),
}

impl ForbiddenClause {
    /// Forbids `name == value`.
    pub fn equals(name: impl Into<String>, value: impl Into<Value>) -> Self {
        ForbiddenClause::Equals(ForbiddenEquals {
            name: name.into(),
            value: value.into(),
        })
    }

    /// Forbids `name` taking any of `values`.
    pub fn is_in<V: Into<Value>>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        ForbiddenClause::In(ForbiddenIn {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Forbids every clause holding at once. Nested conjunctions are flattened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCombinator`] if `clauses` is empty.
    pub fn and(clauses: impl IntoIterator<Item = ForbiddenClause>) -> Result<Self> {
        let clauses = flatten(clauses);
        if clauses.is_empty() {
            return Err(Error::InvalidCombinator { names: Vec::new() });
        }
        Ok(ForbiddenClause::And(ForbiddenAnd { clauses }))
    }

    pub(crate) fn conjunction(clauses: Vec<ForbiddenClause>) -> Self {
        ForbiddenClause::And(ForbiddenAnd {
            clauses: flatten(clauses),
        })
    }

    /// Returns the constrained names in order, without duplicates.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        match self {
            ForbiddenClause::Equals(c) => vec![c.name.as_str()],
            ForbiddenClause::In(c) => vec![c.name.as_str()],
            ForbiddenClause::And(c) => {
                let mut out: Vec<&str> = Vec::new();
                for clause in &c.clauses {
                    for name in clause.names() {
                        if !out.contains(&name) {
                            out.push(name);
                        }
                    }
                }
                out
            }
        }
    }

    /// Returns `true` if the assignment matches this clause.
    ///
    /// A name that is missing or `None` never matches, so a conjunction only
    /// fires when every conjunct's name is present.
    #[must_use]
    pub fn is_forbidden(&self, assignment: &Assignment) -> bool {
        let lookup = |name: &str| assignment.get(name).filter(|v| !v.is_none());
        match self {
            ForbiddenClause::Equals(c) => lookup(&c.name).is_some_and(|v| *v == c.value),
            ForbiddenClause::In(c) => lookup(&c.name).is_some_and(|v| c.values.contains(v)),
            ForbiddenClause::And(c) => c.clauses.iter().all(|clause| clause.is_forbidden(assignment)),
        }
    }

    /// Like [`is_forbidden`](Self::is_forbidden), but reports the match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForbiddenValue`] naming the matching parameter(s) and value(s).
    pub fn check(&self, assignment: &Assignment) -> Result<()> {
        if !self.is_forbidden(assignment) {
            return Ok(());
        }
        let (name, value) = match self {
            ForbiddenClause::And(c) => {
                let names: Vec<&str> = c.clauses.iter().flat_map(ForbiddenClause::names).collect();
                let values: Vec<String> = c
                    .clauses
                    .iter()
                    .map(|clause| clause.matched_value(assignment))
                    .collect();
                (names.join(" and "), values.join(" and "))
            }
            leaf => (leaf.names().join(""), leaf.matched_value(assignment)),
        };
        Err(Error::ForbiddenValue { name, value })
    }

    fn matched_value(&self, assignment: &Assignment) -> String {
        match self {
            ForbiddenClause::Equals(c) => c.value.to_string(),
            ForbiddenClause::In(c) => assignment
                .get(&c.name)
                .map_or_else(String::new, ToString::to_string),
            ForbiddenClause::And(_) => String::new(),
        }
    }
}

fn flatten(clauses: impl IntoIterator<Item = ForbiddenClause>) -> Vec<ForbiddenClause> {
    let mut out = Vec::new();
    for clause in clauses {
        match clause {
            ForbiddenClause::And(inner) => out.extend(inner.clauses),
            leaf => out.push(leaf),
        }
    }
    out
}

impl BitAnd for ForbiddenClause {
    type Output = ForbiddenClause;

    fn bitand(self, rhs: Self) -> Self::Output {
        ForbiddenClause::conjunction(vec![self, rhs])
    }
}

impl fmt::Display for ForbiddenClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForbiddenClause::Equals(c) => write!(f, "ForbiddenEquals: {}, {}", c.name, c.value),
            ForbiddenClause::In(c) => {
                let values: Vec<String> = c.values.iter().map(ToString::to_string).collect();
                write!(f, "ForbiddenIn: {}, [{}]", c.name, values.join(", "))
            }
            ForbiddenClause::And(c) => {
                let parts: Vec<String> = c.clauses.iter().map(ToString::to_string).collect();
                write!(f, "ForbiddenAnd: ({})", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(pairs: &[(&str, Value)]) -> Assignment {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
    }

    #[test]
    fn equals_and_in() {
        let eq = ForbiddenClause::equals("penalty", "l1");
        let within = ForbiddenClause::is_in("solver", ["newton-cg", "sag"]);

        assert!(eq.is_forbidden(&assignment(&[("penalty", "l1".into())])));
        assert!(!eq.is_forbidden(&assignment(&[("penalty", "l2".into())])));
        assert!(!eq.is_forbidden(&Assignment::new()));
        assert!(within.is_forbidden(&assignment(&[("solver", "sag".into())])));
        assert!(!within.is_forbidden(&assignment(&[("solver", Value::None)])));
    }

    #[test]
    fn partial_conjunction_never_forbids() {
        let clause = ForbiddenClause::equals("penalty", "l1") & ForbiddenClause::equals("solver", "sag");
        assert!(!clause.is_forbidden(&assignment(&[("penalty", "l1".into())])));
        assert!(clause.is_forbidden(&assignment(&[
            ("penalty", "l1".into()),
            ("solver", "sag".into())
        ])));
    }

    #[test]
    fn bitand_flattens() {
        let clause = ForbiddenClause::equals("a", 1)
            & ForbiddenClause::equals("b", 2)
            & ForbiddenClause::is_in("c", [3, 4]);
        let ForbiddenClause::And(inner) = &clause else {
            panic!("expected a conjunction");
        };
        assert_eq!(inner.clauses().len(), 3);
        assert_eq!(clause.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_conjunction_is_rejected() {
        assert!(matches!(
            ForbiddenClause::and(Vec::new()),
            Err(Error::InvalidCombinator { .. })
        ));
    }

    #[test]
    fn check_reports_names_and_values() {
        let clause = ForbiddenClause::equals("penalty", "l1") & ForbiddenClause::is_in("solver", ["sag", "saga"]);
        let values = assignment(&[("penalty", "l1".into()), ("solver", "saga".into())]);
        let err = clause.check(&values).unwrap_err();
        assert_eq!(
            err.to_string(),
            "penalty and solver with value l1 and saga is forbidden"
        );
        assert!(clause.check(&assignment(&[("penalty", "l2".into())])).is_ok());
    }

    #[test]
    fn display() {
        let clause = ForbiddenClause::equals("penalty", "l1") & ForbiddenClause::equals("dual", true);
        assert_eq!(
            clause.to_string(),
            "ForbiddenAnd: (ForbiddenEquals: penalty, l1, ForbiddenEquals: dual, true)"
        );
    }
}
