//! The declarative model of a configurable component.
//!
//! A [`Model`] declares every parameter the component accepts (with its
//! static [`Param`] type), the conditions between them, the forbidden
//! combinations, and the component's own default values. Models are built
//! once and shared; samplers and validators only read them.
//!
//! # Example
//!
//! ```
//! use paramspace::condition::Condition;
//! use paramspace::forbidden::ForbiddenClause;
//! use paramspace::model::Model;
//! use paramspace::parameter::{Interval, Param};
//! use paramspace::value::Assignment;
//!
//! let model = Model::builder()
//!     .param("kernel", Param::string(["linear", "rbf"]))
//!     .param("gamma", Param::FloatInterval(Interval::new().lower(0.0)))
//!     .condition(Condition::equals("gamma", "kernel", "rbf"))
//!     .default_value("kernel", "rbf")
//!     .default_value("gamma", 0.1)
//!     .build()
//!     .unwrap();
//!
//! let mut params = Assignment::new();
//! params.insert("gamma".into(), 2.0.into());
//! assert!(model.validate_params(&params).is_ok());
//!
//! params.insert("kernel".into(), "linear".into());
//! assert!(model.validate_params(&params).is_err());
//! ```

use std::collections::HashSet;

use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::forbidden::ForbiddenClause;
use crate::parameter::Param;
use crate::value::{Assignment, Value};

/// Declared parameters, conditions, forbidden clauses, and defaults.
#[derive(Clone, Debug, Default)]
pub struct Model {
    params: Vec<(String, Param)>,
    conditions: Vec<Condition>,
    forbiddens: Vec<ForbiddenClause>,
    defaults: Assignment,
}

impl Model {
    /// Starts building a model.
    #[must_use]
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// Returns `true` if `name` is a declared parameter.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|(n, _)| n == name)
    }

    /// Looks up the declaration of `name`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Declared parameter names, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(n, _)| n.as_str())
    }

    /// Declared conditions, in declaration order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Declared forbidden clauses, in declaration order.
    #[must_use]
    pub fn forbiddens(&self) -> &[ForbiddenClause] {
        &self.forbiddens
    }

    /// The component's own default values.
    #[must_use]
    pub fn defaults(&self) -> &Assignment {
        &self.defaults
    }

    /// Checks one value against the declaration of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParamName`] for an undeclared name, or the
    /// declaration's validation error.
    pub fn validate(&self, name: &str, value: &Value) -> Result<()> {
        self.param(name)
            .ok_or_else(|| Error::InvalidParamName {
                name: name.to_owned(),
            })?
            .validate(name, value)
    }

    /// Validates a full configuration: `params` layered over the declared
    /// defaults.
    ///
    /// Forbidden clauses are checked first. Unconditioned parameters are then
    /// validated directly. A conditioned parameter is validated only while its
    /// condition is active; setting it while the condition is inactive is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParamName`], [`Error::ForbiddenValue`],
    /// [`Error::InactiveConditionedValue`], or a per-parameter validation
    /// error, whichever is found first.
    pub fn validate_params(&self, params: &Assignment) -> Result<()> {
        if let Some(name) = params.keys().find(|name| !self.contains(name)) {
            return Err(Error::InvalidParamName { name: name.clone() });
        }

        let mut merged = self.defaults.clone();
        merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

        for forbidden in &self.forbiddens {
            forbidden.check(&merged)?;
        }

        let conditioned: HashSet<&str> = self.conditions.iter().map(Condition::child).collect();
        for (name, param) in &self.params {
            if conditioned.contains(name.as_str()) {
                continue;
            }
            if let Some(value) = merged.get(name) {
                param.validate(name, value)?;
            }
        }

        for condition in &self.conditions {
            let name = condition.child();
            let value = merged.get(name).unwrap_or(&Value::None);
            if condition.is_active(&merged) {
                self.validate(name, value)?;
            } else if !value.is_none() {
                return Err(Error::InactiveConditionedValue {
                    name: name.to_owned(),
                    condition: condition.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`Model`].
///
/// Name checks are deferred to [`build`](Self::build).
#[derive(Clone, Debug, Default)]
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    /// Declares a parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, param: Param) -> Self {
        self.model.params.push((name.into(), param));
        self
    }

    /// Adds a condition.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.model.conditions.push(condition);
        self
    }

    /// Adds a forbidden clause.
    #[must_use]
    pub fn forbidden(mut self, clause: ForbiddenClause) -> Self {
        self.model.forbiddens.push(clause);
        self
    }

    /// Records the component's default for `name`.
    #[must_use]
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.model.defaults.insert(name.into(), value.into());
        self
    }

    /// Finishes the model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateParameter`] if a name is declared twice, or
    /// [`Error::UnknownParameter`] if a condition, forbidden clause, or
    /// default refers to an undeclared name.
    pub fn build(self) -> Result<Model> {
        let model = self.model;
        let mut declared = HashSet::with_capacity(model.params.len());
        for (name, _) in &model.params {
            if !declared.insert(name.as_str()) {
                return Err(Error::DuplicateParameter { name: name.clone() });
            }
        }

        let referenced = model
            .conditions
            .iter()
            .flat_map(|c| core::iter::once(c.child()).chain(c.parents()))
            .chain(model.forbiddens.iter().flat_map(ForbiddenClause::names))
            .chain(model.defaults.keys().map(String::as_str));
        for name in referenced {
            if !declared.contains(name) {
                return Err(Error::UnknownParameter {
                    name: name.to_owned(),
                });
            }
        }
        Ok(model)
    }
}
