//! Union distributions: one logical parameter, several runtime types.
//!
//! A union named `alpha` with an int member and a categorical member is
//! registered as
//!
//! - `alpha:control`, a categorical over `["alpha:int", "alpha:str"]`,
//! - `alpha:int` and `alpha:str`, each active only when the control selects it.
//!
//! After a draw the control and slot keys are folded back into a single
//! `alpha` entry.

use serde::{Deserialize, Serialize};

use super::Distribution;
use super::record::{self, Record};
use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::space::{ConfigSpace, Hyperparameter};
use crate::value::{Assignment, Value, ValueType};

const CONTROL_SUFFIX: &str = "control";
const MEMBERS_KEY: &str = "members";
const LEGACY_MEMBERS_KEY: &str = "dists";

/// A choice between member distributions of distinct runtime types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnionDistribution {
    /// Members, in order. At most one per runtime type.
    #[serde(alias = "dists")]
    pub members: Vec<Distribution>,
}

impl UnionDistribution {
    /// Creates a union over `members`.
    pub fn new(members: impl IntoIterator<Item = Distribution>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    /// Returns the selector name for a union bound to `name`.
    #[must_use]
    pub fn control_name(name: &str) -> String {
        format!("{name}:{CONTROL_SUFFIX}")
    }

    /// Returns the slot name for the member of type `value_type`.
    #[must_use]
    pub fn slot_name(name: &str, value_type: &ValueType) -> String {
        format!("{name}:{}", value_type.tag())
    }

    /// Returns the member that owns values of `value_type`.
    #[must_use]
    pub fn member_for(&self, value_type: &ValueType) -> Option<&Distribution> {
        self.members
            .iter()
            .find(|m| m.value_type().as_ref() == Some(value_type))
    }

    /// Members paired with their runtime type. Nested unions are skipped.
    fn typed_members(&self) -> impl Iterator<Item = (ValueType, &Distribution)> {
        self.members
            .iter()
            .filter_map(|m| m.value_type().map(|t| (t, m)))
    }

    pub(super) fn in_support(&self, value: &Value) -> bool {
        self.member_for(&value.value_type())
            .is_some_and(|m| m.in_support(value))
    }

    pub(super) fn register(&self, name: &str, space: &mut dyn ConfigSpace) -> Result<String> {
        let control = Self::control_name(name);
        let slots: Vec<(String, &Distribution)> = self
            .typed_members()
            .map(|(t, m)| (Self::slot_name(name, &t), m))
            .collect();
        let default = slots.first().map(|(s, _)| s.clone()).ok_or(Error::EmptyUnion)?;

        space.add_hyperparameter(Hyperparameter::Categorical {
            name: control.clone(),
            choices: slots.iter().map(|(s, _)| s.clone()).collect(),
            default,
        })?;
        for (slot, member) in slots {
            member.register(&slot, space)?;
            space.add_condition(Condition::equals(slot.as_str(), control.as_str(), slot.as_str()))?;
        }
        Ok(control)
    }

    pub(super) fn post_process(&self, name: &str, raw: &mut Assignment) -> Result<()> {
        let selected = raw.remove(&Self::control_name(name));
        let mut chosen = None;
        for (value_type, member) in self.typed_members() {
            let slot = Self::slot_name(name, &value_type);
            let slot_value = raw.remove(&slot);
            if selected.as_ref().and_then(Value::as_str) == Some(slot.as_str()) {
                chosen = Some((member, slot_value));
            }
        }

        let Some(selected) = selected else {
            return Ok(());
        };
        match chosen {
            Some((member, Some(slot_value))) => {
                let value = member.decode(name, &slot_value)?;
                raw.insert(name.to_owned(), value);
                Ok(())
            }
            Some((_, None)) => Err(Error::MissingSample {
                name: name.to_owned(),
            }),
            None => Err(Error::UnrecognizedType {
                name: name.to_owned(),
                value: selected.to_string(),
            }),
        }
    }

    pub(super) fn value_to_encoded(&self, name: &str, value: &Value) -> Result<(String, Value)> {
        let value_type = value.value_type();
        match self.member_for(&value_type) {
            Some(member) => member.value_to_encoded(&Self::slot_name(name, &value_type), value),
            None => Err(Error::UnrecognizedType {
                name: name.to_owned(),
                value: value.to_string(),
            }),
        }
    }
}

impl Record for UnionDistribution {
    const TAG: &'static str = "UnionDistribution";

    fn validate(&self) -> Result<()> {
        if self.members.is_empty() {
            return Err(Error::EmptyUnion);
        }
        let mut seen: Vec<ValueType> = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let Some(value_type) = member.value_type() else {
                return Err(Error::NestedUnion);
            };
            member.validate()?;
            if seen.contains(&value_type) {
                return Err(Error::DuplicateUnionMember {
                    type_tag: value_type.tag().to_owned(),
                });
            }
            seen.push(value_type);
        }
        Ok(())
    }

    /// Restores the union and each nested member through its own tagged
    /// record, so members are validated individually.
    fn from_record(record: &serde_json::Value) -> Result<Self> {
        record::expect_tag(record, Self::TAG)?;
        let members = record
            .get(MEMBERS_KEY)
            .or_else(|| record.get(LEGACY_MEMBERS_KEY))
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| Error::Serde(format!("{} record without `{MEMBERS_KEY}`", Self::TAG)))?;
        let union = Self {
            members: members
                .iter()
                .map(Distribution::from_record)
                .collect::<Result<_>>()?,
        };
        union.validate()?;
        Ok(union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::RandomSpace;

    fn alpha() -> Distribution {
        Distribution::union([
            Distribution::int(0, 10),
            Distribution::categorical(["a", "b"]),
        ])
    }

    #[test]
    fn registers_selector_and_slots() {
        let mut space = RandomSpace::with_seed(0);
        let handle = alpha().register("alpha", &mut space).unwrap();
        assert_eq!(handle, "alpha:control");

        let names: Vec<&str> = space.hyperparameters().into_iter().map(Hyperparameter::name).collect();
        assert_eq!(names, ["alpha:control", "alpha:int", "alpha:str"]);
        assert_eq!(space.conditions().len(), 2);
        assert_eq!(
            space.conditions()[0],
            Condition::equals("alpha:int", "alpha:control", "alpha:int")
        );
    }

    #[test]
    fn post_process_folds_slots() {
        let dist = alpha();
        let mut space = RandomSpace::with_seed(11);
        dist.register("alpha", &mut space).unwrap();

        let mut saw_int = false;
        let mut saw_str = false;
        for mut raw in space.sample(200).unwrap() {
            dist.post_process("alpha", &mut raw).unwrap();
            assert_eq!(raw.len(), 1);
            let value = &raw["alpha"];
            assert!(dist.in_support(value));
            saw_int |= matches!(value, Value::Int(_));
            saw_str |= matches!(value, Value::Str(_));
        }
        assert!(saw_int && saw_str);
    }

    #[test]
    fn inactive_union_leaves_no_keys() {
        let mut raw = Assignment::new();
        raw.insert("other".into(), Value::Int(1));
        alpha().post_process("alpha", &mut raw).unwrap();
        assert_eq!(raw.len(), 1);
        assert!(!raw.contains_key("alpha"));
    }

    #[test]
    fn bool_member_decodes_tokens() {
        let dist = Distribution::union([Distribution::boolean(), Distribution::constant(Value::None)]);
        let mut raw = Assignment::new();
        raw.insert("shrinking:control".into(), "shrinking:bool".into());
        raw.insert("shrinking:bool".into(), "F".into());
        dist.post_process("shrinking", &mut raw).unwrap();
        assert_eq!(raw["shrinking"], Value::Bool(false));

        let mut raw = Assignment::new();
        raw.insert("shrinking:control".into(), "shrinking:NoneType".into());
        raw.insert("shrinking:NoneType".into(), "None".into());
        dist.post_process("shrinking", &mut raw).unwrap();
        assert!(raw["shrinking"].is_none());
    }

    #[test]
    fn unknown_selection_is_an_error() {
        let mut raw = Assignment::new();
        raw.insert("alpha:control".into(), "alpha:float".into());
        assert!(matches!(
            alpha().post_process("alpha", &mut raw),
            Err(Error::UnrecognizedType { .. })
        ));

        let mut raw = Assignment::new();
        raw.insert("alpha:control".into(), "alpha:int".into());
        assert!(matches!(
            alpha().post_process("alpha", &mut raw),
            Err(Error::MissingSample { .. })
        ));
    }

    #[test]
    fn encoding_dispatches_on_runtime_type() {
        let dist = alpha();
        assert_eq!(dist.child_encoded_name("alpha"), "alpha:control");
        assert_eq!(
            dist.value_to_encoded("alpha", &Value::Int(3)).unwrap(),
            ("alpha:int".to_owned(), Value::Int(3))
        );
        assert_eq!(
            dist.value_to_encoded("alpha", &"a".into()).unwrap(),
            ("alpha:str".to_owned(), Value::from("a"))
        );
        assert!(matches!(
            dist.value_to_encoded("alpha", &Value::Bool(true)),
            Err(Error::UnrecognizedType { .. })
        ));
        // Strict dispatch: a bool never lands in the int slot
        assert!(!dist.in_support(&Value::Bool(true)));
    }

    #[test]
    fn validation() {
        assert!(matches!(
            Distribution::union(Vec::new()).validate(),
            Err(Error::EmptyUnion)
        ));
        assert!(matches!(
            Distribution::union([Distribution::int(0, 1), Distribution::int(5, 6)]).validate(),
            Err(Error::DuplicateUnionMember { type_tag }) if type_tag == "int"
        ));
        assert!(matches!(
            Distribution::union([alpha()]).validate(),
            Err(Error::NestedUnion)
        ));
        assert!(matches!(
            Distribution::union([Distribution::int(9, 1)]).validate(),
            Err(Error::InvalidBounds { .. })
        ));
        assert!(alpha().validate().is_ok());
    }

    #[test]
    fn record_nests_members() {
        let record = alpha().to_record().unwrap();
        assert_eq!(record["type"], "UnionDistribution");
        assert_eq!(record["members"][0]["type"], "UniformIntDistribution");
        assert_eq!(record["members"][1]["type"], "CategoricalDistribution");
        assert_eq!(Distribution::from_record(&record).unwrap(), alpha());
    }

    #[test]
    fn legacy_members_key() {
        let record = serde_json::json!({
            "type": "UnionDistribution",
            "dists": [
                {"type": "UniformFloatDistribution", "lower": 0.0, "upper": 1.0},
                {"type": "ConstantDistribution", "value": null},
            ],
        });
        let restored = Distribution::from_record(&record).unwrap();
        assert_eq!(
            restored,
            Distribution::union([Distribution::float(0.0, 1.0), Distribution::constant(Value::None)])
        );
    }
}
