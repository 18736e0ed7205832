use std::collections::BTreeMap;
use std::sync::Arc;

use paramspace::distribution::Record;
use paramspace::prelude::*;
use serde_json::json;

fn sgd() -> Arc<Model> {
    Arc::new(
        Model::builder()
            .param("loss", Param::string(["hinge", "log_loss", "modified_huber"]))
            .param("penalty", Param::union([Param::None, Param::string(["l1", "l2"])]))
            .param("alpha", Param::FloatInterval(Interval::new().lower(0.0)))
            .param("fit_intercept", Param::Bool)
            .param("max_iter", Param::Int)
            .param("random_state", Param::random_state())
            .param("power_t", Param::Float)
            .condition(Condition::equals("power_t", "loss", "log_loss"))
            .forbidden(ForbiddenClause::equals("loss", "hinge") & ForbiddenClause::equals("penalty", "l1"))
            .build()
            .unwrap(),
    )
}

fn sgd_distributions() -> Vec<(&'static str, Distribution)> {
    vec![
        (
            "loss",
            CategoricalDistribution::new(["hinge", "log_loss", "modified_huber"])
                .with_default("log_loss")
                .into(),
        ),
        (
            "penalty",
            Distribution::union([Distribution::constant(Value::None), Distribution::categorical(["l1", "l2"])]),
        ),
        ("alpha", UniformFloatDistribution::new(1e-6, 1e-1).log().with_default(1e-4).into()),
        ("fit_intercept", UniformBoolDistribution::new().with_default(false).into()),
        ("max_iter", UniformIntDistribution::new(100, 10_000).log().into()),
        ("random_state", Distribution::constant(0)),
        ("power_t", Distribution::float(0.1, 0.9)),
    ]
}

#[test]
fn round_trip_rebuilds_identical_space() {
    let original = Sampler::with_seed(sgd(), sgd_distributions(), 5).unwrap();
    let records = original.to_records().unwrap();
    let restored = Sampler::from_records(sgd(), &records).unwrap();

    assert_eq!(restored.distributions(), original.distributions());
    assert_eq!(restored.active_space(), original.active_space());
    assert_eq!(restored.space().hyperparameters(), original.space().hyperparameters());
    assert_eq!(restored.to_records().unwrap(), records);
}

#[test]
fn json_round_trip() {
    let original = Sampler::with_seed(sgd(), sgd_distributions(), 5).unwrap();
    let json = original.to_json().unwrap();
    let restored = Sampler::from_json(sgd(), &json).unwrap();
    assert_eq!(restored.distributions(), original.distributions());
    assert_eq!(restored.to_string(), original.to_string());
}

#[test]
fn record_shapes() {
    let sampler = Sampler::with_seed(sgd(), sgd_distributions(), 5).unwrap();
    let records = sampler.to_records().unwrap();

    assert_eq!(
        records["max_iter"],
        json!({"type": "UniformIntDistribution", "lower": 100, "upper": 10000, "default": null, "log": true})
    );
    assert_eq!(
        records["fit_intercept"],
        json!({"type": "UniformBoolDistribution", "default": false})
    );
    assert_eq!(
        records["penalty"],
        json!({
            "type": "UnionDistribution",
            "members": [
                {"type": "ConstantDistribution", "value": null},
                {"type": "CategoricalDistribution", "choices": ["l1", "l2"], "default": null},
            ],
        })
    );
}

#[test]
fn restore_replaces_the_assignment() {
    let mut sampler = Sampler::with_seed(sgd(), sgd_distributions(), 5).unwrap();
    let records = BTreeMap::from([
        ("loss".to_owned(), json!({"type": "CategoricalDistribution", "choices": ["hinge"]})),
        ("alpha".to_owned(), json!({"type": "UniformFloatDistribution", "lower": 0.001, "upper": 0.1})),
    ]);
    sampler.restore(&records).unwrap();

    assert_eq!(sampler.distributions().len(), 2);
    assert_eq!(sampler.active_space().names(), ["loss", "alpha"]);
    for draw in sampler.sample(10).unwrap() {
        assert_eq!(draw.len(), 2);
        assert_eq!(draw["loss"], Value::from("hinge"));
    }
}

#[test]
fn mismatched_tag_is_rejected() {
    let record = json!({"type": "UniformFloatDistribution", "lower": 0.0, "upper": 1.0});
    match UniformIntDistribution::from_record(&record) {
        Err(Error::SchemaMismatch { expected, found }) => {
            assert_eq!(expected, "UniformIntDistribution");
            assert_eq!(found, "UniformFloatDistribution");
        }
        other => panic!("expected a schema mismatch, got {other:?}"),
    }
    assert!(matches!(
        CategoricalDistribution::from_record(&json!({"choices": ["a"]})),
        Err(Error::SchemaMismatch { found, .. }) if found == "<missing>"
    ));
}

#[test]
fn restore_rejects_unknown_tags_and_leaves_sampler_intact() {
    let mut sampler = Sampler::with_seed(sgd(), sgd_distributions(), 5).unwrap();
    let before = sampler.to_records().unwrap();
    let records = BTreeMap::from([(
        "alpha".to_owned(),
        json!({"type": "NormalDistribution", "mu": 0.0, "sigma": 1.0}),
    )]);
    assert!(matches!(
        sampler.restore(&records),
        Err(Error::SchemaMismatch { .. })
    ));
    assert_eq!(sampler.to_records().unwrap(), before);
}

#[test]
fn malformed_fields_are_serde_errors() {
    let records = BTreeMap::from([(
        "max_iter".to_owned(),
        json!({"type": "UniformIntDistribution", "lower": "one", "upper": 10}),
    )]);
    assert!(matches!(
        Sampler::from_records(sgd(), &records),
        Err(Error::Serde(_))
    ));
    assert!(matches!(Sampler::from_json(sgd(), "{not json"), Err(Error::Serde(_))));
}

#[test]
fn legacy_union_key_is_accepted() {
    let records = BTreeMap::from([(
        "penalty".to_owned(),
        json!({
            "type": "UnionDistribution",
            "dists": [
                {"type": "ConstantDistribution", "value": null},
                {"type": "CategoricalDistribution", "choices": ["l1", "l2"]},
            ],
        }),
    )]);
    let sampler = Sampler::from_records(sgd(), &records).unwrap();
    assert_eq!(
        sampler.to_records().unwrap()["penalty"]["members"][1]["choices"],
        json!(["l1", "l2"])
    );
}

#[test]
fn restored_union_members_are_validated() {
    let record = json!({
        "type": "UnionDistribution",
        "members": [
            {"type": "UniformIntDistribution", "lower": 0, "upper": 5},
            {"type": "UniformIntDistribution", "lower": 10, "upper": 20},
        ],
    });
    assert!(matches!(
        Distribution::from_record(&record),
        Err(Error::DuplicateUnionMember { .. })
    ));
}
