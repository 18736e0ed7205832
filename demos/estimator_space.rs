//! Describe a logistic-regression style estimator, bind distributions to a
//! few of its parameters, and draw valid configurations.
//!
//! The declared model has more parameters and constraints than the ones we
//! bind; the sampler drops everything that would point at an unbound
//! parameter before drawing.
//!
//! Run with: `cargo run --example estimator_space`

use std::sync::Arc;

use paramspace::prelude::*;

fn main() -> paramspace::Result<()> {
    let model = Arc::new(
        Model::builder()
            .param("solver", Param::string(["lbfgs", "liblinear", "saga"]))
            .param("penalty", Param::union([Param::None, Param::string(["l1", "l2", "elasticnet"])]))
            .param("C", Param::FloatInterval(Interval::new().lower(0.0).exclusive_lower()))
            .param("l1_ratio", Param::FloatInterval(Interval::new().lower(0.0).upper(1.0)))
            .param("dual", Param::Bool)
            .param("fit_intercept", Param::Bool)
            .param("intercept_scaling", Param::Float)
            .param("random_state", Param::random_state())
            .condition(Condition::equals("l1_ratio", "penalty", "elasticnet"))
            .condition(Condition::and([
                Condition::equals("intercept_scaling", "solver", "liblinear"),
                Condition::equals("intercept_scaling", "fit_intercept", true),
            ])?)
            .forbidden(ForbiddenClause::equals("solver", "lbfgs") & ForbiddenClause::is_in("penalty", ["l1", "elasticnet"]))
            .forbidden(ForbiddenClause::equals("solver", "liblinear") & ForbiddenClause::equals("penalty", "elasticnet"))
            .default_value("solver", "lbfgs")
            .default_value("penalty", "l2")
            .default_value("C", 1.0)
            .build()?,
    );

    let sampler = Sampler::with_seed(
        Arc::clone(&model),
        [
            ("solver", Distribution::categorical(["lbfgs", "liblinear", "saga"])),
            (
                "penalty",
                Distribution::union([
                    Distribution::constant(Value::None),
                    Distribution::categorical(["l1", "l2", "elasticnet"]),
                ]),
            ),
            ("C", UniformFloatDistribution::new(1e-3, 1e3).log().with_default(1.0).into()),
            ("l1_ratio", Distribution::float(0.0, 1.0)),
            ("random_state", Distribution::constant(42)),
        ],
        7,
    )?;

    println!("Bound distributions:\n{sampler}\n");

    let active = sampler.active_space();
    println!("Active parameters: {:?}", active.names());
    for condition in active.conditions() {
        println!("  condition  {condition}");
    }
    for clause in active.forbiddens() {
        println!("  forbidden  {clause}");
    }
    println!();

    for (i, config) in sampler.sample(8)?.into_iter().enumerate() {
        // Every draw also passes the declarative validator
        model.validate_params(&config)?;

        let mut entries: Vec<_> = config.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let rendered: Vec<String> = entries.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!("#{i}: {}", rendered.join(", "));
    }

    println!("\nRecords:\n{}", sampler.to_json()?);
    Ok(())
}
