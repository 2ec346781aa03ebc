// tests/time_bomb.rs

mod common;
use crate::common::builders::{ClassBuilder, RunConfigBuilder};
use crate::common::fake_invoker::ScriptedInvoker;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;

use suiterunner::engine::SuiteRunner;
use suiterunner::exec::SkipCondition;
use suiterunner::types::{FailureKind, MethodOutcome};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn skips_before_and_after_expiry() -> TestResult {
    init_tracing();

    let invoker = ScriptedInvoker::new();
    invoker.skip(
        "Bomb.pending",
        SkipCondition::until("waiting on upstream fix", "2999/12/31", None)?,
    );
    invoker.skip(
        "Bomb.overdue",
        SkipCondition::until("waiting on upstream fix", "2000/01/01", None)?,
    );
    invoker.skip("Bomb.plain", SkipCondition::new("not supported here"));

    let class = ClassBuilder::new("Bomb")
        .test("pending")
        .test("overdue")
        .test("plain")
        .test_with("dependent", |m| m.with_method_dependencies(["pending"]))
        .build();
    let runner = SuiteRunner::builder(RunConfigBuilder::new().build(), invoker.shared())
        .class(class)
        .build()?;
    let report = with_timeout(runner.run()).await;

    assert_eq!(report.outcome_of("Bomb.pending"), Some(MethodOutcome::Skipped));
    assert_eq!(
        report.skipped["Bomb.pending"][0].failure,
        Some(FailureKind::SkipRequested)
    );

    assert_eq!(report.outcome_of("Bomb.overdue"), Some(MethodOutcome::Failed));
    let overdue = &report.failed["Bomb.overdue"][0];
    assert_eq!(overdue.failure, Some(FailureKind::SkipExpired));
    assert_eq!(
        overdue.message.as_deref(),
        Some("waiting on upstream fix; Test must have been enabled by: 2000/01/01")
    );

    assert_eq!(report.outcome_of("Bomb.plain"), Some(MethodOutcome::Skipped));

    assert_eq!(report.outcome_of("Bomb.dependent"), Some(MethodOutcome::Skipped));
    assert_eq!(invoker.count("Bomb.dependent"), 0);
    Ok(())
}
