// tests/success_percentage.rs

mod common;
use crate::common::builders::{ClassBuilder, RunConfigBuilder};
use crate::common::fake_invoker::ScriptedInvoker;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;

use suiterunner::engine::SuiteRunner;
use suiterunner::results::RunReport;
use suiterunner::types::MethodOutcome;

type TestResult = Result<(), Box<dyn Error>>;

async fn run_flaky(failures: usize, pool: usize) -> Result<(ScriptedInvoker, RunReport), Box<dyn Error>> {
    let invoker = ScriptedInvoker::new();
    invoker.fail_invocations("Flaky.sometimes", 0..failures);

    let class = ClassBuilder::new("Flaky")
        .test_with("sometimes", |m| {
            m.with_invocation_count(10)
                .with_success_percentage(50)
                .with_thread_pool_size(pool)
        })
        .test_with("after", |m| m.with_method_dependencies(["sometimes"]))
        .build();

    let runner = SuiteRunner::builder(RunConfigBuilder::new().build(), invoker.shared())
        .class(class)
        .build()?;
    let report = with_timeout(runner.run()).await;
    Ok((invoker, report))
}

#[tokio::test]
async fn five_failures_out_of_ten_pass_with_failures() -> TestResult {
    init_tracing();

    let (invoker, report) = run_flaky(5, 0).await?;

    assert_eq!(invoker.count("Flaky.sometimes"), 10);
    assert_eq!(
        report.outcome_of("Flaky.sometimes"),
        Some(MethodOutcome::PassedWithFailures)
    );
    assert_eq!(report.passed["Flaky.sometimes"].len(), 5);
    assert_eq!(
        report.failed_within_success_percentage["Flaky.sometimes"].len(),
        5
    );
    assert!(!report.failed.contains_key("Flaky.sometimes"));

    // Passing with failures still satisfies dependents.
    assert_eq!(report.outcome_of("Flaky.after"), Some(MethodOutcome::Passed));
    Ok(())
}

#[tokio::test]
async fn six_failures_out_of_ten_fail() -> TestResult {
    init_tracing();

    let (_, report) = run_flaky(6, 0).await?;

    assert_eq!(
        report.outcome_of("Flaky.sometimes"),
        Some(MethodOutcome::Failed)
    );
    assert_eq!(report.failed["Flaky.sometimes"].len(), 6);
    assert_eq!(report.passed["Flaky.sometimes"].len(), 4);
    assert!(!report
        .failed_within_success_percentage
        .contains_key("Flaky.sometimes"));
    assert_eq!(report.outcome_of("Flaky.after"), Some(MethodOutcome::Skipped));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn threshold_applies_to_pooled_invocations() -> TestResult {
    init_tracing();

    let (invoker, report) = run_flaky(5, 3).await?;

    assert_eq!(invoker.count("Flaky.sometimes"), 10);
    assert_eq!(
        report.outcome_of("Flaky.sometimes"),
        Some(MethodOutcome::PassedWithFailures)
    );
    let mut ordinals: Vec<usize> = report
        .invocations_of("Flaky.sometimes")
        .map(|i| i.invocation)
        .collect();
    ordinals.sort();
    assert_eq!(ordinals, (0..10).collect::<Vec<_>>());
    Ok(())
}
