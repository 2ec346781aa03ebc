// tests/class_lifecycle.rs

mod common;
use crate::common::builders::{ClassBuilder, RunConfigBuilder};
use crate::common::fake_invoker::ScriptedInvoker;
use crate::common::{init_tracing, seqs, with_timeout};

use std::error::Error;
use std::time::Duration;

use suiterunner::engine::SuiteRunner;
use suiterunner::types::{FailureKind, MethodOutcome};

type TestResult = Result<(), Box<dyn Error>>;

fn class_with_tests(name: &str, tests: usize) -> ClassBuilder {
    let mut cb = ClassBuilder::new(name)
        .before_class("setUpClass")
        .after_class("tearDownClass");
    for i in 0..tests {
        cb = cb.test(&format!("t{i}"));
    }
    cb
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn class_configuration_fires_once_across_workers() -> TestResult {
    init_tracing();

    let invoker = ScriptedInvoker::new();
    for i in 0..6 {
        invoker.delay(&format!("Parallel.t{i}"), Duration::from_millis(10));
    }

    let runner = SuiteRunner::builder(
        RunConfigBuilder::new().parallel(3).build(),
        invoker.shared(),
    )
    .class(class_with_tests("Parallel", 6).build())
    .build()?;
    assert_eq!(runner.units().len(), 6);

    let report = with_timeout(runner.run()).await;

    assert_eq!(invoker.count("Parallel.setUpClass"), 1);
    assert_eq!(invoker.count("Parallel.tearDownClass"), 1);

    let set_up = seqs(&report, "Parallel.setUpClass")[0];
    let torn_down = seqs(&report, "Parallel.tearDownClass")[0];
    for i in 0..6 {
        let seq = seqs(&report, &format!("Parallel.t{i}"))[0];
        assert!(set_up < seq && seq < torn_down);
    }
    assert!(invoker.max_concurrency() <= 3);
    Ok(())
}

#[tokio::test]
async fn failed_class_setup_skips_only_that_class() -> TestResult {
    init_tracing();

    let invoker = ScriptedInvoker::new();
    invoker.fail("Broken.setUpClass", "fixture missing");

    let runner = SuiteRunner::builder(RunConfigBuilder::new().build(), invoker.shared())
        .class(class_with_tests("Broken", 2).build())
        .class(class_with_tests("Healthy", 2).build())
        .build()?;
    let report = with_timeout(runner.run()).await;

    for t in ["Broken.t0", "Broken.t1"] {
        assert_eq!(report.outcome_of(t), Some(MethodOutcome::Skipped));
        assert_eq!(
            report.skipped[t][0].failure,
            Some(FailureKind::ConfigurationFailure)
        );
        assert_eq!(invoker.count(t), 0);
    }
    assert_eq!(invoker.count("Broken.setUpClass"), 1);
    assert_eq!(invoker.count("Broken.tearDownClass"), 0);
    assert_eq!(
        report.outcome_of("Broken.tearDownClass"),
        Some(MethodOutcome::Skipped)
    );

    assert_eq!(report.outcome_of("Healthy.t0"), Some(MethodOutcome::Passed));
    assert_eq!(report.outcome_of("Healthy.t1"), Some(MethodOutcome::Passed));
    assert_eq!(invoker.count("Healthy.tearDownClass"), 1);
    Ok(())
}

#[tokio::test]
async fn second_class_setup_is_skipped_after_first_fails() -> TestResult {
    init_tracing();

    let invoker = ScriptedInvoker::new();
    invoker.fail("Two.first", "boom");

    let class = ClassBuilder::new("Two")
        .before_class("first")
        .before_class("second")
        .test("t")
        .build();
    let runner = SuiteRunner::builder(RunConfigBuilder::new().build(), invoker.shared())
        .class(class)
        .build()?;
    let report = with_timeout(runner.run()).await;

    assert_eq!(report.outcome_of("Two.first"), Some(MethodOutcome::Failed));
    assert_eq!(report.outcome_of("Two.second"), Some(MethodOutcome::Skipped));
    assert_eq!(invoker.count("Two.second"), 0);
    assert_eq!(report.outcome_of("Two.t"), Some(MethodOutcome::Skipped));
    Ok(())
}

#[tokio::test]
async fn class_without_eligible_tests_runs_no_configuration() -> TestResult {
    init_tracing();

    let invoker = ScriptedInvoker::new();
    let config = RunConfigBuilder::new().exclude_group("slow").build();
    let runner = SuiteRunner::builder(config, invoker.shared())
        .class(
            ClassBuilder::new("Slow")
                .before_class("setUpClass")
                .after_class("tearDownClass")
                .test_with("heavy", |m| m.with_groups(["slow"]))
                .build(),
        )
        .build()?;
    let report = with_timeout(runner.run()).await;

    assert!(invoker.calls().is_empty());
    assert!(report.is_excluded("Slow.heavy"));
    assert!(report.invoked.is_empty());
    Ok(())
}
