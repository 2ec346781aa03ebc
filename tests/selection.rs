// tests/selection.rs

mod common;
use crate::common::builders::{ClassBuilder, RunConfigBuilder};
use crate::common::fake_invoker::ScriptedInvoker;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;

use suiterunner::engine::SuiteRunner;
use suiterunner::errors::SuiteError;
use suiterunner::registry::{MethodDescriptor, MethodSelector, SelectorContext};
use suiterunner::types::{ExclusionReason, MethodOutcome};

type TestResult = Result<(), Box<dyn Error>>;

fn reason_for(report: &suiterunner::results::RunReport, method: &str) -> Option<ExclusionReason> {
    report
        .excluded
        .iter()
        .find(|e| e.method.id() == method)
        .map(|e| e.reason)
}

#[tokio::test]
async fn group_selection_excludes_before_the_run() -> TestResult {
    init_tracing();

    let invoker = ScriptedInvoker::new();
    let config = RunConfigBuilder::new()
        .include_group("quick")
        .meta_group("quick", &["fast", "smoke"])
        .build();
    let class = ClassBuilder::new("Sel")
        .test_with("fast", |m| m.with_groups(["fast"]))
        .test_with("smoke", |m| m.with_groups(["smoke"]))
        .test_with("slow", |m| m.with_groups(["slow"]))
        .build();

    let runner = SuiteRunner::builder(config, invoker.shared())
        .class(class)
        .build()?;
    let report = with_timeout(runner.run()).await;

    assert_eq!(invoker.calls(), vec!["Sel.fast", "Sel.smoke"]);
    assert_eq!(reason_for(&report, "Sel.slow"), Some(ExclusionReason::Selector));
    assert_eq!(report.outcome_of("Sel.slow"), None);
    Ok(())
}

#[tokio::test]
async fn dependents_of_disabled_methods_are_excluded() -> TestResult {
    init_tracing();

    let invoker = ScriptedInvoker::new();
    let class = ClassBuilder::new("Dis")
        .test_with("off", |m| m.with_enabled(false))
        .test_with("needsOff", |m| m.with_method_dependencies(["off"]))
        .test_with("needsNeedsOff", |m| m.with_method_dependencies(["needsOff"]))
        .test("free")
        .build();

    let runner = SuiteRunner::builder(RunConfigBuilder::new().build(), invoker.shared())
        .class(class)
        .build()?;
    let report = with_timeout(runner.run()).await;

    assert_eq!(reason_for(&report, "Dis.off"), Some(ExclusionReason::Disabled));
    assert_eq!(
        reason_for(&report, "Dis.needsOff"),
        Some(ExclusionReason::MissingDependency)
    );
    assert_eq!(
        reason_for(&report, "Dis.needsNeedsOff"),
        Some(ExclusionReason::MissingDependency)
    );
    assert_eq!(invoker.calls(), vec!["Dis.free"]);
    for excluded in ["Dis.off", "Dis.needsOff", "Dis.needsNeedsOff"] {
        assert_eq!(report.outcome_of(excluded), None);
    }
    Ok(())
}

#[test]
fn unknown_dependency_aborts_before_anything_runs() {
    init_tracing();

    let invoker = ScriptedInvoker::new();
    let class = ClassBuilder::new("Bad")
        .test_with("orphan", |m| m.with_method_dependencies(["doesNotExist"]))
        .build();

    let result = SuiteRunner::builder(RunConfigBuilder::new().build(), invoker.shared())
        .class(class)
        .build();

    match result {
        Err(SuiteError::UnknownDependency { method, target }) => {
            assert_eq!(method, "Bad.orphan");
            assert_eq!(target, "Bad.doesNotExist");
        }
        other => panic!("expected UnknownDependency, got {other:?}"),
    }
    assert!(invoker.calls().is_empty());
}

#[test]
fn dependency_cycle_is_rejected() {
    init_tracing();

    let class = ClassBuilder::new("Loop")
        .test_with("x", |m| m.with_group_dependencies(["gy"]).with_groups(["gx"]))
        .test_with("y", |m| m.with_group_dependencies(["gx"]).with_groups(["gy"]))
        .build();

    let result = SuiteRunner::builder(
        RunConfigBuilder::new().build(),
        ScriptedInvoker::new().shared(),
    )
    .class(class)
    .build();

    assert!(matches!(result, Err(SuiteError::DependencyCycle(_))));
}

#[test]
fn duplicate_class_is_a_configuration_error() {
    let result = SuiteRunner::builder(
        RunConfigBuilder::new().build(),
        ScriptedInvoker::new().shared(),
    )
    .class(ClassBuilder::new("Twin").test("a").build())
    .class(ClassBuilder::new("Twin").test("b").build())
    .build();

    assert!(matches!(result, Err(SuiteError::ConfigError(_))));
}

struct NameVeto(&'static str);

impl MethodSelector for NameVeto {
    fn include(&self, _ctx: &mut SelectorContext, method: &MethodDescriptor) -> bool {
        method.name() != self.0
    }
}

struct KeepEverything;

impl MethodSelector for KeepEverything {
    fn include(&self, ctx: &mut SelectorContext, _method: &MethodDescriptor) -> bool {
        ctx.stop();
        true
    }
}

struct Reverse;

impl MethodSelector for Reverse {
    fn include(&self, _ctx: &mut SelectorContext, _method: &MethodDescriptor) -> bool {
        true
    }

    fn arrange(&self, methods: &mut Vec<Arc<MethodDescriptor>>) {
        methods.reverse();
    }
}

#[tokio::test]
async fn custom_selectors_veto_stop_and_arrange() -> TestResult {
    init_tracing();

    let invoker = ScriptedInvoker::new();
    let config = RunConfigBuilder::new().exclude_group("broken").build();
    let class = ClassBuilder::new("Custom")
        .test("a")
        .test("b")
        .test("vetoed")
        .test_with("rescued", |m| m.with_groups(["broken"]))
        .build();

    // Priority 1 stops the chain before the group selector (priority 10) for
    // everything, so "rescued" survives; the veto at 20 is never consulted.
    let runner = SuiteRunner::builder(config, invoker.shared())
        .selector(1, KeepEverything)
        .selector(20, NameVeto("vetoed"))
        .selector(30, Reverse)
        .class(class)
        .build()?;

    let order: Vec<_> = runner.registry().tests().iter().map(|m| m.id()).collect();
    assert_eq!(
        order,
        vec!["Custom.rescued", "Custom.vetoed", "Custom.b", "Custom.a"]
    );

    let report = with_timeout(runner.run()).await;
    assert_eq!(report.outcome_of("Custom.vetoed"), Some(MethodOutcome::Passed));
    assert!(report.excluded.is_empty());
    Ok(())
}

#[tokio::test]
async fn veto_before_the_group_selector_excludes() -> TestResult {
    init_tracing();

    let invoker = ScriptedInvoker::new();
    let runner = SuiteRunner::builder(RunConfigBuilder::new().build(), invoker.shared())
        .selector(5, NameVeto("vetoed"))
        .class(ClassBuilder::new("V").test("vetoed").test("kept").build())
        .build()?;
    let report = with_timeout(runner.run()).await;

    assert_eq!(reason_for(&report, "V.vetoed"), Some(ExclusionReason::Selector));
    assert_eq!(invoker.calls(), vec!["V.kept"]);
    Ok(())
}
