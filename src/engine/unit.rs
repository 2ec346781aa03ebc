// src/engine/unit.rs

//! Execution units ("workers").

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use crate::dag::DependencyGraph;
use crate::engine::classes::ClassCoordinator;
use crate::engine::groups::GroupCoordinator;
use crate::exec::{ConfigOutcome, Dispatcher, MethodReport};
use crate::registry::MethodDescriptor;
use crate::results::UnitSummary;
use crate::types::{FailureKind, MethodId, MethodOutcome, UnitState};

/// Shared state every unit of a run consults.
pub(crate) struct UnitContext {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) classes: ClassCoordinator,
    pub(crate) groups: GroupCoordinator,
    pub(crate) graph: DependencyGraph,
}

/// An ordered list of test methods run one after another by one worker.
///
/// The whole sequential list forms one unit; every parallel method gets a
/// unit of its own.
#[derive(Debug)]
pub struct ExecutionUnit {
    id: usize,
    methods: Vec<Arc<MethodDescriptor>>,
    state: Mutex<UnitState>,
}

impl ExecutionUnit {
    pub fn sequential(id: usize, methods: Vec<Arc<MethodDescriptor>>) -> Self {
        Self {
            id,
            methods,
            state: Mutex::new(UnitState::Pending),
        }
    }

    pub fn single(id: usize, method: Arc<MethodDescriptor>) -> Self {
        Self::sequential(id, vec![method])
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn methods(&self) -> &[Arc<MethodDescriptor>] {
        &self.methods
    }

    pub fn state(&self) -> UnitState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, state: UnitState) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(unit = self.id, from = ?*guard, to = ?state, "unit state change");
        *guard = state;
    }

    /// Largest per-method timeout of this unit, zero if none is declared.
    pub fn max_timeout(&self) -> Duration {
        self.methods
            .iter()
            .filter_map(|m| m.timeout())
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn summary(&self) -> UnitSummary {
        UnitSummary {
            id: self.id,
            methods: self.methods.iter().map(|m| m.id().to_string()).collect(),
            state: self.state(),
        }
    }

    /// Run every method in order. A failure does not stop the unit; methods
    /// depending on the failed one are skipped when their turn comes.
    pub(crate) async fn run(&self, ctx: &UnitContext) {
        self.set_state(UnitState::Running);
        info!(unit = self.id, methods = self.methods.len(), "unit started");

        let mut failed = false;
        let mut timed_out = false;

        for method in &self.methods {
            if let Some(report) = run_method(method, ctx).await {
                timed_out |= report.timed_out;
                failed |= report.outcome == MethodOutcome::Failed;
            }
        }

        let state = if timed_out {
            UnitState::TimedOut
        } else if failed {
            UnitState::Failed
        } else {
            UnitState::Completed
        };
        self.set_state(state);
        info!(unit = self.id, state = ?state, "unit finished");
    }
}

/// First dependency of `method` that has not passed (yet).
fn unsatisfied_dependency(method: &MethodDescriptor, ctx: &UnitContext) -> Option<MethodId> {
    let ledger = ctx.dispatcher.ledger();
    ctx.graph
        .dependencies_of(method.id())
        .iter()
        .find(|dep| {
            !ledger
                .outcome_of(dep)
                .is_some_and(MethodOutcome::satisfies_dependents)
        })
        .cloned()
}

async fn run_method(method: &Arc<MethodDescriptor>, ctx: &UnitContext) -> Option<MethodReport> {
    let dispatcher = &ctx.dispatcher;

    let report = if let Some(dep) = unsatisfied_dependency(method, ctx) {
        dispatcher.skip_test(
            method,
            FailureKind::DependencyUnsatisfied,
            format!("depends on '{dep}', which did not pass"),
        );
        None
    } else if let ConfigOutcome::Failed { method: culprit, .. } =
        ctx.classes.enter(method, dispatcher).await
    {
        dispatcher.skip_test(
            method,
            FailureKind::ConfigurationFailure,
            format!("before-class method '{culprit}' failed"),
        );
        None
    } else if let ConfigOutcome::Failed { method: culprit, .. } =
        ctx.groups.enter(method, dispatcher).await
    {
        dispatcher.skip_test(
            method,
            FailureKind::ConfigurationFailure,
            format!("before-group method '{culprit}' failed"),
        );
        None
    } else {
        Some(dispatcher.run_test(method).await)
    };

    ctx.groups.leave(method, dispatcher).await;
    ctx.classes.leave(method, dispatcher).await;

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_timeout_is_largest_declared() {
        let unit = ExecutionUnit::sequential(
            0,
            vec![
                Arc::new(MethodDescriptor::test("A", "a").with_timeout_ms(30)),
                Arc::new(MethodDescriptor::test("A", "b")),
                Arc::new(MethodDescriptor::test("A", "c").with_timeout_ms(500)),
            ],
        );
        assert_eq!(unit.max_timeout(), Duration::from_millis(500));
        assert_eq!(unit.state(), UnitState::Pending);
    }

    #[test]
    fn unit_without_timeouts_reports_zero() {
        let unit = ExecutionUnit::single(3, Arc::new(MethodDescriptor::test("A", "a")));
        assert_eq!(unit.max_timeout(), Duration::ZERO);
        assert_eq!(unit.summary().methods, vec!["A.a".to_string()]);
    }
}
