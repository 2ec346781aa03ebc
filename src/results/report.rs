// src/results/report.rs

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::registry::ExcludedMethod;
use crate::results::audit::{AuditLog, InvokedMethod};
use crate::results::ledger::{ResultLedger, ResultMap};
use crate::types::{MethodId, MethodOutcome, UnitState};

/// Final state of one execution unit.
#[derive(Debug, Clone)]
pub struct UnitSummary {
    pub id: usize,
    pub methods: Vec<MethodId>,
    pub state: UnitState,
}

/// Everything a reporting layer needs once the run is over.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub passed: ResultMap,
    pub failed: ResultMap,
    pub failed_within_success_percentage: ResultMap,
    pub skipped: ResultMap,
    pub excluded: Vec<ExcludedMethod>,
    /// Every invocation, configuration methods included, in start order.
    pub invoked: Vec<InvokedMethod>,
    pub units: Vec<UnitSummary>,
    /// Await-termination bound of the worker pool; `None` in sequential mode.
    pub pool_deadline: Option<Duration>,
}

impl RunReport {
    pub(crate) fn collect(
        name: &str,
        started_at: DateTime<Utc>,
        ledger: &ResultLedger,
        audit: &AuditLog,
        units: Vec<UnitSummary>,
        pool_deadline: Option<Duration>,
    ) -> Self {
        Self {
            name: name.to_string(),
            started_at,
            finished_at: Utc::now(),
            passed: ledger.passed(),
            failed: ledger.failed(),
            failed_within_success_percentage: ledger.failed_within_success_percentage(),
            skipped: ledger.skipped(),
            excluded: ledger.excluded(),
            invoked: audit.entries(),
            units,
            pool_deadline,
        }
    }

    /// Aggregate outcome of `method`, with the same precedence the ledger
    /// uses: any failure wins, then passed-with-failures, passed, skipped.
    pub fn outcome_of(&self, method: &str) -> Option<MethodOutcome> {
        if self.failed.contains_key(method) {
            Some(MethodOutcome::Failed)
        } else if self.failed_within_success_percentage.contains_key(method) {
            Some(MethodOutcome::PassedWithFailures)
        } else if self.passed.contains_key(method) {
            Some(MethodOutcome::Passed)
        } else if self.skipped.contains_key(method) {
            Some(MethodOutcome::Skipped)
        } else {
            None
        }
    }

    pub fn is_excluded(&self, method: &str) -> bool {
        self.excluded.iter().any(|e| e.method.id() == method)
    }

    /// Audit entries for `method`, in invocation order.
    pub fn invocations_of<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a InvokedMethod> {
        self.invoked.iter().filter(move |i| i.method == method)
    }

    pub fn invocation_count(&self, method: &str) -> usize {
        self.invocations_of(method).count()
    }

    /// No method failed, within success percentage or otherwise outright.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn unit_states(&self) -> impl Iterator<Item = UnitState> + '_ {
        self.units.iter().map(|u| u.state)
    }
}

fn invocations(bucket: &ResultMap) -> usize {
    bucket.values().map(Vec::len).sum()
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: passed={} failed={} within-success-percentage={} skipped={} excluded={}",
            self.name,
            invocations(&self.passed),
            invocations(&self.failed),
            invocations(&self.failed_within_success_percentage),
            invocations(&self.skipped),
            self.excluded.len()
        )
    }
}
