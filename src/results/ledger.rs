// src/results/ledger.rs

//! Thread-safe result buckets.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::registry::ExcludedMethod;
use crate::types::{FailureKind, MethodId, MethodKind, MethodOutcome, ResultStatus};

/// Outcome of one invocation of one method.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    pub method: MethodId,
    pub kind: MethodKind,
    /// Ordinal of this attempt among the method's invocations.
    pub invocation: usize,
    pub status: ResultStatus,
    pub failure: Option<FailureKind>,
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Method id -> every result recorded for it in one bucket.
pub type ResultMap = BTreeMap<MethodId, Vec<InvocationResult>>;

/// Four disjoint result buckets plus the methods excluded before the run.
///
/// Each bucket has its own lock; no operation needs two of them at once.
#[derive(Debug, Default)]
pub struct ResultLedger {
    passed: Mutex<ResultMap>,
    failed: Mutex<ResultMap>,
    failed_within_success_percentage: Mutex<ResultMap>,
    skipped: Mutex<ResultMap>,
    excluded: Mutex<Vec<ExcludedMethod>>,
}

fn append(bucket: &Mutex<ResultMap>, result: InvocationResult) {
    let mut guard = bucket.lock().unwrap_or_else(PoisonError::into_inner);
    guard.entry(result.method.clone()).or_default().push(result);
}

fn snapshot(bucket: &Mutex<ResultMap>) -> ResultMap {
    bucket
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn contains(bucket: &Mutex<ResultMap>, method: &str) -> bool {
    bucket
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(method)
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_passed(&self, result: InvocationResult) {
        append(&self.passed, result);
    }

    pub fn record_failed(&self, result: InvocationResult) {
        append(&self.failed, result);
    }

    pub fn record_failed_within_success_percentage(&self, result: InvocationResult) {
        append(&self.failed_within_success_percentage, result);
    }

    pub fn record_skipped(&self, result: InvocationResult) {
        append(&self.skipped, result);
    }

    /// Route `result` to the bucket named by its status.
    pub fn record(&self, result: InvocationResult) {
        match result.status {
            ResultStatus::Passed => self.record_passed(result),
            ResultStatus::Failed => self.record_failed(result),
            ResultStatus::FailedWithinSuccessPercentage => {
                self.record_failed_within_success_percentage(result)
            }
            ResultStatus::Skipped => self.record_skipped(result),
        }
    }

    pub fn record_excluded(&self, method: ExcludedMethod) {
        self.excluded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(method);
    }

    pub fn passed(&self) -> ResultMap {
        snapshot(&self.passed)
    }

    pub fn failed(&self) -> ResultMap {
        snapshot(&self.failed)
    }

    pub fn failed_within_success_percentage(&self) -> ResultMap {
        snapshot(&self.failed_within_success_percentage)
    }

    pub fn skipped(&self) -> ResultMap {
        snapshot(&self.skipped)
    }

    pub fn excluded(&self) -> Vec<ExcludedMethod> {
        self.excluded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_results(&self, method: &str) -> bool {
        self.outcome_of(method).is_some()
    }

    /// Aggregate outcome of `method` so far, or `None` if nothing was
    /// recorded for it.
    pub fn outcome_of(&self, method: &str) -> Option<MethodOutcome> {
        if contains(&self.failed, method) {
            Some(MethodOutcome::Failed)
        } else if contains(&self.failed_within_success_percentage, method) {
            Some(MethodOutcome::PassedWithFailures)
        } else if contains(&self.passed, method) {
            Some(MethodOutcome::Passed)
        } else if contains(&self.skipped, method) {
            Some(MethodOutcome::Skipped)
        } else {
            None
        }
    }
}
