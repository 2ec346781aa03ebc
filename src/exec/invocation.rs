// src/exec/invocation.rs

//! Invoking one method: repetitions, data rows, the intra-method pool,
//! per-invocation timeouts and success-percentage classification.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::exec::backend::{InvocationOutcome, InvocationRequest, MethodInvoker};
use crate::registry::MethodDescriptor;
use crate::results::{AuditLog, InvocationResult, ResultLedger};
use crate::types::{FailureKind, MethodId, MethodOutcome, ResultStatus};

/// Result of running the configuration methods of one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOutcome {
    Passed,
    /// `method` failed (or was skipped); the rest of the scope is skipped.
    Failed { method: MethodId, message: String },
}

impl ConfigOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, ConfigOutcome::Passed)
    }
}

/// Aggregate of one test method across its invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodReport {
    pub outcome: MethodOutcome,
    /// At least one invocation ran past the method's timeout.
    pub timed_out: bool,
}

#[derive(Debug, Clone)]
enum Verdict {
    Success,
    Failure { kind: FailureKind, message: String },
    Skipped { message: String },
}

#[derive(Debug, Clone)]
struct Attempt {
    invocation: usize,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    verdict: Verdict,
}

/// Aborts the invocation task if the awaiting side goes away (timeout, or
/// the whole unit being torn down at the pool deadline).
struct AbortOnDrop(JoinHandle<InvocationOutcome>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Turns descriptors into invoker calls and ledger entries.
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct Dispatcher {
    invoker: Arc<dyn MethodInvoker>,
    ledger: Arc<ResultLedger>,
    audit: Arc<AuditLog>,
    parameters: Arc<BTreeMap<String, String>>,
}

impl Dispatcher {
    pub fn new(
        invoker: Arc<dyn MethodInvoker>,
        ledger: Arc<ResultLedger>,
        audit: Arc<AuditLog>,
        parameters: Arc<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            invoker,
            ledger,
            audit,
            parameters,
        }
    }

    pub fn ledger(&self) -> &Arc<ResultLedger> {
        &self.ledger
    }

    /// Invoke a test method `invocation_count x parameter_rows` times and
    /// record every attempt.
    ///
    /// With `invocation_count > 1` and a non-zero `thread_pool_size` the
    /// attempts run concurrently, at most `thread_pool_size` at a time.
    pub async fn run_test(&self, method: &Arc<MethodDescriptor>) -> MethodReport {
        let plan = attempt_plan(method);
        debug!(method = %method.id(), attempts = plan.len(), "invoking test method");

        let attempts = if method.invocation_count() > 1 && method.thread_pool_size() > 0 {
            self.run_pooled(method, plan).await
        } else {
            let mut attempts = Vec::with_capacity(plan.len());
            for (invocation, repetition, row) in plan {
                attempts.push(self.attempt(method, invocation, repetition, row).await);
            }
            attempts
        };

        self.classify(method, attempts)
    }

    async fn run_pooled(
        &self,
        method: &Arc<MethodDescriptor>,
        plan: Vec<(usize, usize, usize)>,
    ) -> Vec<Attempt> {
        let size = method.thread_pool_size().min(Semaphore::MAX_PERMITS);
        let permits = Arc::new(Semaphore::new(size));
        let mut set = JoinSet::new();

        for (invocation, repetition, row) in plan {
            let this = self.clone();
            let method = Arc::clone(method);
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                this.attempt(&method, invocation, repetition, row).await
            });
        }

        let mut attempts = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(attempt) => attempts.push(attempt),
                Err(err) => warn!(
                    method = %method.id(),
                    error = %err,
                    "intra-method worker ended without a result"
                ),
            }
        }
        attempts.sort_by_key(|a| a.invocation);
        attempts
    }

    async fn attempt(
        &self,
        method: &Arc<MethodDescriptor>,
        invocation: usize,
        repetition: usize,
        row: usize,
    ) -> Attempt {
        let started_at = self.audit.record(method, invocation);
        let request = InvocationRequest {
            method: Arc::clone(method),
            invocation,
            repetition,
            row,
            parameters: Arc::clone(&self.parameters),
        };

        let mut task = AbortOnDrop(tokio::spawn(self.invoker.invoke(request)));

        let joined = match method.timeout() {
            Some(limit) => match tokio::time::timeout(limit, &mut task.0).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        method = %method.id(),
                        invocation,
                        timeout_ms = limit.as_millis() as u64,
                        "invocation timed out"
                    );
                    return Attempt {
                        invocation,
                        started_at,
                        finished_at: Utc::now(),
                        verdict: Verdict::Failure {
                            kind: FailureKind::Timeout,
                            message: format!(
                                "method '{}' didn't finish within the time-out {}ms",
                                method.id(),
                                limit.as_millis()
                            ),
                        },
                    };
                }
            },
            None => (&mut task.0).await,
        };

        let verdict = match joined {
            Ok(InvocationOutcome::Success) => Verdict::Success,
            Ok(InvocationOutcome::Failure(message)) => Verdict::Failure {
                kind: FailureKind::Invocation,
                message,
            },
            Ok(InvocationOutcome::Skip(condition)) => {
                let resolved = condition.resolve_now();
                match resolved.status {
                    ResultStatus::Skipped => Verdict::Skipped {
                        message: resolved.message,
                    },
                    _ => Verdict::Failure {
                        kind: resolved.failure,
                        message: resolved.message,
                    },
                }
            }
            Err(err) => Verdict::Failure {
                kind: FailureKind::Invocation,
                message: join_error_message(err),
            },
        };

        Attempt {
            invocation,
            started_at,
            finished_at: Utc::now(),
            verdict,
        }
    }

    fn classify(&self, method: &MethodDescriptor, attempts: Vec<Attempt>) -> MethodReport {
        let total = attempts.len();
        let successes = attempts
            .iter()
            .filter(|a| matches!(a.verdict, Verdict::Success))
            .count();
        let failures = attempts
            .iter()
            .filter(|a| matches!(a.verdict, Verdict::Failure { .. }))
            .count();
        let timed_out = attempts.iter().any(|a| {
            matches!(
                a.verdict,
                Verdict::Failure {
                    kind: FailureKind::Timeout,
                    ..
                }
            )
        });

        // Only repeated methods get the benefit of the threshold.
        let within_percentage = total > 1
            && failures > 0
            && successes * 100 >= usize::from(method.success_percentage()) * total;

        for attempt in attempts {
            let (status, failure, message) = match attempt.verdict {
                Verdict::Success => (ResultStatus::Passed, None, None),
                Verdict::Failure { kind, message } if within_percentage => (
                    ResultStatus::FailedWithinSuccessPercentage,
                    Some(kind),
                    Some(message),
                ),
                Verdict::Failure { kind, message } => {
                    (ResultStatus::Failed, Some(kind), Some(message))
                }
                Verdict::Skipped { message } => (
                    ResultStatus::Skipped,
                    Some(FailureKind::SkipRequested),
                    Some(message),
                ),
            };
            self.ledger.record(InvocationResult {
                method: method.id().to_string(),
                kind: method.kind(),
                invocation: attempt.invocation,
                status,
                failure,
                message,
                started_at: attempt.started_at,
                finished_at: attempt.finished_at,
            });
        }

        let outcome = if failures > 0 {
            if within_percentage {
                MethodOutcome::PassedWithFailures
            } else {
                MethodOutcome::Failed
            }
        } else if successes > 0 {
            MethodOutcome::Passed
        } else {
            MethodOutcome::Skipped
        };

        info!(
            method = %method.id(),
            total,
            successes,
            failures,
            outcome = ?outcome,
            "test method finished"
        );

        MethodReport { outcome, timed_out }
    }

    /// Run the configuration methods of one scope in declaration order.
    ///
    /// Each runs once. After the first failure the remaining methods are
    /// recorded skipped and never invoked.
    pub async fn run_configuration(&self, methods: &[Arc<MethodDescriptor>]) -> ConfigOutcome {
        let mut outcome = ConfigOutcome::Passed;

        for method in methods {
            if let ConfigOutcome::Failed { method: culprit, .. } = &outcome {
                let message = format!("configuration method '{culprit}' failed");
                self.record_single(
                    method,
                    ResultStatus::Skipped,
                    FailureKind::ConfigurationFailure,
                    message,
                );
                continue;
            }

            debug!(method = %method.id(), kind = %method.kind(), "running configuration method");
            let attempt = self.attempt(method, 0, 0, 0).await;
            let (status, failure, message) = match attempt.verdict {
                Verdict::Success => (ResultStatus::Passed, None, None),
                Verdict::Failure { kind, message } => {
                    (ResultStatus::Failed, Some(kind), Some(message))
                }
                Verdict::Skipped { message } => (
                    ResultStatus::Skipped,
                    Some(FailureKind::SkipRequested),
                    Some(message),
                ),
            };

            if status != ResultStatus::Passed {
                warn!(
                    method = %method.id(),
                    kind = %method.kind(),
                    status = ?status,
                    "configuration method did not pass"
                );
                outcome = ConfigOutcome::Failed {
                    method: method.id().to_string(),
                    message: message.clone().unwrap_or_default(),
                };
            }

            self.ledger.record(InvocationResult {
                method: method.id().to_string(),
                kind: method.kind(),
                invocation: 0,
                status,
                failure,
                message,
                started_at: attempt.started_at,
                finished_at: attempt.finished_at,
            });
        }

        outcome
    }

    /// Record every method in `methods` as skipped without invoking it.
    pub fn skip_configuration(&self, methods: &[Arc<MethodDescriptor>], message: &str) {
        for method in methods {
            self.record_single(
                method,
                ResultStatus::Skipped,
                FailureKind::ConfigurationFailure,
                message.to_string(),
            );
        }
    }

    /// Record one skipped result for a test method that is not invoked.
    pub fn skip_test(&self, method: &MethodDescriptor, reason: FailureKind, message: String) {
        debug!(method = %method.id(), reason = ?reason, %message, "skipping test method");
        self.record_single(method, ResultStatus::Skipped, reason, message);
    }

    /// Record a timeout failure for `method` unless it already has results.
    pub fn fail_unfinished(&self, method: &MethodDescriptor, message: &str) {
        if self.ledger.has_results(method.id()) {
            return;
        }
        self.record_single(
            method,
            ResultStatus::Failed,
            FailureKind::Timeout,
            message.to_string(),
        );
    }

    fn record_single(
        &self,
        method: &MethodDescriptor,
        status: ResultStatus,
        failure: FailureKind,
        message: String,
    ) {
        let now = Utc::now();
        self.ledger.record(InvocationResult {
            method: method.id().to_string(),
            kind: method.kind(),
            invocation: 0,
            status,
            failure: Some(failure),
            message: Some(message),
            started_at: now,
            finished_at: now,
        });
    }
}

/// `(invocation, repetition, row)` for every call of `method`.
fn attempt_plan(method: &MethodDescriptor) -> Vec<(usize, usize, usize)> {
    let rows = method.parameter_rows();
    (0..method.invocation_count())
        .flat_map(|repetition| (0..rows).map(move |row| (repetition * rows + row, repetition, row)))
        .collect()
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        format!("invocation panicked: {}", panic_message(err.into_panic()))
    } else {
        format!("invocation was cancelled: {err}")
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
