// src/exec/backend.rs

//! Pluggable method invoker abstraction.
//!
//! The engine decides *when* a method runs and on which worker; how the call
//! is physically made (argument binding, reflection, a child process) is the
//! business of a `MethodInvoker` supplied by the caller. Tests plug in a
//! scripted invoker that records calls instead of running anything.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::exec::skip::SkipCondition;
use crate::registry::MethodDescriptor;

/// Everything an invoker needs to make one call.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub method: Arc<MethodDescriptor>,
    /// Attempt ordinal across all repetitions and data rows, starting at 0.
    pub invocation: usize,
    /// Which repetition (`0..invocation_count`) this attempt belongs to.
    pub repetition: usize,
    /// Which data row (`0..parameter_rows`) is fed to this attempt.
    pub row: usize,
    /// Run parameter table, shared by every invocation.
    pub parameters: Arc<BTreeMap<String, String>>,
}

/// What the invoked method reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    Success,
    /// Assertion failure or any other error, with its message.
    Failure(String),
    /// The method asked to be skipped, possibly with an expiry date.
    Skip(SkipCondition),
}

impl InvocationOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        InvocationOutcome::Failure(message.into())
    }
}

pub type InvocationFuture = Pin<Box<dyn Future<Output = InvocationOutcome> + Send + 'static>>;

/// Trait abstracting how a single method invocation is carried out.
///
/// The returned future is spawned on its own task: a panic inside it is
/// recorded as a failure of that invocation and never escapes the engine.
pub trait MethodInvoker: Send + Sync {
    fn invoke(&self, request: InvocationRequest) -> InvocationFuture;
}

/// Invoker that succeeds on every call. Useful for dry runs that only
/// exercise ordering and lifecycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInvoker;

impl MethodInvoker for NoopInvoker {
    fn invoke(&self, _request: InvocationRequest) -> InvocationFuture {
        Box::pin(async { InvocationOutcome::Success })
    }
}
