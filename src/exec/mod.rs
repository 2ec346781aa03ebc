// src/exec/mod.rs

//! Method invocation layer.
//!
//! - [`backend`] provides the `MethodInvoker` trait the engine calls through,
//!   and a `NoopInvoker` that passes everything.
//! - [`invocation`] owns the `Dispatcher`: repetitions, data rows, the
//!   intra-method pool, per-invocation timeouts, success percentage, and
//!   configuration scopes.
//! - [`skip`] handles skip requests, including time-bombed ones.

pub mod backend;
pub mod invocation;
pub mod skip;

pub use backend::{
    InvocationFuture, InvocationOutcome, InvocationRequest, MethodInvoker, NoopInvoker,
};
pub use invocation::{ConfigOutcome, Dispatcher, MethodReport};
pub use skip::{ResolvedSkip, SkipCondition, DEFAULT_DATE_FORMAT};
