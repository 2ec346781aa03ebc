// src/engine/mod.rs

//! Execution engine for suiterunner.
//!
//! This module ties together:
//! - the group lifecycle coordinator ([`groups`]) and its per-class
//!   counterpart ([`classes`]), both built on the exactly-once [`scope`];
//! - execution units ([`unit`]) and the pool that runs them ([`pool`]);
//! - run listeners ([`listener`]);
//! - the [`runner`] that drives a whole run: suite and test configuration
//!   around the units, then the report.

pub mod classes;
pub mod groups;
pub mod listener;
pub mod pool;
mod scope;
pub mod runner;
pub mod unit;

pub use classes::ClassCoordinator;
pub use groups::GroupCoordinator;
pub use listener::{RunContext, RunListener};
pub use pool::pool_deadline;
pub use runner::{SuiteRunner, SuiteRunnerBuilder};
pub use unit::ExecutionUnit;
