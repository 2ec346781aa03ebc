// src/results/mod.rs

//! Where outcomes go.
//!
//! - [`ledger`]: the four result buckets plus the excluded set.
//! - [`audit`]: every invocation in start order, for reporting.
//! - [`report`]: the post-run snapshot handed to listeners and callers.

pub mod audit;
pub mod ledger;
pub mod report;

pub use audit::{AuditLog, InvokedMethod};
pub use ledger::{InvocationResult, ResultLedger, ResultMap};
pub use report::{RunReport, UnitSummary};
