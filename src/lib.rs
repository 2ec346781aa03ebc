// src/lib.rs

pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pattern;
pub mod registry;
pub mod results;
pub mod types;

use std::sync::Arc;

use tracing::debug;

use crate::config::RunConfig;
use crate::engine::SuiteRunner;
use crate::errors::Result;
use crate::exec::MethodInvoker;
use crate::registry::ClassDescriptor;
use crate::results::RunReport;

pub use crate::errors::SuiteError;

/// High-level entry point.
///
/// This wires together:
/// - the method registry (binding, selection, dependency ordering)
/// - the partitioner
/// - the execution engine and its coordinators
///
/// Returns an error only if the method graph cannot be built; in that case
/// nothing was invoked.
pub async fn run_suite(
    config: RunConfig,
    classes: Vec<ClassDescriptor>,
    invoker: Arc<dyn MethodInvoker>,
) -> Result<RunReport> {
    let runner = SuiteRunner::builder(config, invoker)
        .classes(classes)
        .build()?;
    debug!(units = runner.units().len(), "suite runner built");
    Ok(runner.run().await)
}
