// src/engine/listener.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::results::RunReport;

/// What listeners learn when a run starts.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub parallel: bool,
    pub thread_count: usize,
    pub parameters: BTreeMap<String, String>,
    /// Test methods that will be attempted.
    pub scheduled: usize,
    /// Methods removed before the run.
    pub excluded: usize,
}

/// Run-start and run-finish hooks.
pub trait RunListener: Send + Sync {
    fn on_start(&self, _ctx: &RunContext) {}

    fn on_finish(&self, _report: &RunReport) {}
}
