// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Run configuration as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// name = "regression"
/// parallel = true
/// thread_count = 4
///
/// [parameters]
/// browser = "firefox"
///
/// [groups]
/// include = ["fast"]
/// exclude = ["broken"]
///
/// [meta_groups]
/// all = ["fast", "slow"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRunConfig {
    /// Scheduling behaviour from `[run]`.
    #[serde(default)]
    pub run: RunSection,

    /// String parameters handed to every invocation.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    /// Group and method selection from `[groups]`.
    #[serde(default)]
    pub groups: GroupsSection,

    /// Group aliases: `name = ["group", "other-alias", ...]`.
    #[serde(default)]
    pub meta_groups: BTreeMap<String, Vec<String>>,
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Name of this run; shows up in logs and listener callbacks.
    #[serde(default = "default_name")]
    pub name: String,

    /// Dispatch execution units to a bounded pool instead of running them
    /// one after another on the calling task.
    #[serde(default)]
    pub parallel: bool,

    /// Size of the unit pool when `parallel = true`.
    #[serde(default = "default_thread_count")]
    pub thread_count: usize,

    /// Diagnostic verbosity. `>= 2` logs the partition plan, `>= 3` dumps
    /// the invoked-method trail after the run.
    #[serde(default = "default_verbose")]
    pub verbose: u8,

    /// Lower bound for the pool's overall await-termination deadline.
    #[serde(default = "default_pool_timeout_floor_ms")]
    pub pool_timeout_floor_ms: u64,
}

fn default_name() -> String {
    "default".to_string()
}

fn default_thread_count() -> usize {
    5
}

fn default_verbose() -> u8 {
    1
}

fn default_pool_timeout_floor_ms() -> u64 {
    10_000
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            parallel: false,
            thread_count: default_thread_count(),
            verbose: default_verbose(),
            pool_timeout_floor_ms: default_pool_timeout_floor_ms(),
        }
    }
}

/// `[groups]` section.
///
/// Every entry is a regular expression matched against the whole group name
/// (or qualified method name for the `*_methods` lists).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupsSection {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Methods always included, regardless of their groups.
    #[serde(default)]
    pub include_methods: Vec<String>,

    /// Methods always excluded.
    #[serde(default)]
    pub exclude_methods: Vec<String>,
}

/// Validated run configuration.
///
/// Constructed through `RunConfig::try_from(raw)`; see `config::validate`.
/// This is the explicit run context threaded through every component.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub run: RunSection,
    pub parameters: BTreeMap<String, String>,
    pub groups: GroupsSection,
    pub meta_groups: BTreeMap<String, Vec<String>>,
}

impl RunConfig {
    pub(crate) fn new_unchecked(raw: RawRunConfig) -> Self {
        Self {
            run: raw.run,
            parameters: raw.parameters,
            groups: raw.groups,
            meta_groups: raw.meta_groups,
        }
    }

    pub fn pool_timeout_floor(&self) -> Duration {
        Duration::from_millis(self.run.pool_timeout_floor_ms)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new_unchecked(RawRunConfig::default())
    }
}
