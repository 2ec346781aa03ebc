// src/registry/selector.rs

//! Method selectors: priority-ordered filters that decide which discovered
//! methods take part in the run.

use std::sync::Arc;

use crate::config::RunConfig;
use crate::errors::Result;
use crate::pattern::{any_matches, compile_all, NamePattern};
use crate::registry::descriptor::MethodDescriptor;
use crate::registry::meta_groups::expand_groups;

/// Priority of the built-in [`GroupSelector`].
pub const GROUP_SELECTOR_PRIORITY: i32 = 10;

/// State shared by the selectors of one chain while they judge a method.
#[derive(Debug, Default)]
pub struct SelectorContext {
    stopped: bool,
}

impl SelectorContext {
    /// Prevent lower-ranked selectors from being consulted for this method.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// A filter over discovered methods.
pub trait MethodSelector: Send + Sync {
    /// Return `false` to veto `method`.
    fn include(&self, ctx: &mut SelectorContext, method: &MethodDescriptor) -> bool;

    /// Optionally rearrange the selected test methods. Dependency ordering is
    /// applied afterwards and keeps this order wherever it can.
    fn arrange(&self, _methods: &mut Vec<Arc<MethodDescriptor>>) {}
}

/// Selectors ordered by ascending priority.
#[derive(Default)]
pub struct SelectorChain {
    selectors: Vec<(i32, Box<dyn MethodSelector>)>,
}

impl SelectorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, selector: Box<dyn MethodSelector>, priority: i32) {
        self.selectors.push((priority, selector));
        self.selectors.sort_by_key(|(p, _)| *p);
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Run `method` through the chain. The first veto wins; a selector that
    /// stops the chain makes its own verdict final.
    pub fn includes(&self, method: &MethodDescriptor) -> bool {
        let mut ctx = SelectorContext::default();
        for (_, selector) in &self.selectors {
            if !selector.include(&mut ctx, method) {
                return false;
            }
            if ctx.is_stopped() {
                break;
            }
        }
        true
    }

    pub fn arrange(&self, methods: &mut Vec<Arc<MethodDescriptor>>) {
        for (_, selector) in &self.selectors {
            selector.arrange(methods);
        }
    }
}

/// Built-in selector driven by the `[groups]` section of the run config.
///
/// Test methods:
/// - explicitly excluded methods are rejected, explicitly included ones kept;
/// - a method in an excluded group is rejected;
/// - with included groups (or included methods) configured, a method must
///   belong to one of the included groups.
///
/// Configuration methods are only rejected through the exclude lists.
#[derive(Debug)]
pub struct GroupSelector {
    include_groups: Vec<NamePattern>,
    exclude_groups: Vec<NamePattern>,
    include_methods: Vec<NamePattern>,
    exclude_methods: Vec<NamePattern>,
}

impl GroupSelector {
    pub fn from_config(cfg: &RunConfig) -> Result<Self> {
        let include = expand_groups(&cfg.groups.include, &cfg.meta_groups);
        let exclude = expand_groups(&cfg.groups.exclude, &cfg.meta_groups);

        Ok(Self {
            include_groups: compile_all(include.iter())?,
            exclude_groups: compile_all(exclude.iter())?,
            include_methods: compile_all(cfg.groups.include_methods.iter())?,
            exclude_methods: compile_all(cfg.groups.exclude_methods.iter())?,
        })
    }

    fn in_any(patterns: &[NamePattern], method: &MethodDescriptor) -> bool {
        method.groups().iter().any(|g| any_matches(patterns, g))
    }
}

impl MethodSelector for GroupSelector {
    fn include(&self, _ctx: &mut SelectorContext, method: &MethodDescriptor) -> bool {
        if any_matches(&self.exclude_methods, method.id()) {
            return false;
        }

        if method.kind().is_configuration() {
            return !Self::in_any(&self.exclude_groups, method);
        }

        if any_matches(&self.include_methods, method.id()) {
            return true;
        }
        if Self::in_any(&self.exclude_groups, method) {
            return false;
        }
        if self.include_groups.is_empty() && self.include_methods.is_empty() {
            return true;
        }
        Self::in_any(&self.include_groups, method)
    }
}
