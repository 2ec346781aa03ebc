// src/engine/groups.rs

//! Group lifecycle coordinator.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::engine::scope::Scope;
use crate::exec::{ConfigOutcome, Dispatcher};
use crate::registry::{GroupMethodMap, MethodDescriptor};

/// Runs before-group methods ahead of a group's first member and after-group
/// methods once its last member finishes, across every worker of the run.
///
/// Only groups that have configuration methods *and* scheduled members are
/// tracked; a group with no scheduled members never fires either side.
#[derive(Debug, Default)]
pub struct GroupCoordinator {
    scopes: BTreeMap<String, Scope>,
}

impl GroupCoordinator {
    pub fn new(map: &GroupMethodMap, tests: &[Arc<MethodDescriptor>]) -> Self {
        let mut scopes = BTreeMap::new();
        for group in map.groups() {
            let members = tests.iter().filter(|t| t.in_group(group)).count();
            if members == 0 {
                debug!(group, "group has no scheduled members; not tracking");
                continue;
            }
            scopes.insert(
                group.to_string(),
                Scope::new(
                    format!("group:{group}"),
                    map.before_group(group).to_vec(),
                    map.after_group(group).to_vec(),
                    members,
                ),
            );
        }
        Self { scopes }
    }

    pub fn tracked_groups(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }

    /// Members still outstanding in `group`, if it is tracked.
    pub fn remaining(&self, group: &str) -> Option<usize> {
        self.scopes.get(group).map(Scope::remaining)
    }

    fn scopes_of(&self, method: &MethodDescriptor) -> Vec<&Scope> {
        let groups: BTreeSet<&str> = method.groups().iter().map(String::as_str).collect();
        groups
            .into_iter()
            .filter_map(|g| self.scopes.get(g))
            .collect()
    }

    /// Make sure every group of `method` has been set up. Stops at the first
    /// group whose setup failed.
    pub(crate) async fn enter(
        &self,
        method: &MethodDescriptor,
        dispatcher: &Dispatcher,
    ) -> ConfigOutcome {
        for scope in self.scopes_of(method) {
            let outcome = scope.enter(dispatcher).await;
            if !outcome.is_passed() {
                debug!(method = %method.id(), scope = %scope.label(), "group setup failed");
                return outcome;
            }
        }
        ConfigOutcome::Passed
    }

    /// Count `method` as finished in each of its groups.
    pub(crate) async fn leave(&self, method: &MethodDescriptor, dispatcher: &Dispatcher) {
        for scope in self.scopes_of(method) {
            scope.leave(dispatcher).await;
        }
    }
}
