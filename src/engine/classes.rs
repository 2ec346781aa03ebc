// src/engine/classes.rs

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::scope::Scope;
use crate::exec::{ConfigOutcome, Dispatcher};
use crate::registry::{MethodDescriptor, MethodRegistry};
use crate::types::ClassName;

/// Before-class/after-class bookkeeping shared by every worker.
///
/// Each class is a scope whose members are its scheduled test methods.
#[derive(Debug, Default)]
pub struct ClassCoordinator {
    scopes: HashMap<ClassName, Scope>,
}

impl ClassCoordinator {
    pub fn new(registry: &MethodRegistry, tests: &[Arc<MethodDescriptor>]) -> Self {
        let mut members: HashMap<&str, usize> = HashMap::new();
        for test in tests {
            *members.entry(test.class_name()).or_default() += 1;
        }

        let scopes = members
            .into_iter()
            .map(|(class, count)| {
                let scope = Scope::new(
                    format!("class:{class}"),
                    registry.before_class(class).to_vec(),
                    registry.after_class(class).to_vec(),
                    count,
                );
                (class.to_string(), scope)
            })
            .collect();

        Self { scopes }
    }

    /// Scheduled test methods of `class` that have not finished yet.
    pub fn remaining(&self, class: &str) -> Option<usize> {
        self.scopes.get(class).map(Scope::remaining)
    }

    pub(crate) async fn enter(
        &self,
        method: &MethodDescriptor,
        dispatcher: &Dispatcher,
    ) -> ConfigOutcome {
        match self.scopes.get(method.class_name()) {
            Some(scope) => scope.enter(dispatcher).await,
            None => ConfigOutcome::Passed,
        }
    }

    pub(crate) async fn leave(&self, method: &MethodDescriptor, dispatcher: &Dispatcher) {
        if let Some(scope) = self.scopes.get(method.class_name()) {
            scope.leave(dispatcher).await;
        }
    }
}
