// src/engine/scope.rs

//! Exactly-once setup and teardown around a set of test methods.
//!
//! A class and a group are both scopes: configuration to run before the
//! first member, configuration to run after the last, and a count of
//! members still outstanding.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::exec::{ConfigOutcome, Dispatcher};
use crate::registry::MethodDescriptor;

#[derive(Debug)]
pub(crate) struct Scope {
    label: String,
    before: Vec<Arc<MethodDescriptor>>,
    after: Vec<Arc<MethodDescriptor>>,
    entered: OnceCell<ConfigOutcome>,
    remaining: AtomicUsize,
}

impl Scope {
    pub(crate) fn new(
        label: String,
        before: Vec<Arc<MethodDescriptor>>,
        after: Vec<Arc<MethodDescriptor>>,
        members: usize,
    ) -> Self {
        Self {
            label,
            before,
            after,
            entered: OnceCell::new(),
            remaining: AtomicUsize::new(members),
        }
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    /// Run the before methods if nobody has yet, otherwise wait for whoever
    /// is running them. Every caller sees the same outcome.
    pub(crate) async fn enter(&self, dispatcher: &Dispatcher) -> ConfigOutcome {
        self.entered
            .get_or_init(|| async {
                debug!(scope = %self.label, before = self.before.len(), "entering scope");
                if self.before.is_empty() {
                    ConfigOutcome::Passed
                } else {
                    dispatcher.run_configuration(&self.before).await
                }
            })
            .await
            .clone()
    }

    /// Mark one member as finished. The caller that finishes the last member
    /// runs the after methods: normally if the scope was entered cleanly,
    /// recorded skipped if entering it failed, not at all if no member ever
    /// entered.
    pub(crate) async fn leave(&self, dispatcher: &Dispatcher) {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        if previous != Ok(1) {
            return;
        }

        debug!(scope = %self.label, after = self.after.len(), "last member finished");
        match self.entered.get() {
            Some(ConfigOutcome::Passed) => {
                if !self.after.is_empty() {
                    dispatcher.run_configuration(&self.after).await;
                }
            }
            Some(ConfigOutcome::Failed { method, .. }) => {
                let message = format!("configuration method '{method}' failed");
                dispatcher.skip_configuration(&self.after, &message);
            }
            None => {}
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }
}
