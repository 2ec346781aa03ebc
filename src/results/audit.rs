// src/results/audit.rs

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::registry::MethodDescriptor;
use crate::types::{MethodId, MethodKind};

/// One entry of the invoked-method trail.
#[derive(Debug, Clone)]
pub struct InvokedMethod {
    /// Position in invocation order, starting at 0.
    pub seq: u64,
    pub method: MethodId,
    pub class_name: String,
    pub kind: MethodKind,
    pub invocation: usize,
    pub at: DateTime<Utc>,
}

impl InvokedMethod {
    pub fn is_test(&self) -> bool {
        self.kind.is_test()
    }
}

/// Every invocation of every method, test or configuration, in the order
/// they started.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Mutex<Vec<InvokedMethod>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry for `method` and stamp the descriptor.
    pub fn record(&self, method: &MethodDescriptor, invocation: usize) -> DateTime<Utc> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let at = Utc::now();
        let seq = entries.len() as u64;
        entries.push(InvokedMethod {
            seq,
            method: method.id().to_string(),
            class_name: method.class_name().to_string(),
            kind: method.kind(),
            invocation,
            at,
        });
        method.mark_invoked(at);
        at
    }

    pub fn entries(&self) -> Vec<InvokedMethod> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
