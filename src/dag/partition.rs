// src/dag/partition.rs

//! Split scheduled test methods into a sequential and a parallel list.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

use crate::pattern::NamePattern;
use crate::registry::MethodDescriptor;

/// Result of [`partition`].
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// Methods that take part in a dependency relation, in dependency order.
    pub sequential: Vec<Arc<MethodDescriptor>>,
    /// Independent methods, grouped by declaring class.
    pub parallel: Vec<Arc<MethodDescriptor>>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.sequential.len() + self.parallel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accumulated "something later depends on this" patterns.
#[derive(Default)]
struct DependedUpon {
    patterns: BTreeMap<String, NamePattern>,
}

impl DependedUpon {
    fn add(&mut self, source: &str) {
        self.patterns
            .entry(source.to_string())
            .or_insert_with(|| NamePattern::lenient(source));
    }

    fn matches(&self, candidate: &str) -> bool {
        self.patterns.values().any(|p| p.matches(candidate))
    }
}

/// Partition `methods` in a single backward pass.
///
/// Walking from the last method to the first:
/// - a method with method or group dependencies is sequential, and its
///   targets are remembered;
/// - a method some later method depends on (by name or through one of its
///   groups) is sequential;
/// - everything else is parallel.
///
/// `methods` must already be in dependency order; a dependency that appears
/// *after* its dependent is not seen in time and may end up parallel.
pub fn partition(methods: &[Arc<MethodDescriptor>]) -> Partition {
    let mut groups_depended_upon = DependedUpon::default();
    let mut methods_depended_upon = DependedUpon::default();

    let mut sequential: VecDeque<Arc<MethodDescriptor>> = VecDeque::new();
    let mut parallel: VecDeque<Arc<MethodDescriptor>> = VecDeque::new();

    for method in methods.iter().rev() {
        if method.has_dependencies() {
            for group in method.depends_on_groups() {
                groups_depended_upon.add(group);
            }
            for target in method.qualified_method_dependencies() {
                methods_depended_upon.add(&target);
            }
            sequential.push_front(Arc::clone(method));
        } else if methods_depended_upon.matches(method.id()) {
            sequential.push_front(Arc::clone(method));
        } else if method
            .groups()
            .iter()
            .any(|g| groups_depended_upon.matches(g))
        {
            sequential.push_front(Arc::clone(method));
        } else {
            parallel.push_front(Arc::clone(method));
        }
    }

    let mut parallel: Vec<_> = parallel.into();
    parallel.sort_by(|a, b| a.class_name().cmp(b.class_name()));

    debug!(
        sequential = sequential.len(),
        parallel = parallel.len(),
        "partitioned test methods"
    );

    Partition {
        sequential: sequential.into(),
        parallel,
    }
}
