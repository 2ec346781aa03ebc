// src/registry/descriptor.rs

//! Method and class descriptors handed to the engine by the discovery layer.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::{ClassName, MethodId, MethodKind};

/// The class context a method runs in.
///
/// Every scheduled method is bound to exactly one `TestClass` by the
/// registry before partitioning starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestClass {
    pub name: ClassName,
    /// Name of the run this class participates in.
    pub run_name: String,
    /// Position of the class in discovery order.
    pub ordinal: usize,
}

/// One discovered method, test or configuration.
///
/// Built with the `with_*` methods, then frozen by the registry. The only
/// state that changes afterwards is the class binding (set once) and the
/// last invocation timestamp.
#[derive(Debug)]
pub struct MethodDescriptor {
    id: MethodId,
    class_name: ClassName,
    name: String,
    kind: MethodKind,
    groups: Vec<String>,
    depends_on_groups: Vec<String>,
    depends_on_methods: Vec<String>,
    invocation_count: usize,
    thread_pool_size: usize,
    timeout_ms: u64,
    success_percentage: u8,
    enabled: bool,
    parameter_rows: usize,
    binding: OnceLock<Arc<TestClass>>,
    last_invoked: Mutex<Option<DateTime<Utc>>>,
}

impl MethodDescriptor {
    pub fn new(class_name: impl Into<String>, name: impl Into<String>, kind: MethodKind) -> Self {
        let class_name = class_name.into();
        let name = name.into();
        Self {
            id: format!("{class_name}.{name}"),
            class_name,
            name,
            kind,
            groups: Vec::new(),
            depends_on_groups: Vec::new(),
            depends_on_methods: Vec::new(),
            invocation_count: 1,
            thread_pool_size: 0,
            timeout_ms: 0,
            success_percentage: 100,
            enabled: true,
            parameter_rows: 1,
            binding: OnceLock::new(),
            last_invoked: Mutex::new(None),
        }
    }

    pub fn test(class_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(class_name, name, MethodKind::Test)
    }

    /// Groups this method belongs to. For before/after-group methods these
    /// are the groups the method sets up or tears down.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn with_group_dependencies<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on_groups
            .extend(groups.into_iter().map(Into::into));
        self
    }

    /// Method names (or regexes) this method depends on. Names without a
    /// `.` are resolved against the declaring class.
    pub fn with_method_dependencies<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on_methods
            .extend(methods.into_iter().map(Into::into));
        self
    }

    pub fn with_invocation_count(mut self, count: usize) -> Self {
        self.invocation_count = count.max(1);
        self
    }

    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = size;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_success_percentage(mut self, percentage: u8) -> Self {
        self.success_percentage = percentage.min(100);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Number of data rows the external data feed supplies per invocation.
    pub fn with_parameter_rows(mut self, rows: usize) -> Self {
        self.parameter_rows = rows.max(1);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn depends_on_groups(&self) -> &[String] {
        &self.depends_on_groups
    }

    pub fn depends_on_methods(&self) -> &[String] {
        &self.depends_on_methods
    }

    /// Method dependencies with unqualified names prefixed by the declaring
    /// class.
    pub fn qualified_method_dependencies(&self) -> Vec<String> {
        self.depends_on_methods
            .iter()
            .map(|m| {
                if m.contains('.') {
                    m.clone()
                } else {
                    format!("{}.{}", self.class_name, m)
                }
            })
            .collect()
    }

    pub fn has_dependencies(&self) -> bool {
        !self.depends_on_groups.is_empty() || !self.depends_on_methods.is_empty()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocation_count
    }

    pub fn thread_pool_size(&self) -> usize {
        self.thread_pool_size
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn success_percentage(&self) -> u8 {
        self.success_percentage
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn parameter_rows(&self) -> usize {
        self.parameter_rows
    }

    /// Every (invocation, row) pair this method will be called with.
    pub fn total_invocations(&self) -> usize {
        self.invocation_count * self.parameter_rows
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Attach this method to its class context. Returns `false` if it was
    /// already bound.
    pub fn bind(&self, class: Arc<TestClass>) -> bool {
        self.binding.set(class).is_ok()
    }

    pub fn test_class(&self) -> Option<&Arc<TestClass>> {
        self.binding.get()
    }

    pub fn last_invoked(&self) -> Option<DateTime<Utc>> {
        *self
            .last_invoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn mark_invoked(&self, at: DateTime<Utc>) {
        let mut guard = self
            .last_invoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(at);
    }
}

/// A discovered class with all of its methods.
#[derive(Debug)]
pub struct ClassDescriptor {
    pub name: ClassName,
    pub methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unqualified_dependencies_resolve_against_declaring_class() {
        let m = MethodDescriptor::test("pkg.Suite", "verify")
            .with_method_dependencies(["test", "Other.setup"]);
        assert_eq!(
            m.qualified_method_dependencies(),
            vec!["pkg.Suite.test".to_string(), "Other.setup".to_string()]
        );
    }

    #[test]
    fn binding_is_set_once() {
        let m = MethodDescriptor::test("A", "t");
        let class = Arc::new(TestClass {
            name: "A".to_string(),
            run_name: "run".to_string(),
            ordinal: 0,
        });
        assert!(m.bind(class.clone()));
        assert!(!m.bind(class));
        assert_eq!(m.test_class().map(|c| c.name.as_str()), Some("A"));
    }

    #[test]
    fn data_rows_multiply_invocations() {
        let m = MethodDescriptor::test("A", "b")
            .with_invocation_count(2)
            .with_parameter_rows(3);
        assert_eq!(m.total_invocations(), 6);
    }
}
