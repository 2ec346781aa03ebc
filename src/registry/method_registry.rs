// src/registry/method_registry.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RunConfig;
use crate::dag::graph::{DependencyGraph, DependencyPatterns};
use crate::errors::{Result, SuiteError};
use crate::registry::descriptor::{ClassDescriptor, MethodDescriptor, TestClass};
use crate::registry::group_map::GroupMethodMap;
use crate::registry::selector::SelectorChain;
use crate::types::{ClassName, ExclusionReason, MethodKind};

/// A method removed before scheduling, with the reason.
#[derive(Debug, Clone)]
pub struct ExcludedMethod {
    pub method: Arc<MethodDescriptor>,
    pub reason: ExclusionReason,
}

/// Every method of the run, bound to its class, filtered and ordered.
#[derive(Debug)]
pub struct MethodRegistry {
    classes: Vec<Arc<TestClass>>,
    before_suite: Vec<Arc<MethodDescriptor>>,
    after_suite: Vec<Arc<MethodDescriptor>>,
    before_test: Vec<Arc<MethodDescriptor>>,
    after_test: Vec<Arc<MethodDescriptor>>,
    before_class: HashMap<ClassName, Vec<Arc<MethodDescriptor>>>,
    after_class: HashMap<ClassName, Vec<Arc<MethodDescriptor>>>,
    group_methods: GroupMethodMap,
    tests: Vec<Arc<MethodDescriptor>>,
    graph: DependencyGraph,
    excluded: Vec<ExcludedMethod>,
}

impl MethodRegistry {
    /// Bind, filter and order the discovered classes.
    ///
    /// Fails (and the run must not start) when a class or method is declared
    /// twice, when a dependency matches nothing that was discovered, or when
    /// dependencies form a cycle.
    pub fn build(
        cfg: &RunConfig,
        classes: Vec<ClassDescriptor>,
        selectors: &SelectorChain,
    ) -> Result<Self> {
        let mut bound_classes = Vec::with_capacity(classes.len());
        let mut all: Vec<Arc<MethodDescriptor>> = Vec::new();
        let mut seen_classes: HashSet<ClassName> = HashSet::new();
        let mut seen_methods: HashSet<String> = HashSet::new();

        for (ordinal, class) in classes.into_iter().enumerate() {
            if !seen_classes.insert(class.name.clone()) {
                return Err(SuiteError::ConfigError(format!(
                    "class '{}' is declared twice",
                    class.name
                )));
            }

            let test_class = Arc::new(TestClass {
                name: class.name.clone(),
                run_name: cfg.run.name.clone(),
                ordinal,
            });

            for method in class.methods {
                if method.class_name() != class.name {
                    return Err(SuiteError::ConfigError(format!(
                        "method '{}' is listed under class '{}'",
                        method.id(),
                        class.name
                    )));
                }
                if !seen_methods.insert(method.id().to_string()) {
                    return Err(SuiteError::ConfigError(format!(
                        "method '{}' is declared twice",
                        method.id()
                    )));
                }
                if !method.bind(Arc::clone(&test_class)) {
                    return Err(SuiteError::UnboundMethod(method.id().to_string()));
                }
                all.push(Arc::new(method));
            }

            bound_classes.push(test_class);
        }

        let mut excluded = Vec::new();
        let mut included = Vec::new();
        for method in all.iter() {
            if !method.is_enabled() {
                debug!(method = %method.id(), "method disabled; excluding");
                excluded.push(ExcludedMethod {
                    method: Arc::clone(method),
                    reason: ExclusionReason::Disabled,
                });
            } else if !selectors.includes(method) {
                debug!(method = %method.id(), "method rejected by selectors; excluding");
                excluded.push(ExcludedMethod {
                    method: Arc::clone(method),
                    reason: ExclusionReason::Selector,
                });
            } else {
                included.push(Arc::clone(method));
            }
        }

        let discovered_tests: Vec<_> = all.iter().filter(|m| m.kind().is_test()).cloned().collect();
        let mut tests: Vec<_> = included
            .iter()
            .filter(|m| m.kind().is_test())
            .cloned()
            .collect();

        check_dependencies_exist(&tests, &discovered_tests)?;
        exclude_unsatisfiable(&mut tests, &mut excluded)?;
        selectors.arrange(&mut tests);

        let graph = DependencyGraph::build(&tests)?;
        let tests = graph.ordered(&tests);

        let mut registry = Self {
            classes: bound_classes,
            before_suite: Vec::new(),
            after_suite: Vec::new(),
            before_test: Vec::new(),
            after_test: Vec::new(),
            before_class: HashMap::new(),
            after_class: HashMap::new(),
            group_methods: GroupMethodMap::build(included.iter()),
            tests,
            graph,
            excluded,
        };

        for method in included.iter() {
            let class = method.class_name().to_string();
            match method.kind() {
                MethodKind::BeforeSuite => registry.before_suite.push(Arc::clone(method)),
                MethodKind::AfterSuite => registry.after_suite.push(Arc::clone(method)),
                MethodKind::BeforeTest => registry.before_test.push(Arc::clone(method)),
                MethodKind::AfterTest => registry.after_test.push(Arc::clone(method)),
                MethodKind::BeforeClass => registry
                    .before_class
                    .entry(class)
                    .or_default()
                    .push(Arc::clone(method)),
                MethodKind::AfterClass => registry
                    .after_class
                    .entry(class)
                    .or_default()
                    .push(Arc::clone(method)),
                MethodKind::BeforeGroup | MethodKind::AfterGroup | MethodKind::Test => {}
            }
        }

        info!(
            run = %cfg.run.name,
            classes = registry.classes.len(),
            tests = registry.tests.len(),
            excluded = registry.excluded.len(),
            "method registry built"
        );

        Ok(registry)
    }

    pub fn classes(&self) -> &[Arc<TestClass>] {
        &self.classes
    }

    pub fn before_suite(&self) -> &[Arc<MethodDescriptor>] {
        &self.before_suite
    }

    pub fn after_suite(&self) -> &[Arc<MethodDescriptor>] {
        &self.after_suite
    }

    pub fn before_test(&self) -> &[Arc<MethodDescriptor>] {
        &self.before_test
    }

    pub fn after_test(&self) -> &[Arc<MethodDescriptor>] {
        &self.after_test
    }

    pub fn before_class(&self, class: &str) -> &[Arc<MethodDescriptor>] {
        self.before_class
            .get(class)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn after_class(&self, class: &str) -> &[Arc<MethodDescriptor>] {
        self.after_class
            .get(class)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn group_methods(&self) -> &GroupMethodMap {
        &self.group_methods
    }

    /// Scheduled test methods in dependency order.
    pub fn tests(&self) -> &[Arc<MethodDescriptor>] {
        &self.tests
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn excluded(&self) -> &[ExcludedMethod] {
        &self.excluded
    }
}

/// A dependency that matches nothing that was discovered is a broken method
/// graph, not a selection artefact.
fn check_dependencies_exist(
    tests: &[Arc<MethodDescriptor>],
    discovered: &[Arc<MethodDescriptor>],
) -> Result<()> {
    for method in tests {
        if let Some(target) = DependencyPatterns::of(method)?.first_unmatched(method.id(), discovered)
        {
            return Err(SuiteError::UnknownDependency {
                method: method.id().to_string(),
                target,
            });
        }
    }
    Ok(())
}

/// Repeatedly drop methods whose dependencies only match excluded methods,
/// until nothing changes.
fn exclude_unsatisfiable(
    tests: &mut Vec<Arc<MethodDescriptor>>,
    excluded: &mut Vec<ExcludedMethod>,
) -> Result<()> {
    let patterns: HashMap<String, DependencyPatterns> = tests
        .iter()
        .map(|m| -> Result<(String, DependencyPatterns)> {
            Ok((m.id().to_string(), DependencyPatterns::of(m)?))
        })
        .collect::<Result<_>>()?;

    loop {
        let doomed: Vec<usize> = tests
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                patterns
                    .get(m.id())
                    .and_then(|p| p.first_unmatched(m.id(), tests))
                    .is_some()
            })
            .map(|(i, _)| i)
            .collect();

        if doomed.is_empty() {
            return Ok(());
        }

        for i in doomed.into_iter().rev() {
            let method = tests.remove(i);
            debug!(method = %method.id(), "dependency excluded from run; excluding dependent");
            excluded.push(ExcludedMethod {
                method,
                reason: ExclusionReason::MissingDependency,
            });
        }
    }
}
