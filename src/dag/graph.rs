// src/dag/graph.rs

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, SuiteError};
use crate::pattern::{any_matches, NamePattern};
use crate::registry::MethodDescriptor;
use crate::types::MethodId;

/// Compiled dependency patterns of one method.
#[derive(Debug)]
pub struct DependencyPatterns {
    methods: Vec<NamePattern>,
    groups: Vec<NamePattern>,
}

impl DependencyPatterns {
    pub fn of(method: &MethodDescriptor) -> Result<Self> {
        let methods = method
            .qualified_method_dependencies()
            .iter()
            .map(|p| NamePattern::strict(p))
            .collect::<Result<Vec<_>>>()?;
        let groups = method
            .depends_on_groups()
            .iter()
            .map(|p| NamePattern::strict(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { methods, groups })
    }

    /// First pattern that matches no method of `pool` (other than `owner`).
    pub fn first_unmatched(&self, owner: &str, pool: &[Arc<MethodDescriptor>]) -> Option<String> {
        let others = || pool.iter().filter(|m| m.id() != owner);

        for pattern in &self.methods {
            if !others().any(|m| pattern.matches(m.id())) {
                return Some(pattern.as_str().to_string());
            }
        }
        for pattern in &self.groups {
            if !others().any(|m| m.groups().iter().any(|g| pattern.matches(g))) {
                return Some(format!("group:{}", pattern.as_str()));
            }
        }
        None
    }

    /// Ids of every method in `pool` this method depends on.
    pub fn targets(&self, owner: &str, pool: &[Arc<MethodDescriptor>]) -> Vec<MethodId> {
        pool.iter()
            .filter(|m| m.id() != owner)
            .filter(|m| {
                any_matches(&self.methods, m.id())
                    || m.groups().iter().any(|g| any_matches(&self.groups, g))
            })
            .map(|m| m.id().to_string())
            .collect()
    }
}

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DepNode {
    /// Methods that must finish (and pass) before this one is attempted.
    deps: Vec<MethodId>,
    /// Methods that depend on this one.
    dependents: Vec<MethodId>,
}

/// Resolved dependency graph over the scheduled test methods.
///
/// Edges are concrete method ids: a group dependency becomes one edge per
/// member of the group.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<MethodId, DepNode>,
}

impl DependencyGraph {
    /// Build the graph over `methods`. Every dependency pattern is resolved
    /// against `methods` only.
    pub fn build(methods: &[Arc<MethodDescriptor>]) -> Result<Self> {
        let mut nodes: HashMap<MethodId, DepNode> = methods
            .iter()
            .map(|m| (m.id().to_string(), DepNode::default()))
            .collect();

        // First pass: dependency lists.
        for method in methods {
            let deps = DependencyPatterns::of(method)?.targets(method.id(), methods);
            if let Some(node) = nodes.get_mut(method.id()) {
                node.deps = deps;
            }
        }

        // Second pass: dependents based on deps.
        let edges: Vec<(MethodId, MethodId)> = nodes
            .iter()
            .flat_map(|(name, node)| node.deps.iter().map(move |d| (d.clone(), name.clone())))
            .collect();
        for (dep, dependent) in edges {
            if let Some(dep_node) = nodes.get_mut(&dep) {
                dep_node.dependents.push(dependent);
            }
        }
        for node in nodes.values_mut() {
            node.dependents.sort();
        }

        let graph = Self { nodes };
        graph.ensure_acyclic()?;
        Ok(graph)
    }

    fn ensure_acyclic(&self) -> Result<()> {
        // Edge direction: dep -> dependent.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (name, node) in self.nodes.iter() {
            for dep in node.deps.iter() {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(SuiteError::DependencyCycle(format!(
                "cycle detected in method dependencies involving '{}'",
                cycle.node_id()
            ))),
        }
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Methods `id` depends on (directly, or through a group).
    pub fn dependencies_of(&self, id: &str) -> &[MethodId] {
        self.nodes
            .get(id)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Methods that depend on `id`.
    pub fn dependents_of(&self, id: &str) -> &[MethodId] {
        self.nodes
            .get(id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Reorder `methods` so every method follows all of its dependencies.
    ///
    /// Among methods whose dependencies are satisfied the one that came first
    /// in `methods` wins, so an already valid order is returned unchanged.
    pub fn ordered(&self, methods: &[Arc<MethodDescriptor>]) -> Vec<Arc<MethodDescriptor>> {
        let position: HashMap<&str, usize> = methods
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id(), i))
            .collect();

        let mut waiting: Vec<usize> = methods
            .iter()
            .map(|m| {
                self.dependencies_of(m.id())
                    .iter()
                    .filter(|d| position.contains_key(d.as_str()))
                    .count()
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = waiting
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut result = Vec::with_capacity(methods.len());
        while let Some(Reverse(i)) = ready.pop() {
            let method = &methods[i];
            result.push(Arc::clone(method));
            for dependent in self.dependents_of(method.id()) {
                if let Some(&j) = position.get(dependent.as_str()) {
                    waiting[j] -= 1;
                    if waiting[j] == 0 {
                        ready.push(Reverse(j));
                    }
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(m: MethodDescriptor) -> Arc<MethodDescriptor> {
        Arc::new(m)
    }

    fn ids(methods: &[Arc<MethodDescriptor>]) -> Vec<&str> {
        methods.iter().map(|m| m.id()).collect()
    }

    #[test]
    fn group_dependency_fans_out_to_members() {
        let methods = vec![
            arc(MethodDescriptor::test("A", "a1").with_groups(["first"])),
            arc(MethodDescriptor::test("A", "a2").with_groups(["first"])),
            arc(MethodDescriptor::test("B", "main").with_group_dependencies(["first"])),
        ];
        let graph = DependencyGraph::build(&methods).unwrap();

        let mut deps = graph.dependencies_of("B.main").to_vec();
        deps.sort();
        assert_eq!(deps, vec!["A.a1".to_string(), "A.a2".to_string()]);
        assert_eq!(graph.dependents_of("A.a1"), ["B.main".to_string()]);
    }

    #[test]
    fn ordering_moves_dependencies_first_and_keeps_the_rest() {
        let methods = vec![
            arc(MethodDescriptor::test("A", "verify").with_method_dependencies(["test"])),
            arc(MethodDescriptor::test("A", "other")),
            arc(MethodDescriptor::test("A", "test")),
        ];
        let graph = DependencyGraph::build(&methods).unwrap();
        let ordered = graph.ordered(&methods);
        assert_eq!(ids(&ordered), vec!["A.other", "A.test", "A.verify"]);
    }

    #[test]
    fn cycles_are_rejected() {
        let methods = vec![
            arc(MethodDescriptor::test("A", "x").with_method_dependencies(["y"])),
            arc(MethodDescriptor::test("A", "y").with_method_dependencies(["x"])),
        ];
        match DependencyGraph::build(&methods) {
            Err(SuiteError::DependencyCycle(msg)) => assert!(msg.contains("cycle detected")),
            other => panic!("expected DependencyCycle, got {other:?}"),
        }
    }

    #[test]
    fn own_group_is_not_a_self_dependency() {
        let methods = vec![arc(
            MethodDescriptor::test("A", "x")
                .with_groups(["g"])
                .with_group_dependencies(["g"]),
        )];
        let graph = DependencyGraph::build(&methods).unwrap();
        assert!(graph.dependencies_of("A.x").is_empty());
    }
}
