// tests/property_partition.rs

mod common;
use crate::common::builders::{ClassBuilder, RunConfigBuilder};
use crate::common::fake_invoker::ScriptedInvoker;
use crate::common::seqs;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use proptest::prelude::*;
use suiterunner::dag::partition;
use suiterunner::engine::SuiteRunner;
use suiterunner::exec::NoopInvoker;
use suiterunner::registry::ClassDescriptor;
use suiterunner::types::MethodOutcome;

/// An acyclic set of methods `m0..mN`; `mI` may only depend on `mJ` with
/// `J < I`. Declaration order is shuffled independently.
#[derive(Debug, Clone)]
struct Plan {
    deps: Vec<BTreeSet<usize>>,
    order: Vec<usize>,
}

impl Plan {
    fn name(i: usize) -> String {
        format!("m{i}")
    }

    fn class(&self) -> ClassDescriptor {
        let mut class = ClassBuilder::new("P");
        for &i in &self.order {
            let deps: Vec<String> = self.deps[i].iter().map(|&d| Self::name(d)).collect();
            class = class.test_with(&Self::name(i), |m| m.with_method_dependencies(deps));
        }
        class.build()
    }

    fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.deps
            .iter()
            .enumerate()
            .flat_map(|(i, ds)| ds.iter().map(move |&d| (i, d)))
    }
}

fn plan_strategy(max_methods: usize) -> impl Strategy<Value = Plan> {
    (1..=max_methods).prop_flat_map(|n| {
        let raw = proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), n);
        let order = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
        (raw, order).prop_map(|(raw, order)| {
            let deps = raw
                .into_iter()
                .enumerate()
                .map(|(i, picks)| {
                    if i == 0 {
                        BTreeSet::new()
                    } else {
                        picks.into_iter().map(|p| p % i).collect()
                    }
                })
                .collect();
            Plan { deps, order }
        })
    })
}

fn build(plan: &Plan) -> SuiteRunner {
    SuiteRunner::builder(RunConfigBuilder::new().build(), Arc::new(NoopInvoker))
        .class(plan.class())
        .build()
        .expect("acyclic plan must build")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn registry_orders_dependencies_first(plan in plan_strategy(10)) {
        let runner = build(&plan);
        let position: HashMap<String, usize> = runner
            .registry()
            .tests()
            .iter()
            .enumerate()
            .map(|(pos, m)| (m.name().to_string(), pos))
            .collect();

        prop_assert_eq!(position.len(), plan.deps.len());
        for (dependent, dependency) in plan.edges() {
            prop_assert!(
                position[&Plan::name(dependency)] < position[&Plan::name(dependent)],
                "m{} must come before m{}", dependency, dependent
            );
        }
    }

    #[test]
    fn partition_is_deterministic_and_complete(plan in plan_strategy(10)) {
        let runner = build(&plan);
        let tests = runner.registry().tests();

        let first = partition(tests);
        let second = partition(tests);
        let ids = |ms: &[Arc<suiterunner::registry::MethodDescriptor>]| {
            ms.iter().map(|m| m.id().to_string()).collect::<Vec<_>>()
        };
        prop_assert_eq!(ids(&first.sequential), ids(&second.sequential));
        prop_assert_eq!(ids(&first.parallel), ids(&second.parallel));

        let sequential: BTreeSet<_> = ids(&first.sequential).into_iter().collect();
        let parallel: BTreeSet<_> = ids(&first.parallel).into_iter().collect();
        prop_assert!(sequential.is_disjoint(&parallel));
        prop_assert_eq!(sequential.len() + parallel.len(), tests.len());

        // Anything on either end of an edge runs on the sequential unit.
        for (dependent, dependency) in plan.edges() {
            let dependent_id = format!("P.{}", Plan::name(dependent));
            let dependency_id = format!("P.{}", Plan::name(dependency));
            prop_assert!(sequential.contains(&dependent_id));
            prop_assert!(sequential.contains(&dependency_id));
        }
    }

    #[test]
    fn failures_skip_exactly_their_dependents(
        plan in plan_strategy(8),
        failing in proptest::collection::btree_set(0..8usize, 0..3),
    ) {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        let invoker = ScriptedInvoker::new();
        for &f in failing.iter().filter(|&&f| f < plan.deps.len()) {
            invoker.fail(&format!("P.{}", Plan::name(f)), "scripted");
        }
        let runner = SuiteRunner::builder(RunConfigBuilder::new().build(), invoker.shared())
            .class(plan.class())
            .build()
            .expect("acyclic plan must build");
        let report = rt.block_on(runner.run());

        // Dependencies always have lower indices, so one forward pass settles
        // every method's expected outcome.
        let mut expected = Vec::with_capacity(plan.deps.len());
        for i in 0..plan.deps.len() {
            let outcome = if plan.deps[i].iter().any(|&d| expected[d] != MethodOutcome::Passed) {
                MethodOutcome::Skipped
            } else if failing.contains(&i) {
                MethodOutcome::Failed
            } else {
                MethodOutcome::Passed
            };
            expected.push(outcome);
        }

        for (i, want) in expected.iter().enumerate() {
            let id = format!("P.{}", Plan::name(i));
            prop_assert_eq!(report.outcome_of(&id), Some(*want), "{}", id);
        }
        for (dependent, dependency) in plan.edges() {
            let after = seqs(&report, &format!("P.{}", Plan::name(dependent)));
            let before = seqs(&report, &format!("P.{}", Plan::name(dependency)));
            if let (Some(a), Some(b)) = (after.first(), before.first()) {
                prop_assert!(b < a);
            }
        }
    }
}
