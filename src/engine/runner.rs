// src/engine/runner.rs

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::dag::{partition, Partition};
use crate::engine::classes::ClassCoordinator;
use crate::engine::groups::GroupCoordinator;
use crate::engine::listener::{RunContext, RunListener};
use crate::engine::pool::{pool_deadline, run_parallel, run_sequential};
use crate::engine::unit::{ExecutionUnit, UnitContext};
use crate::errors::Result;
use crate::exec::{ConfigOutcome, Dispatcher, MethodInvoker};
use crate::registry::{
    ClassDescriptor, GroupSelector, MethodRegistry, MethodSelector, SelectorChain,
    GROUP_SELECTOR_PRIORITY,
};
use crate::results::{AuditLog, ResultLedger, RunReport};
use crate::types::FailureKind;

/// Collects classes, selectors and listeners for a [`SuiteRunner`].
pub struct SuiteRunnerBuilder {
    config: RunConfig,
    invoker: Arc<dyn MethodInvoker>,
    classes: Vec<ClassDescriptor>,
    selectors: Vec<(i32, Box<dyn MethodSelector>)>,
    listeners: Vec<Arc<dyn RunListener>>,
}

impl SuiteRunnerBuilder {
    pub fn new(config: RunConfig, invoker: Arc<dyn MethodInvoker>) -> Self {
        Self {
            config,
            invoker,
            classes: Vec::new(),
            selectors: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn class(mut self, class: ClassDescriptor) -> Self {
        self.classes.push(class);
        self
    }

    pub fn classes(mut self, classes: impl IntoIterator<Item = ClassDescriptor>) -> Self {
        self.classes.extend(classes);
        self
    }

    /// Add a selector. Lower priorities are consulted first; the built-in
    /// group selector sits at [`GROUP_SELECTOR_PRIORITY`].
    pub fn selector(mut self, priority: i32, selector: impl MethodSelector + 'static) -> Self {
        self.selectors.push((priority, Box::new(selector)));
        self
    }

    pub fn listener(mut self, listener: Arc<dyn RunListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Build the method graph. Any error here means the run must not start.
    pub fn build(self) -> Result<SuiteRunner> {
        let mut chain = SelectorChain::new();
        chain.add(
            Box::new(GroupSelector::from_config(&self.config)?),
            GROUP_SELECTOR_PRIORITY,
        );
        for (priority, selector) in self.selectors {
            chain.add(selector, priority);
        }

        let registry = MethodRegistry::build(&self.config, self.classes, &chain)?;
        let partition = partition(registry.tests());

        if self.config.run.verbose >= 2 {
            let sequential: Vec<_> = partition.sequential.iter().map(|m| m.id()).collect();
            let parallel: Vec<_> = partition.parallel.iter().map(|m| m.id()).collect();
            info!(?sequential, ?parallel, "execution plan");
        }

        Ok(SuiteRunner {
            config: self.config,
            registry,
            partition,
            invoker: self.invoker,
            listeners: self.listeners,
        })
    }
}

/// A fully resolved run, ready to execute.
pub struct SuiteRunner {
    config: RunConfig,
    registry: MethodRegistry,
    partition: Partition,
    invoker: Arc<dyn MethodInvoker>,
    listeners: Vec<Arc<dyn RunListener>>,
}

impl fmt::Debug for SuiteRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("config", &self.config)
            .field("partition", &self.partition)
            .finish_non_exhaustive()
    }
}

impl SuiteRunner {
    pub fn builder(config: RunConfig, invoker: Arc<dyn MethodInvoker>) -> SuiteRunnerBuilder {
        SuiteRunnerBuilder::new(config, invoker)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// One unit for the whole sequential list, then one per parallel method.
    pub fn units(&self) -> Vec<Arc<ExecutionUnit>> {
        let mut units = Vec::with_capacity(self.partition.parallel.len() + 1);
        if !self.partition.sequential.is_empty() {
            units.push(Arc::new(ExecutionUnit::sequential(
                0,
                self.partition.sequential.clone(),
            )));
        }
        for method in &self.partition.parallel {
            units.push(Arc::new(ExecutionUnit::single(units.len(), Arc::clone(method))));
        }
        units
    }

    /// Execute the run. Never fails: every problem ends up in the report.
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        let ledger = Arc::new(ResultLedger::new());
        for excluded in self.registry.excluded() {
            ledger.record_excluded(excluded.clone());
        }
        let audit = Arc::new(AuditLog::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.invoker),
            Arc::clone(&ledger),
            Arc::clone(&audit),
            Arc::new(self.config.parameters.clone()),
        );

        let context = RunContext {
            name: self.config.run.name.clone(),
            started_at,
            parallel: self.config.run.parallel,
            thread_count: self.config.run.thread_count,
            parameters: self.config.parameters.clone(),
            scheduled: self.partition.len(),
            excluded: self.registry.excluded().len(),
        };
        for listener in &self.listeners {
            listener.on_start(&context);
        }
        info!(
            run = %context.name,
            parallel = context.parallel,
            scheduled = context.scheduled,
            excluded = context.excluded,
            "run started"
        );

        let units = self.units();
        let mut deadline = None;

        let suite = dispatcher.run_configuration(self.registry.before_suite()).await;
        let setup = match &suite {
            ConfigOutcome::Passed => {
                dispatcher
                    .run_configuration(self.registry.before_test())
                    .await
            }
            ConfigOutcome::Failed { method, .. } => {
                dispatcher.skip_configuration(
                    self.registry.before_test(),
                    &format!("configuration method '{method}' failed"),
                );
                suite.clone()
            }
        };

        match &setup {
            ConfigOutcome::Passed => {
                let ctx = Arc::new(UnitContext {
                    dispatcher: dispatcher.clone(),
                    classes: ClassCoordinator::new(&self.registry, self.registry.tests()),
                    groups: GroupCoordinator::new(
                        self.registry.group_methods(),
                        self.registry.tests(),
                    ),
                    graph: self.registry.graph().clone(),
                });

                if self.config.run.parallel {
                    let bound = pool_deadline(&units, self.config.pool_timeout_floor());
                    deadline = Some(bound);
                    run_parallel(&units, ctx, self.config.run.thread_count, bound).await;
                } else {
                    run_sequential(&units, &ctx).await;
                }

                dispatcher
                    .run_configuration(self.registry.after_test())
                    .await;
            }
            ConfigOutcome::Failed { method, .. } => {
                warn!(method = %method, "run setup failed; skipping every test method");
                let message = format!("configuration method '{method}' failed");
                for test in self.registry.tests() {
                    dispatcher.skip_test(test, FailureKind::ConfigurationFailure, message.clone());
                }
                dispatcher.skip_configuration(self.registry.after_test(), &message);
            }
        }

        match &suite {
            ConfigOutcome::Passed => {
                dispatcher
                    .run_configuration(self.registry.after_suite())
                    .await;
            }
            ConfigOutcome::Failed { method, .. } => {
                dispatcher.skip_configuration(
                    self.registry.after_suite(),
                    &format!("configuration method '{method}' failed"),
                );
            }
        }

        let report = RunReport::collect(
            &self.config.run.name,
            started_at,
            &ledger,
            &audit,
            units.iter().map(|u| u.summary()).collect(),
            deadline,
        );

        if self.config.run.verbose >= 3 {
            for entry in &report.invoked {
                info!(
                    seq = entry.seq,
                    method = %entry.method,
                    kind = %entry.kind,
                    invocation = entry.invocation,
                    at = %entry.at,
                    "invoked"
                );
            }
        }

        info!(summary = %report, "run finished");
        for listener in &self.listeners {
            listener.on_finish(&report);
        }
        debug!(listeners = self.listeners.len(), "listeners notified");

        report
    }
}
