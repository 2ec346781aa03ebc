#![allow(dead_code)]

use suiterunner::config::{RawRunConfig, RunConfig};
use suiterunner::errors::Result;
use suiterunner::registry::{ClassDescriptor, MethodDescriptor};
use suiterunner::types::MethodKind;

/// Builder for `RunConfig` to simplify test setup.
pub struct RunConfigBuilder {
    raw: RawRunConfig,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawRunConfig::default(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.raw.run.name = name.to_string();
        self
    }

    pub fn parallel(mut self, thread_count: usize) -> Self {
        self.raw.run.parallel = true;
        self.raw.run.thread_count = thread_count;
        self
    }

    pub fn verbose(mut self, level: u8) -> Self {
        self.raw.run.verbose = level;
        self
    }

    pub fn pool_timeout_floor_ms(mut self, ms: u64) -> Self {
        self.raw.run.pool_timeout_floor_ms = ms;
        self
    }

    pub fn parameter(mut self, key: &str, value: &str) -> Self {
        self.raw
            .parameters
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn include_group(mut self, pattern: &str) -> Self {
        self.raw.groups.include.push(pattern.to_string());
        self
    }

    pub fn exclude_group(mut self, pattern: &str) -> Self {
        self.raw.groups.exclude.push(pattern.to_string());
        self
    }

    pub fn include_method(mut self, pattern: &str) -> Self {
        self.raw.groups.include_methods.push(pattern.to_string());
        self
    }

    pub fn exclude_method(mut self, pattern: &str) -> Self {
        self.raw.groups.exclude_methods.push(pattern.to_string());
        self
    }

    pub fn meta_group(mut self, name: &str, members: &[&str]) -> Self {
        self.raw.meta_groups.insert(
            name.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    pub fn try_build(self) -> Result<RunConfig> {
        RunConfig::try_from(self.raw)
    }

    pub fn build(self) -> RunConfig {
        self.try_build()
            .expect("Failed to build valid run config from builder")
    }
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ClassDescriptor`.
pub struct ClassBuilder {
    class: ClassDescriptor,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            class: ClassDescriptor::new(name),
        }
    }

    fn method(&self, name: &str, kind: MethodKind) -> MethodDescriptor {
        MethodDescriptor::new(self.class.name.clone(), name, kind)
    }

    pub fn test(self, name: &str) -> Self {
        self.test_with(name, |m| m)
    }

    /// Add a test method, customised through the descriptor's `with_*`
    /// methods.
    pub fn test_with(
        mut self,
        name: &str,
        configure: impl FnOnce(MethodDescriptor) -> MethodDescriptor,
    ) -> Self {
        let method = configure(self.method(name, MethodKind::Test));
        self.class.methods.push(method);
        self
    }

    pub fn configuration(mut self, kind: MethodKind, name: &str) -> Self {
        let method = self.method(name, kind);
        self.class.methods.push(method);
        self
    }

    pub fn before_suite(self, name: &str) -> Self {
        self.configuration(MethodKind::BeforeSuite, name)
    }

    pub fn after_suite(self, name: &str) -> Self {
        self.configuration(MethodKind::AfterSuite, name)
    }

    pub fn before_test(self, name: &str) -> Self {
        self.configuration(MethodKind::BeforeTest, name)
    }

    pub fn after_test(self, name: &str) -> Self {
        self.configuration(MethodKind::AfterTest, name)
    }

    pub fn before_class(self, name: &str) -> Self {
        self.configuration(MethodKind::BeforeClass, name)
    }

    pub fn after_class(self, name: &str) -> Self {
        self.configuration(MethodKind::AfterClass, name)
    }

    pub fn before_groups(mut self, name: &str, groups: &[&str]) -> Self {
        let method = self
            .method(name, MethodKind::BeforeGroup)
            .with_groups(groups.iter().copied());
        self.class.methods.push(method);
        self
    }

    pub fn after_groups(mut self, name: &str, groups: &[&str]) -> Self {
        let method = self
            .method(name, MethodKind::AfterGroup)
            .with_groups(groups.iter().copied());
        self.class.methods.push(method);
        self
    }

    pub fn build(self) -> ClassDescriptor {
        self.class
    }
}
