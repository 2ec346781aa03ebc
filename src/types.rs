use std::fmt;

/// Canonical method identity used throughout the crate: `"<class>.<method>"`.
pub type MethodId = String;

/// Name of a test class as reported by the discovery layer.
pub type ClassName = String;

/// What role a discovered method plays in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MethodKind {
    BeforeSuite,
    AfterSuite,
    BeforeTest,
    AfterTest,
    BeforeClass,
    AfterClass,
    BeforeGroup,
    AfterGroup,
    Test,
}

impl MethodKind {
    pub fn is_test(self) -> bool {
        matches!(self, MethodKind::Test)
    }

    pub fn is_configuration(self) -> bool {
        !self.is_test()
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MethodKind::BeforeSuite => "before-suite",
            MethodKind::AfterSuite => "after-suite",
            MethodKind::BeforeTest => "before-test",
            MethodKind::AfterTest => "after-test",
            MethodKind::BeforeClass => "before-class",
            MethodKind::AfterClass => "after-class",
            MethodKind::BeforeGroup => "before-group",
            MethodKind::AfterGroup => "after-group",
            MethodKind::Test => "test",
        };
        f.write_str(s)
    }
}

/// Ledger bucket an invocation result lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultStatus {
    Passed,
    Failed,
    /// Failed invocation of a repeated method whose aggregate still met its
    /// success percentage.
    FailedWithinSuccessPercentage,
    Skipped,
}

/// Why an invocation did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A method or group this method depends on did not pass.
    DependencyUnsatisfied,
    /// A before-suite/test/class/group method in scope failed.
    ConfigurationFailure,
    /// The invocation (or the whole pool) ran past its deadline.
    Timeout,
    /// The invoked method reported a failure or panicked.
    Invocation,
    /// The method asked to be skipped.
    SkipRequested,
    /// A time-bombed skip whose expiry date has passed.
    SkipExpired,
}

/// Why a method never made it into the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclusionReason {
    Disabled,
    Selector,
    MissingDependency,
}

/// Aggregate outcome of one method across all of its invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodOutcome {
    Passed,
    PassedWithFailures,
    Failed,
    Skipped,
}

impl MethodOutcome {
    /// Whether dependents of a method with this outcome may run.
    pub fn satisfies_dependents(self) -> bool {
        matches!(self, MethodOutcome::Passed | MethodOutcome::PassedWithFailures)
    }
}

/// Lifecycle of one execution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Running,
    Completed,
    Failed,
    TimedOut,
}

impl UnitState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UnitState::Completed | UnitState::Failed | UnitState::TimedOut
        )
    }
}
