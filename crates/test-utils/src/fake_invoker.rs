use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use suiterunner::exec::{
    InvocationFuture, InvocationOutcome, InvocationRequest, MethodInvoker, SkipCondition,
};
use tracing::debug;

/// One recorded call.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    pub invocation: usize,
    pub row: usize,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
struct Script {
    fail: Option<String>,
    fail_invocations: HashSet<usize>,
    skip: Option<SkipCondition>,
    delay: Option<Duration>,
    panic: bool,
}

#[derive(Default)]
struct Inner {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// A fake invoker that:
/// - records every call in order
/// - passes every method unless a script says otherwise.
///
/// Clones share state, so a test keeps one handle for assertions and hands
/// [`ScriptedInvoker::shared`] to the runner.
#[derive(Clone, Default)]
pub struct ScriptedInvoker {
    inner: Arc<Inner>,
}

struct InFlight(Arc<Inner>);

impl InFlight {
    fn enter(inner: Arc<Inner>) -> Self {
        let now = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(inner)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> Arc<dyn MethodInvoker> {
        Arc::new(self.clone())
    }

    fn script(&self, method: &str, edit: impl FnOnce(&mut Script)) -> &Self {
        let mut scripts = self.inner.scripts.lock().unwrap();
        edit(scripts.entry(method.to_string()).or_default());
        self
    }

    /// Fail every invocation of `method`.
    pub fn fail(&self, method: &str, message: &str) -> &Self {
        self.script(method, |s| s.fail = Some(message.to_string()))
    }

    /// Fail only the listed invocation ordinals of `method`.
    pub fn fail_invocations(&self, method: &str, invocations: impl IntoIterator<Item = usize>) -> &Self {
        self.script(method, |s| s.fail_invocations.extend(invocations))
    }

    pub fn skip(&self, method: &str, condition: SkipCondition) -> &Self {
        self.script(method, |s| s.skip = Some(condition))
    }

    pub fn delay(&self, method: &str, delay: Duration) -> &Self {
        self.script(method, |s| s.delay = Some(delay))
    }

    pub fn panic(&self, method: &str) -> &Self {
        self.script(method, |s| s.panic = true)
    }

    pub fn call_log(&self) -> Vec<Call> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Method ids in call order.
    pub fn calls(&self) -> Vec<String> {
        self.call_log().into_iter().map(|c| c.method).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.call_log().iter().filter(|c| c.method == method).count()
    }

    /// Largest number of invocations observed in flight at once.
    pub fn max_concurrency(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }
}

impl MethodInvoker for ScriptedInvoker {
    fn invoke(&self, request: InvocationRequest) -> InvocationFuture {
        let id = request.method.id().to_string();
        debug!(method = %id, invocation = request.invocation, "scripted invocation");

        self.inner.calls.lock().unwrap().push(Call {
            method: id.clone(),
            invocation: request.invocation,
            row: request.row,
            parameters: (*request.parameters).clone(),
        });

        let script = self
            .inner
            .scripts
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default();
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            let _in_flight = InFlight::enter(inner);
            if let Some(delay) = script.delay {
                tokio::time::sleep(delay).await;
            }
            if script.panic {
                panic!("scripted panic in {id}");
            }
            if let Some(condition) = script.skip {
                return InvocationOutcome::Skip(condition);
            }
            if let Some(message) = script.fail {
                return InvocationOutcome::Failure(message);
            }
            if script.fail_invocations.contains(&request.invocation) {
                return InvocationOutcome::Failure(format!(
                    "scripted failure of {id} #{}",
                    request.invocation
                ));
            }
            InvocationOutcome::Success
        })
    }
}
