// src/engine/pool.rs

//! Running units inline or on a bounded worker pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::engine::unit::{ExecutionUnit, UnitContext};
use crate::types::UnitState;

/// Await-termination bound for the pool: the largest unit timeout, but never
/// below `floor`.
pub fn pool_deadline(units: &[Arc<ExecutionUnit>], floor: Duration) -> Duration {
    units
        .iter()
        .map(|u| u.max_timeout())
        .max()
        .unwrap_or(Duration::ZERO)
        .max(floor)
}

/// Run every unit on the current task, in order.
pub(crate) async fn run_sequential(units: &[Arc<ExecutionUnit>], ctx: &UnitContext) {
    for unit in units {
        unit.run(ctx).await;
    }
}

/// Run units with at most `thread_count` in flight.
///
/// Units still running (or not yet started) when the deadline passes are
/// cancelled and marked `TimedOut`; their methods without any result get a
/// timeout failure. Results already recorded are kept.
pub(crate) async fn run_parallel(
    units: &[Arc<ExecutionUnit>],
    ctx: Arc<UnitContext>,
    thread_count: usize,
    deadline: Duration,
) {
    let permits = Arc::new(Semaphore::new(thread_count.clamp(1, Semaphore::MAX_PERMITS)));
    let mut set = JoinSet::new();

    for unit in units {
        let unit = Arc::clone(unit);
        let ctx = Arc::clone(&ctx);
        let permits = Arc::clone(&permits);
        set.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            unit.run(&ctx).await;
        });
    }

    info!(
        units = units.len(),
        thread_count,
        deadline_ms = deadline.as_millis() as u64,
        "waiting for worker pool"
    );

    let drained = tokio::time::timeout(deadline, async {
        while let Some(joined) = set.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "worker ended abnormally");
            }
        }
    })
    .await;

    if drained.is_err() {
        warn!(
            deadline_ms = deadline.as_millis() as u64,
            "worker pool deadline passed; cancelling outstanding units"
        );
        set.shutdown().await;

        let message = format!(
            "run did not finish within the pool time-out of {}ms",
            deadline.as_millis()
        );
        for unit in units.iter().filter(|u| !u.state().is_terminal()) {
            unit.set_state(UnitState::TimedOut);
            for method in unit.methods() {
                ctx.dispatcher.fail_unfinished(method, &message);
            }
        }
        return;
    }

    // A worker that panicked outside any invocation never reached a final
    // state.
    for unit in units.iter().filter(|u| !u.state().is_terminal()) {
        unit.set_state(UnitState::Failed);
    }
}
