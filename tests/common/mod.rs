#![allow(dead_code)]

pub use suiterunner_test_utils::builders;
pub use suiterunner_test_utils::fake_invoker;
pub use suiterunner_test_utils::init_tracing;

use suiterunner::results::RunReport;

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Sequence number of every audit entry for `method`.
pub fn seqs(report: &RunReport, method: &str) -> Vec<u64> {
    report.invocations_of(method).map(|i| i.seq).collect()
}
