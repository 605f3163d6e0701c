pub mod builders;
pub mod fake_resolver;
pub mod sinks;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use procrun::logging::{LOG_ENV, filter_directives};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for anything a test waits on: child processes, waiters.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test subscriber once per test binary.
///
/// Uses the same filter rules as the binary, so `PROCRUN_LOG=debug cargo test`
/// shows runner internals. Output is captured and printed for failing tests
/// only (unless `--nocapture`).
pub fn init_tracing() {
    INIT.call_once(|| {
        let env = std::env::var(LOG_ENV).ok();
        let filter = EnvFilter::try_new(filter_directives(None, env.as_deref()))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it outlives [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test timed out after {TEST_TIMEOUT:?}"))
}
