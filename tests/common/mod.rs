#![allow(dead_code)]

use std::time::Duration;

use procrun::exec::Runner;
use procrun::types::RunState;

pub use procrun_test_utils::{init_tracing, with_timeout};

/// Poll until the runner reports `Stopped`, without calling `wait`.
pub async fn wait_until_stopped(runner: &Runner) {
    with_timeout(async {
        while runner.state() != RunState::Stopped {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
}
