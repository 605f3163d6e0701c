// src/main.rs

use procrun::errors::RunnerError;
use procrun::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("procrun error: {err:?}");
        std::process::exit(exit_code(&err));
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}

/// Mirror the child's exit code when it failed with one.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<RunnerError>() {
        Some(RunnerError::ProcessExit(exit)) => exit.code().filter(|c| *c != 0).unwrap_or(1),
        _ => 1,
    }
}
