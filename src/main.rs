//! nscm - git wrapper that writes the commit message when you leave it empty.

use std::ffi::OsString;
use std::io;
use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

use nscm::config;
use nscm::dispatch::{Dispatcher, report};
use nscm::error::NscmError;
use nscm::git::GitCli;

/// Tracing filter for nscm's own diagnostics.
const LOG_ENV_VAR: &str = "NSCM_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout belongs to git and the generated message
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn run(args: Vec<OsString>) -> i32 {
    let git_timeout = config::git_timeout(|key| std::env::var(key).ok());

    let git = match GitCli::discover(git_timeout) {
        Ok(git) => git,
        Err(e) => {
            let err = NscmError::from(e);
            report(&err);
            return err.exit_code();
        }
    };

    let dispatcher = Dispatcher::new(git);
    let task = tokio::spawn(async move { dispatcher.run(&args, interrupted()).await });

    match task.await {
        Ok(outcome) => outcome.exit_code,
        Err(e) => {
            debug!("Dispatch task failed: {}", e);
            let err = NscmError::Fatal("dispatch aborted".to_string());
            report(&err);
            err.exit_code()
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    // Panics surface as a Fatal line, not a backtrace
    std::panic::set_hook(Box::new(|info| debug!("{}", info)));

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let err = NscmError::Fatal(e.to_string());
            report(&err);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(args));
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
