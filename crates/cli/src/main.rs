// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sisyphus - run a command as a supervised job

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod args;
mod shell;

use anyhow::{anyhow, Result};
use args::Cli;
use clap::Parser;
use shell::ShellJob;
use sisyphus_core::{JobRunner, RunError, RunStatus};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing();

    match run(&cli) {
        Ok(status) => {
            tracing::debug!(?status, "run finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = match err.downcast_ref::<RunError>() {
                Some(run_err) => {
                    // A failed worker already reported itself
                    if !matches!(
                        run_err,
                        RunError::Supervisor(sisyphus_core::SupervisorError::WorkerFailed { .. })
                    ) {
                        eprintln!("sisyphus: {err:#}");
                    }
                    run_err.exit_code()
                }
                None => {
                    eprintln!("sisyphus: {err:#}");
                    1
                }
            };
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: &Cli) -> Result<RunStatus> {
    let (program, args) = cli
        .command
        .split_first()
        .ok_or_else(|| anyhow!("no command given"))?;
    let job = ShellJob::new(program.clone(), args.to_vec());

    let mut runner = JobRunner::new(job)
        .instance(cli.instance_settings()?)
        .explicit(cli.settings());
    Ok(runner.run()?)
}

fn setup_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_env("SISYPHUS_TRACE").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
