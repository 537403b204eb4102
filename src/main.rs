//! `run-backup`: trigger Rackspace Cloud Backup jobs from a YAML config.
//!
//! # Overview
//!
//! A one-shot tool meant to be run from cron.  Each invocation:
//!
//! 1. loads `/etc/driveclient/run_backup.conf.yaml` (or `--conffile`),
//! 2. authenticates against the identity API,
//! 3. wakes the backup agents and waits for them to settle,
//! 4. asks the backup API to start a manual backup for every enabled location.
//!
//! # Usage
//!
//! ```text
//! run-backup                        # trigger every configured location
//! run-backup --location web01       # trigger a single location
//! run-backup --wakedelay 60         # wait longer for agents to check in
//! run-backup --print-config         # show parsed config, touch nothing
//! run-backup -v                     # trace HTTP traffic to stdout
//! ```
//!
//! # Exit codes
//!
//! `0` success, `1` config/argument failure, `2` authentication failure,
//! `3` backup API failure.  See [`error::RunError`].
//!
//! # Module layout
//!
//! | Module                   | Responsibility                              |
//! |--------------------------|---------------------------------------------|
//! | [`cli`]                  | Argument types parsed by clap               |
//! | [`config`]               | `Config` struct + YAML loader               |
//! | [`api`]                  | URL and request body builders               |
//! | [`transport`]            | Per-run HTTP client                         |
//! | [`auth`]                 | Token + endpoint discovery                  |
//! | [`wake`]                 | Agent wake-up with retry                    |
//! | [`trigger`]              | Per-location backup trigger                 |
//! | [`commands::run`]        | The pipeline                                |
//! | [`error`]                | Run errors → exit codes                     |
//! | [`logging`]              | syslog + verbose console logging            |
//! | [`ui`]                   | Spinner and summary for verbose runs        |

mod api;
mod auth;
mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod transport;
mod trigger;
mod ui;
mod wake;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use error::RunError;
use tracing::error;
use transport::{ClientOptions, HttpClient};
use wake::ThreadSleeper;

fn main() -> ExitCode {
    // clap's own error exit code (2) would read as an auth failure.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        },
    };

    logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Pipeline stages log their own failures where they happen.
            if matches!(
                e,
                RunError::Config(_) | RunError::UnknownLocation(_) | RunError::Client(_)
            ) {
                error!("{}", error_chain(&e));
            }
            ExitCode::from(&e)
        },
    }
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let cfg = config::load_config(&cli.conffile)?;

    if cli.print_config {
        println!("{cfg:#?}");
        return Ok(());
    }
    if cli.verbose {
        println!("Config:\n{cfg:#?}\n");
    }

    let client = HttpClient::new(&ClientOptions {
        timeout: cli.request_timeout(),
    })
    .map_err(RunError::Client)?;
    let sleeper = ThreadSleeper {
        spinner: cli.verbose,
    };

    commands::run::run(cli, &cfg, &client, &sleeper)?;
    Ok(())
}

/// `outer: inner: root`, keeping the io/yaml cause next to "failed to read".
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
