//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the pipeline.

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name    = "run-backup",
    about   = "Triggers Rackspace Cloud Backup jobs",
    version,
    // Show a compact two-column help layout.
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// YAML configuration file to load.
    #[arg(long, default_value = "/etc/driveclient/run_backup.conf.yaml")]
    pub conffile: PathBuf,

    /// Number of seconds to wait after waking agents (delay required).
    ///
    /// The backup API only accepts actions once woken agents have had time
    /// to check in, so this cannot be set below one second.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub wakedelay: u64,

    /// Rackspace Identity API URL.
    #[arg(long, default_value = "https://identity.api.rackspacecloud.com")]
    pub identityurl: String,

    /// Trace HTTP traffic and dump the parsed config to stdout.
    ///
    /// The decoded identity response is printed in full, so do not leave
    /// this on in cron jobs whose output is mailed or archived.
    #[arg(short, long)]
    pub verbose: bool,

    /// Back up a single configured location instead of all of them.
    #[arg(long)]
    pub location: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Print the parsed configuration and exit without contacting any API.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    pub const fn wake_delay(&self) -> Duration {
        Duration::from_secs(self.wakedelay)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
