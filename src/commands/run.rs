//! The backup trigger pipeline.
//!
//! # Pipeline stages (in order)
//!
//! | # | Stage        | On failure                          |
//! |---|--------------|-------------------------------------|
//! | 1 | Validate     | exit 1, no network activity         |
//! | 2 | Authenticate | exit 2                              |
//! | 3 | Wake agents  | exit 3, nothing is triggered        |
//! | 4 | Trigger      | keep going, exit 3 at the end       |
//!
//! Without `--location` every configured location is triggered exactly once,
//! in key order, and one failure never stops the others.

use tracing::{info, warn};

use crate::{
    auth::authenticate,
    cli::Cli,
    config::Config,
    error::RunError,
    transport::Transport,
    trigger::{TriggerOutcome, trigger_backup},
    wake::{Sleeper, WakePolicy, wake_agents},
};

// ─── Entry point ──────────────────────────────────────────────────────────────

/// Execute the full pipeline against `transport`.
///
/// Returns the per-location outcomes when every triggered location
/// succeeded (skipped ones included).
pub fn run(
    cli: &Cli,
    cfg: &Config,
    transport: &dyn Transport,
    sleeper: &dyn Sleeper,
) -> Result<Vec<TriggerOutcome>, RunError> {
    // 1. Validate
    let selected = select_locations(cli, cfg)?;

    // 2. Authenticate
    let token = authenticate(transport, cfg, &cli.identityurl)?;

    // 3. Wake agents
    let policy = WakePolicy::with_settle_delay(cli.wake_delay());
    wake_agents(transport, &token, &policy, sleeper)?;

    // 4. Trigger
    let mut outcomes = Vec::with_capacity(selected.len());
    for key in selected {
        if let Some(location) = cfg.location(key) {
            outcomes.push(trigger_backup(transport, key, location, &token));
        }
    }

    let failed: Vec<String> = outcomes
        .iter()
        .filter(|o| !o.succeeded())
        .map(|o| o.location.clone())
        .collect();

    if cli.verbose {
        crate::ui::print_summary(&outcomes);
    }

    if failed.is_empty() {
        info!(locations = outcomes.len(), "Backup run complete");
        Ok(outcomes)
    } else {
        Err(RunError::TriggerFailed { failed })
    }
}

/// Keys of the locations this run will process.
///
/// Checked before authenticating so a typo in `--location` never wakes
/// anybody's agents.
fn select_locations<'a>(cli: &'a Cli, cfg: &'a Config) -> Result<Vec<&'a str>, RunError> {
    if !cfg.has_locations() {
        warn!("{}", RunError::NoLocations);
        return Err(RunError::NoLocations);
    }

    match &cli.location {
        Some(key) if cfg.location(key).is_some() => Ok(vec![key.as_str()]),
        Some(key) => Err(RunError::UnknownLocation(key.clone())),
        None => Ok(cfg.locations().map(|(key, _)| key.as_str()).collect()),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
