//! Console output for `--verbose` runs: spinners and the per-location summary.
//!
//! Nothing here is operational logging: that goes to syslog through
//! [`crate::logging`].  This module only makes an interactive run readable,
//! and is never called unless `--verbose` is set.

use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::trigger::{TriggerOutcome, TriggerStatus};

// ─── Icons ───────────────────────────────────────────────────────────────────

/// Braille spinner frames, same style as indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn icon_ok() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}
fn icon_err() -> console::StyledObject<&'static str> {
    style("✗").red().bold()
}
fn icon_skip() -> console::StyledObject<&'static str> {
    style("–").dim()
}
fn icon_done() -> console::StyledObject<&'static str> {
    style("✓").cyan().bold()
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Create and start an indeterminate spinner for `label`.
///
/// indicatif draws to stderr and hides itself when that is not a terminal,
/// so cron runs with `--verbose` stay free of control codes.
fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("  {spinner:.cyan}  {msg}") {
        pb.set_style(spinner_style.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Block for `duration` behind a spinner showing the time remaining.
pub fn wait_with_spinner(label: &str, duration: Duration) {
    let spinner = make_spinner(label);
    let deadline = Instant::now() + duration;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        spinner.set_message(format!(
            "{} ({}s)",
            style(label).dim(),
            remaining.as_secs() + 1
        ));
        std::thread::sleep(remaining.min(Duration::from_millis(250)));
    }

    spinner.finish_and_clear();
}

// ─── Summary ──────────────────────────────────────────────────────────────────

fn outcome_line(o: &TriggerOutcome) -> String {
    match &o.status {
        TriggerStatus::Triggered { job_id } => format!(
            "  {}  {}  {}",
            icon_ok(),
            style(&o.location).bold(),
            style(format!("job {job_id}")).dim()
        ),
        TriggerStatus::Skipped => format!(
            "  {}  {}  {}",
            icon_skip(),
            style(&o.location).bold(),
            style("disabled").dim()
        ),
        TriggerStatus::Failed { reason } => format!(
            "  {}  {}  {}",
            icon_err(),
            style(&o.location).bold(),
            style(reason).red()
        ),
    }
}

/// Print one line per processed location, then a success or failure banner.
pub fn print_summary(outcomes: &[TriggerOutcome]) {
    println!();
    for o in outcomes {
        println!("{}", outcome_line(o));
    }

    let failed: Vec<&TriggerOutcome> = outcomes.iter().filter(|o| !o.succeeded()).collect();
    println!();
    if failed.is_empty() {
        println!(
            "  {} {}",
            icon_done(),
            style("All backups triggered.").cyan().bold()
        );
    } else {
        println!(
            "  {}  {}",
            icon_err(),
            style(format!("{} of {} locations failed.", failed.len(), outcomes.len()))
                .red()
                .bold()
        );
    }
    println!();
}

// ─── Tests ────────────────────────────────────────────────────────────────────
