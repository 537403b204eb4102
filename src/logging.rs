//! Operational logging.
//!
//! Every message worth keeping goes to the local syslog daemon with a fixed
//! `run_backup: <LEVEL>: ` prefix, because the tool normally runs from cron
//! where nobody reads stdout.  `--verbose` adds a human-oriented console
//! layer on stdout at DEBUG, which is where request tracing and the decoded
//! identity response show up.
//!
//! Messages are emitted with `tracing`; the syslog side is a plain
//! `tracing_subscriber::fmt` layer whose writer forwards each formatted event
//! to syslog at the matching severity.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use syslog::{Facility, Formatter3164, Logger, LoggerBackend};
use tracing::{Level, Metadata};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt::MakeWriter, layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Prefix on every syslog line; also the syslog process name.
pub const LOG_PREFIX: &str = "run_backup";

type SyslogLogger = Logger<LoggerBackend, Formatter3164>;

/// Where formatted syslog-layer lines end up.
#[derive(Clone)]
enum Sink {
    Syslog(Arc<Mutex<SyslogLogger>>),
    /// No reachable syslog socket (containers, some CI runners).
    Stderr,
}

/// [`MakeWriter`] handing out one [`LineWriter`] per event, tagged with the
/// event's level.
#[derive(Clone)]
pub struct SyslogMakeWriter {
    sink: Sink,
}

impl SyslogMakeWriter {
    /// Connect to the local syslog daemon, falling back to stderr.
    pub fn connect() -> Self {
        let formatter = Formatter3164 {
            facility: Facility::LOG_USER,
            hostname: None,
            process: LOG_PREFIX.into(),
            pid: std::process::id(),
        };
        let sink = match syslog::unix(formatter) {
            Ok(logger) => Sink::Syslog(Arc::new(Mutex::new(logger))),
            Err(e) => {
                eprintln!("{LOG_PREFIX}: WARNING: syslog unavailable ({e}), logging to stderr");
                Sink::Stderr
            },
        };
        Self { sink }
    }

    #[cfg(test)]
    fn stderr() -> Self {
        Self { sink: Sink::Stderr }
    }
}

impl<'a> MakeWriter<'a> for SyslogMakeWriter {
    type Writer = LineWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            sink: &self.sink,
            level: Level::INFO,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        LineWriter {
            sink: &self.sink,
            level: *meta.level(),
        }
    }
}

/// Receives one fully formatted event per `write` call.
pub struct LineWriter<'a> {
    sink: &'a Sink,
    level: Level,
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        _ => "DEBUG",
    }
}

/// `run_backup: INFO: message`
fn prefixed(level: Level, formatted: &[u8]) -> String {
    let text = String::from_utf8_lossy(formatted);
    format!("{LOG_PREFIX}: {}: {}", level_label(level), text.trim_end())
}

impl Write for LineWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = prefixed(self.level, buf);
        match self.sink {
            Sink::Syslog(logger) => {
                let mut logger = logger
                    .lock()
                    .map_err(|_| io::Error::other("syslog logger poisoned"))?;
                let sent = match self.level {
                    Level::ERROR => logger.err(line),
                    Level::WARN => logger.warning(line),
                    Level::INFO => logger.info(line),
                    _ => logger.debug(line),
                };
                sent.map_err(|e| io::Error::other(e.to_string()))?;
            },
            Sink::Stderr => writeln!(io::stderr(), "{line}")?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Install the global subscriber.  Call once, before anything logs.
pub fn init(verbose: bool) {
    let syslog_layer = tracing_subscriber::fmt::layer()
        .with_writer(SyslogMakeWriter::connect())
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let console_layer = verbose.then(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::DEBUG.into())
            .from_env_lossy();
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_target(false)
            .with_filter(filter)
    });

    // A second init (only possible in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(syslog_layer)
        .with(console_layer)
        .try_init();
}

// ─── Tests ────────────────────────────────────────────────────────────────────
