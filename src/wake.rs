//! Waking backup agents.
//!
//! The backup API refuses actions for agents that are asleep, so every run
//! wakes them first and then waits for them to check in.  Unlike a single
//! location's trigger, a failed wake-up aborts the whole run.
//!
//! Sleeping goes through the [`Sleeper`] trait so tests can observe every
//! delay without actually waiting.

use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{api, auth::TokenData, transport::Transport, ui};

/// Retry and settle timings for the wake-up call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakePolicy {
    /// Extra attempts after the first one fails.
    pub retries: u32,
    /// Pause between two attempts.
    pub retry_delay: Duration,
    /// Pause after a successful wake-up, before any backup is triggered.
    pub settle_delay: Duration,
}

impl WakePolicy {
    pub const DEFAULT_RETRIES: u32 = 3;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(7);

    pub const fn with_settle_delay(settle_delay: Duration) -> Self {
        Self {
            retries: Self::DEFAULT_RETRIES,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
            settle_delay,
        }
    }
}

#[derive(Debug, Error)]
#[error("error waking up agents - failed after {attempts} attempts: {last}")]
pub struct WakeError {
    pub attempts: u32,
    pub last: String,
}

// ─── Sleeping ─────────────────────────────────────────────────────────────────

/// Blocking pause.  `label` describes what is being waited for.
pub trait Sleeper {
    fn sleep(&self, label: &str, duration: Duration);
}

/// Sleeps the current thread, optionally behind a console spinner.
#[derive(Debug, Clone, Copy)]
pub struct ThreadSleeper {
    pub spinner: bool,
}

impl Sleeper for ThreadSleeper {
    fn sleep(&self, label: &str, duration: Duration) {
        if self.spinner {
            ui::wait_with_spinner(label, duration);
        } else {
            std::thread::sleep(duration);
        }
    }
}

// ─── Wake-up ──────────────────────────────────────────────────────────────────

/// POST `{api}/user/wakeupagents` until it answers 200, then let the agents
/// settle.
///
/// At most `policy.retries + 1` requests are made.  The settle delay is only
/// observed after a successful wake-up.
pub fn wake_agents(
    transport: &dyn Transport,
    token: &TokenData,
    policy: &WakePolicy,
    sleeper: &dyn Sleeper,
) -> Result<(), WakeError> {
    let url = api::wakeup_url(&token.api_url);
    let attempts = policy.retries + 1;
    let mut last = String::new();

    for attempt in 1..=attempts {
        match transport.post(&url, Some(&token.token), None) {
            Ok(resp) if resp.is_ok() => {
                info!(attempt, "Woke up agents");
                sleeper.sleep("Waiting for agents to settle", policy.settle_delay);
                return Ok(());
            },
            Ok(resp) => last = format!("status code: {}", resp.status),
            Err(e) => last = format!("{e:#}"),
        }

        warn!("Error waking up agents - {last} - attempt {attempt}");
        if attempt < attempts {
            sleeper.sleep("Retrying agent wake-up", policy.retry_delay);
        }
    }

    let err = WakeError { attempts, last };
    error!("{err}");
    Err(err)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::transport::fake::FakeTransport;

    const API: &str = "https://dfw.backup/v1.0/1";
    const WAKE: &str = "https://dfw.backup/v1.0/1/user/wakeupagents";

    /// Records every requested pause instead of sleeping.
    #[derive(Default)]
    pub struct RecordingSleeper {
        pub pauses: RefCell<Vec<(String, Duration)>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, label: &str, duration: Duration) {
            self.pauses.borrow_mut().push((label.into(), duration));
        }
    }

    impl RecordingSleeper {
        pub fn durations(&self) -> Vec<Duration> {
            self.pauses.borrow().iter().map(|(_, d)| *d).collect()
        }
    }

    fn token() -> TokenData {
        TokenData {
            token: "tok".into(),
            api_url: API.into(),
        }
    }

    fn policy() -> WakePolicy {
        WakePolicy::with_settle_delay(Duration::from_secs(30))
    }

    #[test]
    fn default_policy_matches_documented_timings() {
        let p = policy();
        assert_eq!(p.retries, 3);
        assert_eq!(p.retry_delay, Duration::from_secs(7));
        assert_eq!(p.settle_delay, Duration::from_secs(30));
    }

    #[test]
    fn first_success_settles_without_retrying() {
        let t = FakeTransport::new().reply(WAKE, 200, "");
        let s = RecordingSleeper::default();

        wake_agents(&t, &token(), &policy(), &s).unwrap();

        assert_eq!(t.calls_to(WAKE), 1);
        assert_eq!(s.durations(), vec![Duration::from_secs(30)]);
    }

    #[test]
    fn sends_token_and_empty_body() {
        let t = FakeTransport::new().reply(WAKE, 200, "");
        wake_agents(&t, &token(), &policy(), &RecordingSleeper::default()).unwrap();

        let call = &t.calls()[0];
        assert_eq!(call.token.as_deref(), Some("tok"));
        assert!(call.body.is_none());
    }

    #[test]
    fn retries_until_success() {
        let t = FakeTransport::new()
            .reply(WAKE, 503, "")
            .unreachable(WAKE)
            .reply(WAKE, 200, "");
        let s = RecordingSleeper::default();

        wake_agents(&t, &token(), &policy(), &s).unwrap();

        assert_eq!(t.calls_to(WAKE), 3);
        assert_eq!(s.durations(), vec![
            Duration::from_secs(7),
            Duration::from_secs(7),
            Duration::from_secs(30),
        ]);
    }

    #[test]
    fn gives_up_after_retries_plus_one_attempts() {
        let t = FakeTransport::new().reply(WAKE, 500, "");
        let s = RecordingSleeper::default();

        let err = wake_agents(&t, &token(), &policy(), &s).unwrap_err();

        assert_eq!(err.attempts, 4);
        assert!(err.last.contains("500"));
        assert_eq!(t.calls_to(WAKE), 4);
        // Three retry pauses and no settle delay.
        assert_eq!(s.durations(), vec![Duration::from_secs(7); 3]);
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let t = FakeTransport::new().unreachable(WAKE);
        let s = RecordingSleeper::default();
        let p = WakePolicy {
            retries: 0,
            ..policy()
        };

        assert!(wake_agents(&t, &token(), &p, &s).is_err());
        assert_eq!(t.calls_to(WAKE), 1);
        assert!(s.durations().is_empty());
    }
}
