//! Run-level errors and their process exit codes.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | success                                              |
//! | 1    | generic failure: config, arguments, client setup     |
//! | 2    | authentication failure                               |
//! | 3    | backup API error: wake-up or any triggered location  |

use std::process::ExitCode;

use thiserror::Error;

use crate::{auth::AuthError, config::ConfigError, wake::WakeError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No jobs configured!")]
    NoLocations,

    #[error("location '{0}' is not configured")]
    UnknownLocation(String),

    #[error("failed to set up HTTP client: {0:#}")]
    Client(anyhow::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Wake(#[from] WakeError),

    #[error("backup trigger failed for: {}", .failed.join(", "))]
    TriggerFailed { failed: Vec<String> },
}

impl RunError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::NoLocations | Self::UnknownLocation(_) | Self::Client(_) => 1,
            Self::Auth(_) => 2,
            Self::Wake(_) | Self::TriggerFailed { .. } => 3,
        }
    }
}

impl From<&RunError> for ExitCode {
    fn from(err: &RunError) -> Self {
        Self::from(err.exit_code())
    }
}
