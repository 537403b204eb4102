//! Starting a backup for one configured location.
//!
//! A trigger is attempted exactly once; a failure is logged and reported
//! back so the caller can carry on with the remaining locations.

use tracing::{debug, error, info};

use crate::{api, auth::TokenData, config::LocationConfig, transport::Transport};

/// What happened when a location was processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerStatus {
    /// The backup API accepted the request; carries the returned job id.
    Triggered { job_id: String },
    /// The location is disabled and no request was made.
    Skipped,
    /// Non-200 response or no response at all.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOutcome {
    pub location: String,
    pub status: TriggerStatus,
}

impl TriggerOutcome {
    /// Skipped counts as success.
    pub const fn succeeded(&self) -> bool {
        !matches!(self.status, TriggerStatus::Failed { .. })
    }
}

/// Ask the backup API to start a manual backup of `location`.
pub fn trigger_backup(
    transport: &dyn Transport,
    key: &str,
    location: &LocationConfig,
    token: &TokenData,
) -> TriggerOutcome {
    let status = if location.enabled {
        request_backup(transport, key, location, token)
    } else {
        debug!("Skipping disabled location {key}");
        TriggerStatus::Skipped
    };

    TriggerOutcome {
        location: key.to_string(),
        status,
    }
}

fn request_backup(
    transport: &dyn Transport,
    key: &str,
    location: &LocationConfig,
    token: &TokenData,
) -> TriggerStatus {
    let id = &location.backup_configuration_id;
    let resp = transport.post(
        &api::action_requested_url(&token.api_url),
        Some(&token.token),
        Some(&api::start_manual_body(id)),
    );

    let reason = match resp {
        Ok(resp) if resp.is_ok() => {
            let job_id = resp.body.trim().to_string();
            info!("Triggered backup for {key}, Backup job ID: {job_id}");
            return TriggerStatus::Triggered { job_id };
        },
        Ok(resp) => format!("status code: {}", resp.status),
        Err(e) => format!("{e:#}"),
    };

    error!("Error triggering backup for {key} with BackupConfigurationId {id}, {reason}");
    TriggerStatus::Failed { reason }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
