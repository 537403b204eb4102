//! Request construction helpers for the identity and backup APIs.
//!
//! This module is responsible for *building* URLs and JSON bodies.  It
//! deliberately does **not** send anything (HTTP lives in
//! [`crate::transport`]), so every function here is pure and trivially
//! unit-testable without a server.
//!
//! Base URLs come from user input (`--identityurl`) or the service catalog
//! and may or may not carry a trailing slash; [`join`] normalises that.

use serde_json::{Value, json};

use crate::config::{AuthenticationConfig, BackupConfigurationId};

/// Name of the backup service in the identity service catalog.
pub const BACKUP_SERVICE_NAME: &str = "cloudBackup";

fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

// ─── Identity API ─────────────────────────────────────────────────────────────

/// `POST {identity}/v2.0/tokens`
pub fn tokens_url(identity_url: &str) -> String {
    join(identity_url, "v2.0/tokens")
}

/// API-key credentials body for the v2.0 tokens call.
pub fn auth_body(auth: &AuthenticationConfig) -> Value {
    json!({
        "auth": {
            "RAX-KSKEY:apiKeyCredentials": {
                "username": auth.apiuser,
                "apiKey": auth.apikey,
            }
        }
    })
}

// ─── Backup API ───────────────────────────────────────────────────────────────

/// `POST {api}/user/wakeupagents`
pub fn wakeup_url(api_url: &str) -> String {
    join(api_url, "user/wakeupagents")
}

/// `POST {api}/backup/action-requested/`; the trailing slash is significant.
pub fn action_requested_url(api_url: &str) -> String {
    join(api_url, "backup/action-requested/")
}

/// Body asking the backup API to start a manual run of `id`.
pub fn start_manual_body(id: &BackupConfigurationId) -> Value {
    json!({ "Action": "StartManual", "Id": id })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
