//! Identity API authentication.
//!
//! Exchanges the configured API user/key for a token and discovers the
//! region-specific backup API endpoint from the service catalog.  Every way
//! this can go wrong is an [`AuthError`]; the variants exist for the log
//! line, the caller only ever maps them to one exit code.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    api::{self, BACKUP_SERVICE_NAME},
    config::Config,
    transport::Transport,
};

/// Credentials for the rest of the run.  Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenData {
    pub token: String,
    pub api_url: String,
}

impl fmt::Debug for TokenData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenData")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("error requesting identity API data: {0:#}")]
    Transport(anyhow::Error),

    #[error("error requesting identity API data, status code: {0}")]
    Status(u16),

    #[error("error parsing auth API response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unable to locate cloudBackup in service catalog")]
    ServiceNotFound,

    #[error("unable to locate cloudBackup endpoint in service catalog for region {0}")]
    RegionNotFound(String),

    #[error("cloudBackup endpoint for region {0} has no publicURL")]
    MissingPublicUrl(String),
}

// ─── Identity response ────────────────────────────────────────────────────────
//
// Only the fields we read are modelled; serde ignores the rest.  A missing
// required field fails the whole parse, which is what we want.

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    access: Access,
}

#[derive(Debug, Deserialize)]
struct Access {
    token: Token,
    #[serde(rename = "serviceCatalog")]
    service_catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct Token {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    region: Option<String>,
    #[serde(rename = "publicURL")]
    public_url: Option<String>,
}

/// Extract the token and the backup endpoint for `region` from a decoded
/// identity response.
fn extract(body: &str, region: &str) -> Result<TokenData, AuthError> {
    let resp: IdentityResponse = serde_json::from_str(body)?;

    let catalog = resp
        .access
        .service_catalog
        .into_iter()
        .find(|entry| entry.name == BACKUP_SERVICE_NAME)
        .ok_or(AuthError::ServiceNotFound)?;

    let endpoint = catalog
        .endpoints
        .into_iter()
        .find(|ep| ep.region.as_deref() == Some(region))
        .ok_or_else(|| AuthError::RegionNotFound(region.to_string()))?;

    let api_url = endpoint
        .public_url
        .ok_or_else(|| AuthError::MissingPublicUrl(region.to_string()))?;

    Ok(TokenData {
        token: resp.access.token.id,
        api_url,
    })
}

/// Authenticate against `{identity_url}/v2.0/tokens`.
pub fn authenticate(
    transport: &dyn Transport,
    cfg: &Config,
    identity_url: &str,
) -> Result<TokenData, AuthError> {
    let result = request_token(transport, cfg, identity_url);
    match &result {
        Ok(token) => info!(api_url = %token.api_url, "Authenticated with identity API"),
        Err(e) => error!("{e}"),
    }
    result
}

fn request_token(
    transport: &dyn Transport,
    cfg: &Config,
    identity_url: &str,
) -> Result<TokenData, AuthError> {
    let resp = transport
        .post(
            &api::tokens_url(identity_url),
            None,
            Some(&api::auth_body(&cfg.authentication)),
        )
        .map_err(AuthError::Transport)?;

    if !resp.is_ok() {
        return Err(AuthError::Status(resp.status));
    }

    // Verbose only: the dump contains the token.
    if tracing::enabled!(tracing::Level::DEBUG) {
        if let Ok(pretty) = serde_json::from_str::<serde_json::Value>(&resp.body)
            .and_then(|v| serde_json::to_string_pretty(&v))
        {
            debug!("identity response:\n{pretty}");
        }
    }

    extract(&resp.body, &cfg.general.region)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
