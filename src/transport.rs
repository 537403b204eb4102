//! HTTP transport shared by every API call in a run.
//!
//! One [`HttpClient`] is built in `main` and handed by reference to the
//! authenticator, the agent waker and the backup trigger.  Callers only see
//! the [`Transport`] trait so unit tests can substitute a scripted fake.
//!
//! A response with a non-2xx status is **not** an error at this layer: it is
//! returned as an [`HttpResponse`] and the caller decides what the status
//! means.  Only failures to get any response at all (DNS, connect, TLS,
//! timeout) surface as `Err`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde_json::Value;
use tracing::debug;

/// Header carrying the identity token on backup API calls.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Both remote APIs signal success with exactly `200 OK`.
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Something that can POST to a URL.
pub trait Transport {
    /// POST `body` (or an empty body when `None`) to `url`.
    ///
    /// `token`, when present, is sent as the `X-Auth-Token` header.
    fn post(&self, url: &str, token: Option<&str>, body: Option<&Value>) -> Result<HttpResponse>;
}

// ─── reqwest implementation ───────────────────────────────────────────────────

/// Settings fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
}

/// Blocking reqwest client configured once per run.
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("run-backup/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self { inner })
    }
}

impl Transport for HttpClient {
    fn post(&self, url: &str, token: Option<&str>, body: Option<&Value>) -> Result<HttpResponse> {
        let mut req = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            req = req.header(AUTH_TOKEN_HEADER, token);
        }
        req = match body {
            Some(json) => req.json(json),
            None => req.body(""),
        };

        debug!(%url, "POST");
        let resp = req.send().with_context(|| format!("POST {url}"))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .with_context(|| format!("reading response body from {url}"))?;
        debug!(%url, status, bytes = body.len(), "response");

        Ok(HttpResponse { status, body })
    }
}

// ─── Test double ──────────────────────────────────────────────────────────────
