//! Shared utilities for the binary-level tests: a recording mock of the
//! identity and backup APIs, a config writer and a binary runner.

#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    process::Command,
    sync::{Arc, Mutex},
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// Absolute path to the compiled `run-backup` binary.
pub const BIN: &str = env!("CARGO_BIN_EXE_run-backup");

pub const TOKENS_PATH: &str = "/v2.0/tokens";
pub const WAKE_PATH: &str = "/v1.0/123/user/wakeupagents";
pub const ACTION_PATH: &str = "/v1.0/123/backup/action-requested/";
pub const TOKEN: &str = "tok-abc123";

/// Two enabled locations, indented for [`write_config`].
pub const TWO_LOCATIONS: &str =
    "  web01:\n    backupConfigurationId: 1001\n  db01:\n    backupConfigurationId: 1002\n";

// ─── Mock backend ─────────────────────────────────────────────────────────────

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub token: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl Request {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

pub struct MockBackend {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockBackend {
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

/// Start a programmable backend on an ephemeral port.
///
/// `handler` receives each request plus the backend's own base URL (so the
/// identity response can point the backup endpoint back at the mock) and
/// returns `(status, body)`.
pub async fn start_mock_backend<F>(handler: F) -> MockBackend
where
    F: Fn(&Request, &str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let base = base_url.clone();
    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let recorded = recorded.clone();
            let base = base.clone();
            tokio::spawn(async move {
                let Some(req) = read_request(&mut socket).await else {
                    return;
                };
                recorded.lock().unwrap().push(req.clone());
                let (status, body) = handler(&req, &base);
                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockBackend { base_url, requests }
}

async fn read_request(socket: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let mut content_length = 0;
    let mut token = None;
    let mut content_type = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "x-auth-token" => token = Some(value.to_string()),
                "content-type" => content_type = Some(value.to_string()),
                _ => {},
            }
        }
    }

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(Request {
        method,
        path,
        token,
        content_type,
        body: String::from_utf8_lossy(&buf[head_end..]).into_owned(),
    })
}

/// Identity response advertising a `cloudBackup` endpoint in `region` that
/// points back at `base`.
pub fn identity_body(base: &str, region: &str) -> String {
    serde_json::json!({
        "access": {
            "token": { "id": TOKEN, "expires": "2030-01-01T00:00:00Z" },
            "serviceCatalog": [
                {
                    "name": "cloudFiles",
                    "endpoints": [{ "region": region, "publicURL": format!("{base}/files") }]
                },
                {
                    "name": "cloudBackup",
                    "endpoints": [{ "region": region, "publicURL": format!("{base}/v1.0/123") }]
                }
            ]
        }
    })
    .to_string()
}

/// A well-behaved backend for `region` whose trigger endpoint answers with
/// `trigger(id)` for each backup configuration id.
pub async fn start_backend<T>(region: &'static str, trigger: T) -> MockBackend
where
    T: Fn(&serde_json::Value) -> u16 + Send + Sync + 'static,
{
    start_mock_backend(move |req, base| match req.path.as_str() {
        TOKENS_PATH => (200, identity_body(base, region)),
        WAKE_PATH => (200, String::new()),
        ACTION_PATH => {
            let status = trigger(&req.json()["Id"]);
            (status, if status == 200 { "98765".into() } else { String::new() })
        },
        _ => (404, String::new()),
    })
    .await
}

// ─── Config ───────────────────────────────────────────────────────────────────

/// Write a config file into `dir`.  `locations` is raw YAML placed under the
/// `locations:` key (indented by the caller).
pub fn write_config(dir: &Path, revision: u32, region: &str, locations: &str) -> PathBuf {
    let path = dir.join("run_backup.conf.yaml");
    std::fs::write(
        &path,
        format!(
            "general:\n  configRevision: {revision}\n  region: {region}\n\
             authentication:\n  apiuser: alice\n  apikey: sup3r-s3cr3t-key\n\
             locations:\n{locations}"
        ),
    )
    .unwrap();
    path
}

// ─── Binary ───────────────────────────────────────────────────────────────────

pub struct Output {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run the binary with `args` (blocking).
pub fn run(args: &[&str]) -> Output {
    let out = Command::new(BIN)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn {BIN}: {e}"));
    Output {
        code: out.status.code(),
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
    }
}

/// Run the binary off the async runtime so the mock backend keeps serving.
pub async fn run_async(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run(&args)
    })
    .await
    .unwrap()
}

/// Standard flags pointing the binary at `backend` and `conffile`.
pub fn args_for(backend: &MockBackend, conffile: &Path, extra: &[&str]) -> Vec<String> {
    let mut args = vec![
        "--conffile".to_string(),
        conffile.display().to_string(),
        "--identityurl".to_string(),
        backend.base_url.clone(),
        "--wakedelay".to_string(),
        "1".to_string(),
        "--timeout".to_string(),
        "10".to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    args
}
