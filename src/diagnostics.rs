//! Timestamped JSON snapshots of request/response traffic for offline debugging.
//!
//! Writes never fail the caller: errors are logged and dropped.

use crate::logger::LogLevel;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: PathBuf,
    level: LogLevel,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>, level: LogLevel) -> Self {
        Self {
            dir: dir.into(),
            level,
        }
    }

    /// Never writes anything.
    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), LogLevel::Silent)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full traffic snapshots are only kept at debug verbosity.
    pub fn snapshots_enabled(&self) -> bool {
        self.level >= LogLevel::Debug
    }

    pub fn failures_enabled(&self) -> bool {
        self.level > LogLevel::Silent
    }

    /// Record a traffic snapshot (request, provider request, provider response, final result).
    pub fn snapshot(&self, request_id: &str, name: &str, data: Value) {
        if self.snapshots_enabled() {
            self.persist(request_id, name, data);
        }
    }

    /// Record a failure payload.
    pub fn failure(&self, request_id: &str, name: &str, data: Value) {
        if self.failures_enabled() {
            self.persist(request_id, name, data);
        }
    }

    fn persist(&self, request_id: &str, name: &str, data: Value) {
        let dir = self.dir.clone();
        let file_name = file_name(request_id, name, Utc::now());

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    write_snapshot(&dir, &file_name, &data).await;
                });
            }
            Err(_) => {
                write_snapshot_blocking(&dir, &file_name, &data);
            }
        }
    }
}

/// `<rfc3339 timestamp with ':' replaced by '-'>_<request id>_<name>.json`
///
/// The request id keeps concurrent requests from sharing a path within one millisecond.
pub fn file_name(request_id: &str, name: &str, at: DateTime<Utc>) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-");
    let name = name.strip_suffix(".json").unwrap_or(name);
    format!("{}_{}_{}.json", timestamp, request_id, name)
}

/// Write one snapshot and return its path, or `None` after logging the failure.
pub async fn write_snapshot(dir: &Path, file_name: &str, data: &Value) -> Option<PathBuf> {
    let path = dir.join(file_name);
    let content = match serde_json::to_string_pretty(data) {
        Ok(content) => content,
        Err(e) => {
            log::error!("❌ Failed to serialize snapshot {}: {}", file_name, e);
            return None;
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        log::error!("❌ Failed to create log directory {}: {}", dir.display(), e);
        return None;
    }
    match tokio::fs::write(&path, content).await {
        Ok(()) => {
            log::debug!("📝 Snapshot saved: {}", path.display());
            Some(path)
        }
        Err(e) => {
            log::error!("❌ Failed to write snapshot {}: {}", path.display(), e);
            None
        }
    }
}

fn write_snapshot_blocking(dir: &Path, file_name: &str, data: &Value) -> Option<PathBuf> {
    let path = dir.join(file_name);
    let result = serde_json::to_string_pretty(data)
        .map_err(|e| e.to_string())
        .and_then(|content| {
            std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
            std::fs::write(&path, content).map_err(|e| e.to_string())
        });

    match result {
        Ok(()) => {
            log::debug!("📝 Snapshot saved: {}", path.display());
            Some(path)
        }
        Err(e) => {
            log::error!("❌ Failed to write snapshot {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn entries(dir: &Path) -> Vec<String> {
        match std::fs::read_dir(dir) {
            Ok(read) => read
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn test_file_name() {
        let at = Utc.with_ymd_and_hms(2025, 12, 16, 14, 45, 28).unwrap();
        assert_eq!(
            file_name("req-1", "ai_response.json", at),
            "2025-12-16T14-45-28.000Z_req-1_ai_response.json"
        );
        assert_eq!(
            file_name("req-1", "exception", at),
            "2025-12-16T14-45-28.000Z_req-1_exception.json"
        );
    }

    #[test]
    fn test_snapshots_only_at_debug() {
        let dir = tempfile::tempdir().unwrap();
        let info = Diagnostics::new(dir.path(), LogLevel::Info);
        info.snapshot("r1", "request.json", json!({ "a": 1 }));
        assert!(entries(dir.path()).is_empty());

        info.failure("r1", "exception.json", json!({ "error": "boom" }));
        let written = entries(dir.path());
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("_exception.json"));

        let debug = Diagnostics::new(dir.path(), LogLevel::Debug);
        debug.snapshot("r1", "request.json", json!({ "a": 1 }));
        assert_eq!(entries(dir.path()).len(), 2);
    }

    #[test]
    fn test_same_millisecond_snapshots_from_different_requests_coexist() {
        let dir = tempfile::tempdir().unwrap();
        let debug = Diagnostics::new(dir.path(), LogLevel::Debug);
        for i in 0..20 {
            debug.snapshot(&format!("req-{}", i), "request.json", json!({ "n": i }));
        }

        let written = entries(dir.path());
        assert_eq!(written.len(), 20);
        for i in 0..20 {
            let suffix = format!("_req-{}_request.json", i);
            assert!(written.iter().any(|name| name.ends_with(&suffix)), "{}", suffix);
        }
    }

    #[test]
    fn test_silent_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let silent = Diagnostics::new(dir.path(), LogLevel::Silent);
        silent.failure("r1", "exception.json", json!({}));
        silent.snapshot("r1", "request.json", json!({}));
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_write_snapshot_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/logs");
        let path = write_snapshot(&nested, "x.json", &json!({ "ok": true }))
            .await
            .unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&content).unwrap(),
            json!({ "ok": true })
        );
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // A regular file cannot act as a directory.
        let result = write_snapshot(file.path(), "x.json", &json!({})).await;
        assert!(result.is_none());
    }
}
