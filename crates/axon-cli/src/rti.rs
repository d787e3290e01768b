//! Runtime-info file: the on-disk record of a hosted server.
//!
//! Written when `axond up` has confirmed the server reachable, removed
//! at orderly exit. A crash or force-kill leaves the file behind; the
//! `clean` verb recovers from that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Persisted process record, PascalCase on disk:
///
/// ```json
/// { "PID": 4223, "Started": "2026-01-02T03:04:05Z", "Running": true, "Address": "127.0.0.1:4096" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeInfo {
    #[serde(rename = "PID")]
    pub pid: i32,
    #[serde(rename = "Started")]
    pub started: DateTime<Utc>,
    #[serde(rename = "Running")]
    pub running: bool,
    #[serde(rename = "Address")]
    pub address: String,
}

#[derive(Debug, Error)]
pub enum RtiError {
    #[error("no runtime-info file at path")]
    NotFound,

    #[error("failed to parse runtime-info file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(std::io::Error),
}

impl RuntimeInfo {
    /// A record for the current process, not yet marked running.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            pid: std::process::id() as i32,
            started: Utc::now(),
            running: false,
            address: address.into(),
        }
    }

    /// Loads and parses the record at `path`.
    ///
    /// # Errors
    ///
    /// [`RtiError::NotFound`] when there is no file, [`RtiError::Parse`]
    /// when it is not a runtime-info document.
    pub fn load(path: &Path) -> Result<Self, RtiError> {
        debug!(path = %path.display(), "loading runtime info");
        let raw = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                RtiError::NotFound
            } else {
                RtiError::Io(err)
            }
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Writes the record to `path`.
    ///
    /// # Errors
    ///
    /// I/O and encoding failures.
    pub fn write(&self, path: &Path) -> Result<(), RtiError> {
        debug!(path = %path.display(), pid = self.pid, "writing runtime info");
        let raw = serde_json::to_vec(self)?;
        std::fs::write(path, raw).map_err(RtiError::Io)
    }

    /// Removes the record at `path`; a missing file is fine.
    pub fn remove(path: &Path) {
        debug!(path = %path.display(), "removing runtime info");
        let _ = std::fs::remove_file(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".axond");

        let mut info = RuntimeInfo::new("127.0.0.1:4096");
        info.running = true;
        info.write(&path).unwrap();

        let loaded = RuntimeInfo::load(&path).unwrap();
        assert_eq!(loaded.pid, info.pid);
        assert_eq!(loaded.address, "127.0.0.1:4096");
        assert!(loaded.running);
    }

    #[test]
    fn disk_format_is_capitalised() {
        let raw = serde_json::to_value(RuntimeInfo::new("h:1")).unwrap();
        let obj = raw.as_object().unwrap();
        for key in ["PID", "Started", "Running", "Address"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = RuntimeInfo::load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, RtiError::NotFound));
    }

    #[test]
    fn garbage_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".axond");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            RuntimeInfo::load(&path).unwrap_err(),
            RtiError::Parse(_)
        ));
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        RuntimeInfo::remove(&dir.path().join("nope"));
    }
}
