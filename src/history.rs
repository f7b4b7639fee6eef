//! Append-only operation history.
//!
//! Every successful forward operation of an [`EditSession`](crate::engine::EditSession)
//! is appended to a single JSON document: an array of records, oldest first.
//!
//! ```json
//! [
//!   {
//!     "date": "2026-10-14 15:42:07",
//!     "operation": "resize",
//!     "params": { "h": 50, "w": 50 }
//!   }
//! ]
//! ```
//!
//! The document stays a plain array with no envelope so that `jq` and other
//! independent tooling can read it directly.
//!
//! # Corruption policy
//!
//! Appending is read-modify-write. When the existing document cannot be read
//! or parsed, the store follows its [`CorruptionPolicy`]:
//!
//! - [`Repair`](CorruptionPolicy::Repair) (default): the document is replaced
//!   by an array holding only the new record, and write failures are logged
//!   and swallowed. **Earlier history is lost.** Editing availability wins
//!   over audit completeness; operators who need a complete trail should use
//!   `Fail`.
//! - [`Fail`](CorruptionPolicy::Fail): corruption and I/O failures are
//!   returned to the caller and the document is left untouched.
//!
//! # Writes
//!
//! The new document is written to a sibling temp file and renamed over the
//! old one, so a crash mid-write leaves either the old or the new array, never
//! a truncated one.
//!
//! # Sharing
//!
//! [`HistoryStore`] is `Clone`. Clones share one lock, so sessions handed
//! clones of the same store never interleave their read-modify-write cycles.
//! Two stores opened separately on the same path do not coordinate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Timestamp layout of the `date` field: local time, second precision.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("IO error on history {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("History document {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What to do when the existing document cannot be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptionPolicy {
    /// Overwrite with a fresh array. Never surfaces an error.
    #[default]
    Repair,
    /// Surface the error and leave the document untouched.
    Fail,
}

/// A scalar parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f32> for Scalar {
    /// Goes through the shortest decimal form so `1.1f32` is logged as `1.1`.
    fn from(v: f32) -> Self {
        Self::Float(v.to_string().parse().unwrap_or(f64::from(v)))
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

pub type Params = BTreeMap<String, Scalar>;

/// One audit entry. Never modified once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: String,
    pub operation: String,
    #[serde(default)]
    pub params: Params,
}

impl HistoryRecord {
    /// A record stamped with the current local time.
    pub fn now(operation: &str, params: Params) -> Self {
        Self {
            date: chrono::Local::now().format(DATE_FORMAT).to_string(),
            operation: operation.to_string(),
            params,
        }
    }
}

/// Durable, append-only JSON history document.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    policy: CorruptionPolicy,
    lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    /// Open the store at `path`, creating parent directories and an empty
    /// array document if none exists. Opening an existing document leaves it
    /// untouched, whatever its content.
    pub fn open(
        path: impl Into<PathBuf>,
        policy: CorruptionPolicy,
    ) -> Result<Self, HistoryError> {
        let store = Self {
            path: path.into(),
            policy,
            lock: Arc::new(Mutex::new(())),
        };
        store.ensure_initialized()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_initialized(&self) -> Result<(), HistoryError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        self.write_records(&[])?;
        tracing::debug!(path = %self.path.display(), "Initialized empty history");
        Ok(())
    }

    /// Read every record, oldest first.
    pub fn records(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_str(&content).map_err(|e| HistoryError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Append one record.
    ///
    /// Under [`CorruptionPolicy::Repair`] this always returns `Ok`: a corrupt
    /// document is replaced by `[record]` and write failures are only logged.
    pub fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        // The guarded value is (); poisoning carries no state.
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut records = match self.records() {
            Ok(records) => records,
            Err(e) => match self.policy {
                CorruptionPolicy::Fail => return Err(e),
                CorruptionPolicy::Repair => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "History unreadable, starting a new log"
                    );
                    Vec::new()
                }
            },
        };
        records.push(record);

        match self.write_records(&records) {
            Ok(()) => {
                tracing::debug!(
                    path = %self.path.display(),
                    entries = records.len(),
                    "History record appended"
                );
                Ok(())
            }
            Err(e) if self.policy == CorruptionPolicy::Repair => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to write history, record dropped"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Serialize and atomically replace the document.
    fn write_records(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(records)?;
        let temp_path = temp_path_for(&self.path);

        std::fs::write(&temp_path, json.as_bytes()).map_err(|e| self.io_error(e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            self.io_error(e)
        })
    }

    fn io_error(&self, source: io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// `history.json` → `history.json.tmp`, in the same directory so the rename
/// never crosses filesystems.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
