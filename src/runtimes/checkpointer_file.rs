//! File-backed [`Checkpointer`]: one directory per session id, one file per
//! step. Two textual encodings are supported — JSON (the "common
//! data-interchange format") and TOML (the "structured key-value" format) —
//! selected per [`FileCheckpointer`] instance via [`FileEncoding`].
//!
//! `load_latest` picks the numerically largest step file present in a
//! session's directory, so callers never need to track step numbers
//! themselves to resume.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::runtimes::checkpointer::{Checkpoint, Checkpointer, CheckpointerError, Result};
use crate::state::{StateSnapshot, VersionedState};
use crate::types::NodeKind;

/// Textual encoding used for each checkpoint file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEncoding {
    /// `serde_json`, one object per file.
    Json,
    /// `toml`, one table per file.
    Toml,
}

impl FileEncoding {
    fn ext(self) -> &'static str {
        match self {
            FileEncoding::Json => "json",
            FileEncoding::Toml => "toml",
        }
    }

    fn from_ext(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(FileEncoding::Json),
            "toml" => Some(FileEncoding::Toml),
            _ => None,
        }
    }
}

/// On-disk shape of a checkpoint file: `{state, timestamp, metadata}` plus
/// the scheduler bookkeeping needed to resume a session without replaying
/// every prior step.
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointRecord {
    session_id: String,
    step: u64,
    state: StateSnapshot,
    timestamp: DateTime<Utc>,
    frontier: Vec<NodeKind>,
    versions_seen: FxHashMap<String, FxHashMap<String, u64>>,
    concurrency_limit: usize,
    ran_nodes: Vec<NodeKind>,
    skipped_nodes: Vec<NodeKind>,
    updated_channels: Vec<String>,
}

impl From<&Checkpoint> for CheckpointRecord {
    fn from(cp: &Checkpoint) -> Self {
        Self {
            session_id: cp.session_id.clone(),
            step: cp.step,
            state: cp.state.snapshot(),
            timestamp: cp.created_at,
            frontier: cp.frontier.clone(),
            versions_seen: cp.versions_seen.clone(),
            concurrency_limit: cp.concurrency_limit,
            ran_nodes: cp.ran_nodes.clone(),
            skipped_nodes: cp.skipped_nodes.clone(),
            updated_channels: cp.updated_channels.clone(),
        }
    }
}

impl From<CheckpointRecord> for Checkpoint {
    fn from(rec: CheckpointRecord) -> Self {
        Self {
            session_id: rec.session_id,
            step: rec.step,
            state: VersionedState::from_snapshot(rec.state),
            frontier: rec.frontier,
            versions_seen: rec.versions_seen,
            concurrency_limit: rec.concurrency_limit,
            created_at: rec.timestamp,
            ran_nodes: rec.ran_nodes,
            skipped_nodes: rec.skipped_nodes,
            updated_channels: rec.updated_channels,
        }
    }
}

/// File-backed checkpoint store rooted at a directory, one subdirectory per
/// session id.
pub struct FileCheckpointer {
    root: PathBuf,
    encoding: FileEncoding,
}

impl FileCheckpointer {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, encoding: FileEncoding) -> Self {
        Self {
            root: root.into(),
            encoding,
        }
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    fn step_path(&self, session_id: &str, step: u64) -> PathBuf {
        self.session_dir(session_id)
            .join(format!("{step}.{}", self.encoding.ext()))
    }

    fn encode(&self, record: &CheckpointRecord) -> Result<String> {
        match self.encoding {
            FileEncoding::Json => serde_json::to_string_pretty(record).map_err(|e| {
                CheckpointerError::Other {
                    message: e.to_string(),
                }
            }),
            FileEncoding::Toml => {
                toml::to_string_pretty(record).map_err(|e| CheckpointerError::Other {
                    message: e.to_string(),
                })
            }
        }
    }

    fn decode(contents: &str, encoding: FileEncoding) -> Result<CheckpointRecord> {
        match encoding {
            FileEncoding::Json => {
                serde_json::from_str(contents).map_err(|e| CheckpointerError::Other {
                    message: e.to_string(),
                })
            }
            FileEncoding::Toml => toml::from_str(contents).map_err(|e| CheckpointerError::Other {
                message: e.to_string(),
            }),
        }
    }

    /// Finds the step file with the numerically largest step number in a
    /// session's directory, regardless of which encoding wrote it.
    fn latest_step_file(&self, session_id: &str) -> Result<Option<(u64, PathBuf, FileEncoding)>> {
        let dir = self.session_dir(session_id);
        if !dir.exists() {
            return Ok(None);
        }
        let entries = std::fs::read_dir(&dir).map_err(|e| CheckpointerError::Backend {
            message: e.to_string(),
        })?;

        let mut best: Option<(u64, PathBuf, FileEncoding)> = None;
        for entry in entries {
            let entry = entry.map_err(|e| CheckpointerError::Backend {
                message: e.to_string(),
            })?;
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Ok(step) = stem.parse::<u64>() else {
                continue;
            };
            let Some(encoding) = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(FileEncoding::from_ext)
            else {
                continue;
            };
            if best.as_ref().is_none_or(|(s, _, _)| step > *s) {
                best = Some((step, path, encoding));
            }
        }
        Ok(best)
    }
}

#[async_trait]
impl Checkpointer for FileCheckpointer {
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        let dir = self.session_dir(&checkpoint.session_id);
        std::fs::create_dir_all(&dir).map_err(|e| CheckpointerError::Backend {
            message: e.to_string(),
        })?;
        let record = CheckpointRecord::from(&checkpoint);
        let encoded = self.encode(&record)?;
        let path = self.step_path(&checkpoint.session_id, checkpoint.step);
        std::fs::write(&path, encoded).map_err(|e| CheckpointerError::Backend {
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn load_latest(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let Some((_, path, encoding)) = self.latest_step_file(session_id)? else {
            return Ok(None);
        };
        let contents = std::fs::read_to_string(&path).map_err(|e| CheckpointerError::Backend {
            message: e.to_string(),
        })?;
        let record = Self::decode(&contents, encoding)?;
        Ok(Some(record.into()))
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.root).map_err(|e| CheckpointerError::Backend {
            message: e.to_string(),
        })?;
        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CheckpointerError::Backend {
                message: e.to_string(),
            })?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                if let Some(name) = entry.file_name().to_str() {
                    sessions.push(name.to_string());
                }
            }
        }
        Ok(sessions)
    }
}
