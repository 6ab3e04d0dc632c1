use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{error, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FailureKind, StoreError, TargetFailure};
use crate::model::ProfileRecord;

/// Why a run ended before its last target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    CredentialInvalid,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success { profile: Box<ProfileRecord> },
    Failed { failure: FailureKind, detail: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub target: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub finished_at: DateTime<Local>,
}

impl BatchEntry {
    pub fn success(target: impl Into<String>, profile: ProfileRecord) -> Self {
        BatchEntry {
            target: target.into(),
            outcome: Outcome::Success {
                profile: Box::new(profile),
            },
            finished_at: Local::now(),
        }
    }

    pub fn failed(target: impl Into<String>, failure: &TargetFailure) -> Self {
        BatchEntry {
            target: target.into(),
            outcome: Outcome::Failed {
                failure: failure.kind,
                detail: failure.detail.clone(),
            },
            finished_at: Local::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn profile(&self) -> Option<&ProfileRecord> {
        match &self.outcome {
            Outcome::Success { profile } => Some(profile),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self.outcome {
            Outcome::Failed { failure, .. } => Some(failure),
            Outcome::Success { .. } => None,
        }
    }
}

/// The output document of one run, in target order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub stopped_by: Option<StopReason>,
    pub entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn new() -> Self {
        BatchResult {
            run_id: Uuid::new_v4(),
            started_at: Local::now(),
            finished_at: None,
            stopped_by: None,
            entries: Vec::new(),
        }
    }

    pub fn successes(&self) -> impl Iterator<Item = &ProfileRecord> {
        self.entries.iter().filter_map(BatchEntry::profile)
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_success()).count()
    }
}

impl Default for BatchResult {
    fn default() -> Self {
        BatchResult::new()
    }
}

/// JSON file holding the latest [`BatchResult`].
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ResultStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The previous run's document, or `None` to start fresh.
    pub fn load(&self) -> Option<BatchResult> {
        if !self.path.exists() {
            info!("No previous results at {:?}. Starting fresh.", self.path);
            return None;
        }
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to read results file: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<BatchResult>(&content) {
            Ok(previous) => {
                info!(
                    "Resumed previous run {}: {} profiles already done.",
                    previous.run_id,
                    previous.successes().count()
                );
                Some(previous)
            }
            Err(e) => {
                error!("Failed to parse results file: {}. Starting fresh.", e);
                None
            }
        }
    }

    /// Writes next to the destination and renames over it, so a crash leaves
    /// either the old or the new document.
    pub fn save(&self, result: &BatchResult) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(result)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let io = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io)?;
        }
        fs::write(&tmp, json).map_err(io)?;
        fs::rename(&tmp, &self.path).map_err(io)
    }
}
