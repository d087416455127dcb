use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::domain::AlertState;

/// JSON file holding the last alert time and last observed price.
#[derive(Debug, Clone)]
pub struct AlertStateStore {
    path: PathBuf,
}

impl AlertStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or corrupted file yields an empty state.
    pub fn load(&self) -> AlertState {
        self.load_at(Utc::now())
    }

    /// Like [`load`](Self::load), judging "future" alert times against `now`.
    pub fn load_at(&self, now: DateTime<Utc>) -> AlertState {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No state file at {:?}, starting fresh", self.path);
                return AlertState::default();
            }
            Err(e) => {
                warn!("⚠️  Could not read state file {:?}: {} - starting fresh", self.path, e);
                return AlertState::default();
            }
        };

        let mut state: AlertState = match serde_json::from_str(&text) {
            Ok(state) => state,
            Err(e) => {
                warn!("⚠️  State file {:?} is corrupted: {} - starting fresh", self.path, e);
                return AlertState::default();
            }
        };

        if let Some(last) = state.last_alert_time {
            if last > now {
                warn!("⚠️  Ignoring last_alert_time {} from the future", last.to_rfc3339());
                state.last_alert_time = None;
            }
        }

        state
    }

    /// Logs and returns on failure; persistence never aborts a cycle.
    pub fn save(&self, state: &AlertState) {
        if let Err(e) = self.write(state) {
            error!("Failed to persist alert state to {:?}: {:#}", self.path, e);
        }
    }

    fn write(&self, state: &AlertState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating state directory {parent:?}"))?;
        }

        let json = serde_json::to_string_pretty(state).context("serializing alert state")?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json).with_context(|| format!("writing {tmp:?}"))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("replacing {:?}", self.path))?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "alert_state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
