//! JSON file roster repository.
//!
//! Stores the roster as one pretty-printed JSON array, the layout used by
//! earlier deployments of the exchange service.
//!
//! # Invariants
//! - A missing file loads as an empty roster.
//! - Saves go through a sibling temp file and a rename, so readers see
//!   either the old or the new roster.

use crate::model::participant::Participant;
use crate::repo::participant_repo::{ParticipantRepository, RepoResult};
use log::info;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File-backed roster repository.
#[derive(Debug, Clone)]
pub struct JsonFileParticipantRepository {
    path: PathBuf,
}

impl JsonFileParticipantRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ParticipantRepository for JsonFileParticipantRepository {
    fn load_all(&self) -> RepoResult<Vec<Participant>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    "event=roster_load module=repo status=ok backend=json detail=no_existing_file path={}",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_all(&self, participants: &[Participant]) -> RepoResult<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_vec_pretty(participants)?;
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(&payload)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}
