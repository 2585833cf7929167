//! Flag store: the set of question ids marked for review
//!
//! Persisted as `{"flagged": [ids...]}` and rewritten in full on every change.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct FlagFile {
    #[serde(default)]
    flagged: BTreeSet<String>,
}

/// Flagged question ids backed by a JSON file
#[derive(Debug, Clone)]
pub struct FlagStore {
    path: PathBuf,
    flagged: BTreeSet<String>,
}

impl FlagStore {
    /// Load the store. A missing or unreadable file yields an empty set.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let flagged = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<FlagFile>(&content) {
                Ok(file) => file.flagged,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt flag store, starting empty");
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable flag store, starting empty");
                BTreeSet::new()
            }
        };

        tracing::debug!(path = %path.display(), flagged = flagged.len(), "flag store loaded");
        Self { path, flagged }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.flagged.contains(id)
    }

    pub fn flagged(&self) -> &BTreeSet<String> {
        &self.flagged
    }

    pub fn len(&self) -> usize {
        self.flagged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }

    /// Flip the flag for `id` and persist. Returns the new state.
    ///
    /// On a failed write the in-memory set is restored.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let flagged = if self.flagged.remove(id) {
            false
        } else {
            self.flagged.insert(id.to_string());
            true
        };

        if let Err(e) = self.save() {
            if flagged {
                self.flagged.remove(id);
            } else {
                self.flagged.insert(id.to_string());
            }
            return Err(e);
        }

        Ok(flagged)
    }

    /// Rewrite the whole file through a temporary file in the same directory
    pub fn save(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let file = FlagFile {
            flagged: self.flagged.clone(),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, &file)?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        Ok(())
    }
}
