//! Session persistence.
//!
//! Every session owns one [`SessionRecord`] holding its descriptors,
//! descriptions and instructions. Deleting a session removes the record and
//! everything it owns. The whole store is saved as one pretty-printed JSON
//! file.

use crate::descriptor::FileDescriptor;
use crate::error::{Error, Result};
use crate::extractor::Description;
use crate::instruction::Instruction;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A session together with everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session: Session,
    #[serde(default)]
    pub descriptors: Vec<FileDescriptor>,
    #[serde(default)]
    pub descriptions: Vec<Description>,
    /// In persisted (apply) order.
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

impl SessionRecord {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            descriptors: Vec::new(),
            descriptions: Vec::new(),
            instructions: Vec::new(),
        }
    }

    /// Number of instructions that are no longer pending.
    pub fn resolved_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|instruction| instruction.status.is_resolved())
            .count()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    sessions: BTreeMap<Uuid, SessionRecord>,
}

/// Arena of session records keyed by session id.
#[derive(Debug, Default)]
pub struct SessionStore {
    records: BTreeMap<Uuid, SessionRecord>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the store backed by `path`, loading it if the file exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the file exists but cannot be read or
    /// parsed.
    pub fn open(path: &Path) -> Result<Self> {
        let records = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Store(format!("failed to read {}: {}", path.display(), e))
            })?;
            let file: StoreFile = serde_json::from_str(&content).map_err(|e| {
                Error::Store(format!("invalid store file {}: {}", path.display(), e))
            })?;
            file.sessions
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), sessions = records.len(), "Opened session store");
        Ok(Self {
            records,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the store to its backing file. A no-op for in-memory stores.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Store(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let file = StoreFile {
            sessions: self.records.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::Store(format!("JSON serialization failed: {}", e)))?;
        fs::write(path, json)
            .map_err(|e| Error::Store(format!("failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    pub fn insert(&mut self, record: SessionRecord) {
        self.records.insert(record.session.id, record);
    }

    pub fn get(&self, id: Uuid) -> Result<&SessionRecord> {
        self.records.get(&id).ok_or(Error::NotFound(id))
    }

    pub fn get_mut(&mut self, id: Uuid) -> Result<&mut SessionRecord> {
        self.records.get_mut(&id).ok_or(Error::NotFound(id))
    }

    /// All sessions, newest first.
    pub fn list(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.records.values().map(|r| &r.session).collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions
    }

    /// Removes a session and everything it owns.
    pub fn delete(&mut self, id: Uuid) -> Result<SessionRecord> {
        self.records.remove(&id).ok_or(Error::NotFound(id))
    }

    /// Runs `work` against a staged copy of the record and commits the copy
    /// only if `work` succeeds. On error the stored record is left untouched.
    pub fn transaction<T, F>(&mut self, id: Uuid, work: F) -> Result<T>
    where
        F: FnOnce(&mut SessionRecord) -> Result<T>,
    {
        let mut staged = self.get(id)?.clone();
        let value = work(&mut staged)?;
        self.records.insert(id, staged);
        Ok(value)
    }
}
