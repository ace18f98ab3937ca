//! Session operations for the outer adapter.
//!
//! Every mutating operation is persisted through the store before it returns.
//! Analysis and planning run as one unit of work: on error the session keeps
//! its previous state and no partial results are stored.

use crate::config::{AppConfig, CompiledFilters};
use crate::descriptor::DescriptorBuilder;
use crate::error::{Error, Result};
use crate::executor::{ApplyExecutor, ApplySummary, ProgressCallback};
use crate::planner::{AnalysisSummary, PlanCompiler, PlanSummary};
use crate::preview::{PreviewNode, build_preview};
use crate::registry::{Registry, StrategyInfo};
use crate::scanner::DirectoryScanner;
use crate::session::{Progress, Session};
use crate::store::{SessionRecord, SessionStore};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    pub directory: PathBuf,
    pub entries: Vec<DirectoryEntry>,
}

pub struct SessionService {
    config: AppConfig,
    store: SessionStore,
    compiler: PlanCompiler,
    executor: ApplyExecutor,
}

impl SessionService {
    /// Builds the service from a loaded configuration and an opened store.
    ///
    /// The configuration file and the store file are never scanned, even when
    /// they live inside a session directory.
    ///
    /// # Errors
    ///
    /// Fails if the configured filter rules do not compile.
    pub fn new(config: AppConfig, store: SessionStore) -> Result<Self> {
        let filters = CompiledFilters::new(&config.filters)?;
        let own_files = config
            .source
            .as_deref()
            .into_iter()
            .chain(store.path())
            .map(Path::to_path_buf);
        let scanner =
            DirectoryScanner::new(DescriptorBuilder::new(&config.scan), filters).skip_paths(own_files);
        let compiler = PlanCompiler::new(scanner, Registry::new(config.registry.clone()));
        Ok(Self {
            config,
            store,
            compiler,
            executor: ApplyExecutor::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Opens a new session on `directory`.
    ///
    /// The directory must exist. It is stored as an absolute path.
    pub fn create_session(&mut self, directory: &Path, recursive: Option<bool>) -> Result<Session> {
        let directory = existing_dir(directory)?;
        let session = Session::new(
            directory,
            recursive.unwrap_or(self.config.defaults.recursive),
        );
        tracing::info!(session = %session.id, directory = %session.directory.display(), "Created session");
        self.store.insert(SessionRecord::new(session.clone()));
        self.store.save()?;
        Ok(session)
    }

    pub fn list_sessions(&self) -> Vec<&Session> {
        self.store.list()
    }

    pub fn get_session(&self, id: Uuid) -> Result<&SessionRecord> {
        self.store.get(id)
    }

    /// Deletes a session together with its descriptors, descriptions and
    /// instructions.
    pub fn delete_session(&mut self, id: Uuid) -> Result<()> {
        let record = self.store.delete(id)?;
        tracing::info!(
            session = %id,
            instructions = record.instructions.len(),
            "Deleted session"
        );
        self.store.save()
    }

    pub fn analyze(&mut self, id: Uuid, method: Option<&str>) -> Result<AnalysisSummary> {
        let method = method.unwrap_or(self.config.defaults.analysis_method.as_str());
        let compiler = &self.compiler;
        let summary = self
            .store
            .transaction(id, |record| compiler.analyze(record, method))?;
        self.store.save()?;
        Ok(summary)
    }

    pub fn plan(&mut self, id: Uuid, algorithm: Option<&str>) -> Result<PlanSummary> {
        let algorithm = algorithm.unwrap_or(self.config.defaults.struct_algorithm.as_str());
        let compiler = &self.compiler;
        let summary = self
            .store
            .transaction(id, |record| compiler.plan(record, algorithm))?;
        self.store.save()?;
        Ok(summary)
    }

    /// Analysis and planning as a single unit of work.
    pub fn process(
        &mut self,
        id: Uuid,
        method: Option<&str>,
        algorithm: Option<&str>,
    ) -> Result<PlanSummary> {
        let method = method.unwrap_or(self.config.defaults.analysis_method.as_str());
        let algorithm = algorithm.unwrap_or(self.config.defaults.struct_algorithm.as_str());
        let compiler = &self.compiler;
        let summary = self
            .store
            .transaction(id, |record| compiler.process(record, method, algorithm))?;
        self.store.save()?;
        Ok(summary)
    }

    pub fn preview(&self, id: Uuid) -> Result<PreviewNode> {
        let record = self.store.get(id)?;
        Ok(build_preview(&record.instructions, &record.session.directory))
    }

    /// Applies the session's plan. Instruction outcomes are persisted even
    /// when some of them failed.
    ///
    /// The `APPLYING` status is saved before the first instruction runs, so
    /// another process opening the same store sees the session as busy.
    pub fn apply(
        &mut self,
        id: Uuid,
        dry_run: bool,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<ApplySummary> {
        if dry_run {
            let record = self.store.get_mut(id)?;
            return self.executor.execute(record, true, progress);
        }

        self.executor.begin(self.store.get_mut(id)?)?;
        self.store.save()?;
        let summary = self.executor.run(self.store.get_mut(id)?, progress)?;
        self.store.save()?;
        Ok(summary)
    }

    pub fn progress(&self, id: Uuid) -> Result<Progress> {
        let record = self.store.get(id)?;
        Ok(Progress::compute(
            record.session.status,
            record.resolved_count(),
            record.instructions.len(),
        ))
    }

    /// Lists the immediate entries of `directory`, sorted by name, so a
    /// caller can pick a directory before opening a session on it.
    pub fn list_entries(&self, directory: &Path) -> Result<DirectoryListing> {
        let directory = existing_dir(directory)?;
        let mut entries = fs::read_dir(&directory)?
            .map(|entry| {
                let entry = entry?;
                Ok(DirectoryEntry {
                    name: entry.file_name().to_string_lossy().to_string(),
                    is_dir: entry.file_type()?.is_dir(),
                })
            })
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(DirectoryListing { directory, entries })
    }

    pub fn methods(&self) -> Vec<StrategyInfo> {
        self.compiler.registry().methods()
    }

    pub fn algorithms(&self) -> Vec<StrategyInfo> {
        self.compiler.registry().algorithms()
    }
}

/// Makes `directory` absolute and checks that it is an existing directory.
fn existing_dir(directory: &Path) -> Result<PathBuf> {
    let directory = std::path::absolute(directory)?;
    if directory.is_dir() {
        return Ok(directory);
    }
    Err(Error::InvalidDirectory {
        reason: if directory.exists() {
            "not a directory".to_string()
        } else {
            "directory does not exist".to_string()
        },
        path: directory,
    })
}
