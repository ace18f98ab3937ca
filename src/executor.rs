//! Applies a session's pending instructions to the filesystem.
//!
//! Instructions run sequentially in persisted order. A failing instruction is
//! recorded and the batch goes on. Once every instruction has been attempted,
//! source directories left empty are removed bottom-up, never leaving the
//! session base directory.

use crate::error::{ApplyError, Error, Result};
use crate::instruction::{Action, ActionKind, InstructionStatus};
use crate::session::SessionStatus;
use crate::store::SessionRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Called with `(attempted, total)` after every instruction.
pub type ProgressCallback<'a> = &'a dyn Fn(usize, usize);

/// One failed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyFailure {
    pub instruction_id: Uuid,
    pub action: ActionKind,
    pub target: PathBuf,
    pub error: String,
}

/// Outcome of an apply run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    pub applied: usize,
    pub failed: usize,
    /// Pending instructions left untouched (dry run).
    pub skipped: usize,
    pub errors: Vec<ApplyFailure>,
    /// Directories removed by the post-batch cleanup, deepest first.
    pub removed_dirs: Vec<PathBuf>,
    pub dry_run: bool,
}

/// Executes instruction batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplyExecutor;

impl ApplyExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Applies every pending instruction of `record`.
    ///
    /// A dry run touches neither the filesystem nor any status; it only counts
    /// the pending instructions as skipped. Otherwise this is [`begin`]
    /// followed by [`run`].
    ///
    /// # Errors
    ///
    /// [`Error::ApplyInProgress`] if the session is already `APPLYING`, and
    /// [`Error::InvalidTransition`] if it is not `PLANNED` (or, for a dry run,
    /// has no plan at all). Per-instruction failures are never errors here.
    ///
    /// [`begin`]: Self::begin
    /// [`run`]: Self::run
    pub fn execute(
        &self,
        record: &mut SessionRecord,
        dry_run: bool,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<ApplySummary> {
        if !dry_run {
            self.begin(record)?;
            return self.run(record, progress);
        }

        let session_id = record.session.id;
        if record.session.status == SessionStatus::Applying {
            return Err(Error::ApplyInProgress(session_id));
        }
        if !record.session.status.has_plan() {
            return Err(Error::InvalidTransition {
                from: record.session.status,
                to: SessionStatus::Applying,
            });
        }
        let skipped = record
            .instructions
            .iter()
            .filter(|i| i.status == InstructionStatus::Pending)
            .count();
        tracing::info!(session = %session_id, skipped, "Dry run, nothing applied");
        Ok(ApplySummary {
            applied: 0,
            failed: 0,
            skipped,
            errors: Vec::new(),
            removed_dirs: Vec::new(),
            dry_run: true,
        })
    }

    /// Claims a `PLANNED` session for applying by moving it to `APPLYING`.
    ///
    /// Persisting the record after this call makes the claim visible to
    /// other readers of the store.
    pub fn begin(&self, record: &mut SessionRecord) -> Result<()> {
        if record.session.status == SessionStatus::Applying {
            return Err(Error::ApplyInProgress(record.session.id));
        }
        record.session.transition(SessionStatus::Applying)
    }

    /// Runs the batch of a session claimed with [`begin`](Self::begin), then
    /// cleans up emptied directories and settles the final status.
    pub fn run(
        &self,
        record: &mut SessionRecord,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<ApplySummary> {
        let session_id = record.session.id;
        if record.session.status != SessionStatus::Applying {
            return Err(Error::InvalidTransition {
                from: record.session.status,
                to: SessionStatus::Applying,
            });
        }

        let base = record.session.directory.clone();
        let total = record
            .instructions
            .iter()
            .filter(|i| i.status == InstructionStatus::Pending)
            .count();
        let mut summary = ApplySummary {
            applied: 0,
            failed: 0,
            skipped: 0,
            errors: Vec::new(),
            removed_dirs: Vec::new(),
            dry_run: false,
        };
        let mut candidates: BTreeSet<PathBuf> = BTreeSet::new();
        let mut attempted = 0;

        for instruction in record
            .instructions
            .iter_mut()
            .filter(|i| i.status == InstructionStatus::Pending)
        {
            match apply_action(&base, &instruction.action, &mut candidates) {
                Ok(()) => {
                    tracing::debug!(
                        action = %instruction.kind(),
                        target = %instruction.target.display(),
                        "Applied instruction"
                    );
                    instruction.mark_applied();
                    summary.applied += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        action = %instruction.kind(),
                        target = %instruction.target.display(),
                        "Instruction failed: {}",
                        e
                    );
                    instruction.mark_failed(e.to_string());
                    summary.failed += 1;
                    summary.errors.push(ApplyFailure {
                        instruction_id: instruction.id,
                        action: instruction.kind(),
                        target: instruction.target.clone(),
                        error: e.to_string(),
                    });
                }
            }

            attempted += 1;
            if let Some(callback) = progress {
                callback(attempted, total);
            }
        }

        summary.removed_dirs = cleanup_empty_dirs(&base, candidates);

        let final_status = if summary.failed == 0 {
            SessionStatus::Done
        } else {
            SessionStatus::Failed
        };
        record.session.transition(final_status)?;

        tracing::info!(
            session = %session_id,
            applied = summary.applied,
            failed = summary.failed,
            removed_dirs = summary.removed_dirs.len(),
            status = %final_status,
            "Apply finished"
        );
        Ok(summary)
    }
}

fn apply_action(
    base: &Path,
    action: &Action,
    candidates: &mut BTreeSet<PathBuf>,
) -> std::result::Result<(), ApplyError> {
    match action {
        Action::CreateDir { .. } => {
            let dir = action.target(base);
            if dir.exists() && !dir.is_dir() {
                return Err(ApplyError::NotADirectory(dir));
            }
            fs::create_dir_all(&dir).map_err(|source| ApplyError::Io {
                action: "create directory",
                path: dir.clone(),
                source,
            })
        }
        Action::DeleteEmptyDir { .. } => {
            let dir = action.target(base);
            if !dir.exists() {
                return Err(ApplyError::DirectoryMissing(dir));
            }
            if !dir.is_dir() {
                return Err(ApplyError::NotADirectory(dir));
            }
            if !is_empty_dir(&dir).map_err(|source| ApplyError::Io {
                action: "read directory",
                path: dir.clone(),
                source,
            })? {
                return Err(ApplyError::DirectoryNotEmpty(dir));
            }
            fs::remove_dir(&dir).map_err(|source| ApplyError::Io {
                action: "remove directory",
                path: dir.clone(),
                source,
            })?;
            if let Some(parent) = dir.parent() {
                candidates.insert(parent.to_path_buf());
            }
            Ok(())
        }
        Action::MoveFile { .. } | Action::RenameFile { .. } => {
            let source = action.target(base);
            let destination = action.destination(base);
            move_file(&source, &destination)?;
            if let Some(parent) = source.parent() {
                candidates.insert(parent.to_path_buf());
            }
            Ok(())
        }
    }
}

/// Moves a file without ever overwriting. Rename is tried first, then
/// copy+remove for cross-device moves.
fn move_file(source: &Path, destination: &Path) -> std::result::Result<(), ApplyError> {
    if fs::symlink_metadata(source).is_err() {
        return Err(ApplyError::SourceMissing(source.to_path_buf()));
    }
    if source == destination {
        return Ok(());
    }
    if fs::symlink_metadata(destination).is_ok() {
        return Err(ApplyError::DestinationExists(destination.to_path_buf()));
    }

    if let Some(parent) = destination.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|source| ApplyError::Io {
            action: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }

    if let Err(e) = fs::rename(source, destination) {
        tracing::debug!(
            source = %source.display(),
            error = %e,
            "Rename failed, falling back to copy"
        );
        fs::copy(source, destination).map_err(|e| ApplyError::Io {
            action: "copy",
            path: source.to_path_buf(),
            source: e,
        })?;
        fs::remove_file(source).map_err(|e| ApplyError::Io {
            action: "remove source",
            path: source.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

fn is_empty_dir(dir: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

/// Removes empty candidate directories and then their parents, deepest
/// first, until nothing changes. `base` and anything outside it are kept.
fn cleanup_empty_dirs(base: &Path, candidates: BTreeSet<PathBuf>) -> Vec<PathBuf> {
    let mut queue: BTreeSet<(usize, PathBuf)> = candidates
        .into_iter()
        .map(|dir| (dir.components().count(), dir))
        .collect();
    let mut removed = Vec::new();

    while let Some((_, dir)) = queue.pop_last() {
        if dir == base || !dir.starts_with(base) || !dir.is_dir() {
            continue;
        }

        match is_empty_dir(&dir) {
            Ok(true) => match fs::remove_dir(&dir) {
                Ok(()) => {
                    tracing::debug!(dir = %dir.display(), "Removed empty directory");
                    if let Some(parent) = dir.parent() {
                        queue.insert((parent.components().count(), parent.to_path_buf()));
                    }
                    removed.push(dir);
                }
                Err(e) => {
                    tracing::warn!("Failed to remove empty directory {}: {}", dir.display(), e);
                }
            },
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Failed to inspect directory {}: {}", dir.display(), e);
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;
    use crate::planner::PlanCompiler;
    use crate::session::Session;
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn planned(files: &[&str], recursive: bool) -> (TempDir, SessionRecord) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for file in files {
            let path = temp_dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, file).unwrap();
        }
        let mut record = SessionRecord::new(Session::new(temp_dir.path().to_path_buf(), recursive));
        PlanCompiler::default()
            .process(&mut record, "META", "BY_TYPE")
            .unwrap();
        (temp_dir, record)
    }

    fn with_instructions(temp_dir: &TempDir, actions: Vec<Action>) -> SessionRecord {
        let mut session = Session::new(temp_dir.path().to_path_buf(), false);
        session.status = SessionStatus::Planned;
        let mut record = SessionRecord::new(session);
        record.instructions = actions
            .into_iter()
            .map(|action| Instruction::new(record.session.id, temp_dir.path(), action))
            .collect();
        record
    }

    #[test]
    fn test_apply_scenario() {
        let (temp_dir, mut record) = planned(&["a.jpg", "b.txt", "c.unknownext"], false);
        let summary = ApplyExecutor::new().execute(&mut record, false, None).unwrap();

        assert_eq!(summary.applied, 6);
        assert_eq!(summary.failed, 0);
        assert_eq!(record.session.status, SessionStatus::Done);
        let root = temp_dir.path();
        assert!(root.join("Images/a.jpg").exists());
        assert!(root.join("Documents/Text/b.txt").exists());
        assert!(root.join("Other/c.unknownext").exists());
        assert!(!root.join("a.jpg").exists());
        assert!(root.exists());
        assert!(record.instructions.iter().all(|i| i.applied_at.is_some()));
    }

    #[test]
    fn test_missing_source_fails_only_that_instruction() {
        let (temp_dir, mut record) = planned(&["a.jpg", "b.txt", "c.unknownext"], false);
        fs::remove_file(temp_dir.path().join("b.txt")).unwrap();

        let summary = ApplyExecutor::new().execute(&mut record, false, None).unwrap();
        assert_eq!(summary.applied, 5);
        assert_eq!(summary.failed, 1);
        assert_eq!(record.session.status, SessionStatus::Failed);

        let failed = record
            .instructions
            .iter()
            .find(|i| i.status == InstructionStatus::Failed)
            .unwrap();
        assert!(failed.error.as_deref().unwrap().contains("source does not exist"));
        assert!(temp_dir.path().join("Images/a.jpg").exists());
        assert_eq!(summary.errors[0].instruction_id, failed.id);
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let (temp_dir, mut record) = planned(&["a.jpg", "b.txt"], false);
        let before = record.clone();

        let summary = ApplyExecutor::new().execute(&mut record, true, None).unwrap();
        assert!(summary.dry_run);
        assert_eq!(summary.skipped, 4);
        assert_eq!(summary.applied, 0);
        assert_eq!(record, before);
        assert!(temp_dir.path().join("a.jpg").exists());
        assert!(!temp_dir.path().join("Images").exists());
    }

    #[test]
    fn test_destination_exists_is_not_overwritten() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.jpg"), "new").unwrap();
        fs::create_dir(temp_dir.path().join("Images")).unwrap();
        fs::write(temp_dir.path().join("Images/a.jpg"), "old").unwrap();

        let mut record = with_instructions(
            &temp_dir,
            vec![Action::MoveFile {
                src: temp_dir.path().join("a.jpg"),
                dst: PathBuf::from("Images"),
            }],
        );
        let summary = ApplyExecutor::new().execute(&mut record, false, None).unwrap();
        assert_eq!(summary.failed, 1);
        assert!(summary.errors[0].error.contains("destination already exists"));
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("Images/a.jpg")).unwrap(),
            "old"
        );
    }

    #[test]
    fn test_rename_and_same_path_move() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("Images")).unwrap();
        fs::write(temp_dir.path().join("Images/a.jpg"), "a").unwrap();
        fs::write(temp_dir.path().join("b.jpg"), "b").unwrap();

        let mut record = with_instructions(
            &temp_dir,
            vec![
                Action::MoveFile {
                    src: temp_dir.path().join("Images/a.jpg"),
                    dst: PathBuf::from("Images"),
                },
                Action::RenameFile {
                    src: temp_dir.path().join("b.jpg"),
                    dst: PathBuf::from("Images/b_1.jpg"),
                },
            ],
        );
        let summary = ApplyExecutor::new().execute(&mut record, false, None).unwrap();
        assert_eq!(summary.applied, 2);
        assert!(temp_dir.path().join("Images/a.jpg").exists());
        assert!(temp_dir.path().join("Images/b_1.jpg").exists());
        assert!(summary.removed_dirs.is_empty());
    }

    #[test]
    fn test_delete_empty_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("empty")).unwrap();
        fs::create_dir(temp_dir.path().join("full")).unwrap();
        fs::write(temp_dir.path().join("full/x.txt"), "x").unwrap();

        let mut record = with_instructions(
            &temp_dir,
            vec![
                Action::DeleteEmptyDir {
                    path: PathBuf::from("empty"),
                },
                Action::DeleteEmptyDir {
                    path: PathBuf::from("full"),
                },
                Action::DeleteEmptyDir {
                    path: PathBuf::from("missing"),
                },
            ],
        );
        let summary = ApplyExecutor::new().execute(&mut record, false, None).unwrap();
        assert_eq!(summary.applied, 1);
        assert_eq!(summary.failed, 2);
        assert!(!temp_dir.path().join("empty").exists());
        assert!(temp_dir.path().join("full/x.txt").exists());
        assert!(summary.errors[0].error.contains("not empty"));
        assert!(summary.errors[1].error.contains("does not exist"));
    }

    #[test]
    fn test_cleanup_cascades_but_keeps_base_and_non_empty_dirs() {
        let (temp_dir, mut record) = planned(
            &["deep/er/est/a.jpg", "keep/b.txt", "keep/notes.md"],
            true,
        );
        // A file the plan does not know about keeps its directory alive.
        fs::write(temp_dir.path().join("keep/late.bin"), "x").unwrap();

        let summary = ApplyExecutor::new().execute(&mut record, false, None).unwrap();
        assert_eq!(summary.failed, 0);

        let root = temp_dir.path();
        assert!(!root.join("deep").exists());
        assert!(root.join("keep").exists());
        assert!(root.exists());
        assert_eq!(
            summary.removed_dirs,
            vec![
                root.join("deep/er/est"),
                root.join("deep/er"),
                root.join("deep")
            ]
        );
    }

    #[test]
    fn test_apply_requires_planned_session() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut record = with_instructions(&temp_dir, Vec::new());

        record.session.status = SessionStatus::Applying;
        assert!(matches!(
            ApplyExecutor::new().execute(&mut record, false, None),
            Err(Error::ApplyInProgress(_))
        ));

        record.session.status = SessionStatus::Done;
        assert!(matches!(
            ApplyExecutor::new().execute(&mut record, false, None),
            Err(Error::InvalidTransition { .. })
        ));

        record.session.status = SessionStatus::Analyzed;
        assert!(matches!(
            ApplyExecutor::new().execute(&mut record, true, None),
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_begin_claims_the_session_before_run() {
        let (_temp_dir, mut record) = planned(&["a.jpg"], false);
        let executor = ApplyExecutor::new();

        executor.begin(&mut record).unwrap();
        assert_eq!(record.session.status, SessionStatus::Applying);
        assert!(matches!(
            executor.begin(&mut record),
            Err(Error::ApplyInProgress(_))
        ));

        let summary = executor.run(&mut record, None).unwrap();
        assert_eq!(summary.applied, 2);
        assert_eq!(record.session.status, SessionStatus::Done);
        assert!(matches!(
            executor.run(&mut record, None),
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_progress_callback_sees_every_instruction() {
        let (_temp_dir, mut record) = planned(&["a.jpg", "b.txt"], false);
        let seen = RefCell::new(Vec::new());
        let callback = |done: usize, total: usize| seen.borrow_mut().push((done, total));

        ApplyExecutor::new()
            .execute(&mut record, false, Some(&callback))
            .unwrap();
        assert_eq!(seen.into_inner(), vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }
}
