//! Plan instructions: one atomic filesystem mutation each.
//!
//! Instructions are addressed by absolute path. Directory actions carry a
//! `path`, file actions carry `src` (absolute) and `dst` (relative to the
//! session base directory; a destination directory for moves, a destination
//! path for renames).

use crate::error::ParseEnumError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// The four supported actions, without their parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    CreateDir,
    DeleteEmptyDir,
    MoveFile,
    RenameFile,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::CreateDir,
        ActionKind::DeleteEmptyDir,
        ActionKind::MoveFile,
        ActionKind::RenameFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CreateDir => "CREATE_DIR",
            ActionKind::DeleteEmptyDir => "DELETE_EMPTY_DIR",
            ActionKind::MoveFile => "MOVE_FILE",
            ActionKind::RenameFile => "RENAME_FILE",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "action",
                value: s.to_string(),
            })
    }
}

/// An action together with its parameters.
///
/// Serialized as `{"action": "MOVE_FILE", "params": {"src": ..., "dst": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    CreateDir { path: PathBuf },
    DeleteEmptyDir { path: PathBuf },
    MoveFile { src: PathBuf, dst: PathBuf },
    RenameFile { src: PathBuf, dst: PathBuf },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::CreateDir { .. } => ActionKind::CreateDir,
            Action::DeleteEmptyDir { .. } => ActionKind::DeleteEmptyDir,
            Action::MoveFile { .. } => ActionKind::MoveFile,
            Action::RenameFile { .. } => ActionKind::RenameFile,
        }
    }

    /// The absolute path this action addresses, resolved against `base`.
    ///
    /// For file actions that is the source file; for directory actions the
    /// directory itself.
    pub fn target(&self, base: &Path) -> PathBuf {
        match self {
            Action::CreateDir { path } | Action::DeleteEmptyDir { path } => base.join(path),
            Action::MoveFile { src, .. } | Action::RenameFile { src, .. } => base.join(src),
        }
    }

    /// Final absolute location of the file or directory once applied.
    pub fn destination(&self, base: &Path) -> PathBuf {
        match self {
            Action::CreateDir { path } | Action::DeleteEmptyDir { path } => base.join(path),
            Action::MoveFile { src, dst } => {
                let dir = base.join(dst);
                match src.file_name() {
                    Some(name) => dir.join(name),
                    None => dir,
                }
            }
            Action::RenameFile { dst, .. } => base.join(dst),
        }
    }
}

/// Resolution state of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstructionStatus {
    Pending,
    Applied,
    Failed,
}

impl InstructionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstructionStatus::Pending => "PENDING",
            InstructionStatus::Applied => "APPLIED",
            InstructionStatus::Failed => "FAILED",
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, InstructionStatus::Pending)
    }
}

impl fmt::Display for InstructionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstructionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(InstructionStatus::Pending),
            "APPLIED" => Ok(InstructionStatus::Applied),
            "FAILED" => Ok(InstructionStatus::Failed),
            _ => Err(ParseEnumError {
                kind: "instruction status",
                value: s.to_string(),
            }),
        }
    }
}

/// A persisted instruction belonging to a session's plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: Uuid,
    pub session_id: Uuid,
    /// Absolute path of the file or directory this instruction addresses.
    pub target: PathBuf,
    #[serde(flatten)]
    pub action: Action,
    pub status: InstructionStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
}

impl Instruction {
    /// Creates a pending instruction for `session_id`.
    pub fn new(session_id: Uuid, base: &Path, action: Action) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            target: action.target(base),
            action,
            status: InstructionStatus::Pending,
            error: None,
            applied_at: None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn mark_applied(&mut self) {
        self.status = InstructionStatus::Applied;
        self.error = None;
        self.applied_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, reason: String) {
        self.status = InstructionStatus::Failed;
        self.error = Some(reason);
        self.applied_at = Some(Utc::now());
    }
}
