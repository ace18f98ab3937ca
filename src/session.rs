//! Session lifecycle and its state machine.
//!
//! A session is one reorganization task scoped to a directory. Its status only
//! moves along the edges allowed by [`SessionStatus::can_transition_to`].

use crate::error::{Error, ParseEnumError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Created, nothing scanned yet.
    New,
    /// Scan and extraction in progress.
    Analyzing,
    /// Descriptors and descriptions are stored.
    Analyzed,
    /// Instructions are stored and pending.
    Planned,
    /// Instructions are being applied.
    Applying,
    /// Applied with zero failures.
    Done,
    /// Applied with at least one failure.
    Failed,
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 7] = [
        SessionStatus::New,
        SessionStatus::Analyzing,
        SessionStatus::Analyzed,
        SessionStatus::Planned,
        SessionStatus::Applying,
        SessionStatus::Done,
        SessionStatus::Failed,
    ];

    /// Returns the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::New => "NEW",
            SessionStatus::Analyzing => "ANALYZING",
            SessionStatus::Analyzed => "ANALYZED",
            SessionStatus::Planned => "PLANNED",
            SessionStatus::Applying => "APPLYING",
            SessionStatus::Done => "DONE",
            SessionStatus::Failed => "FAILED",
        }
    }

    /// Returns true if the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (New, Analyzing)
                | (Analyzed, Analyzing)
                | (Analyzing, Analyzed)
                | (Analyzed, Planned)
                | (Planned, Applying)
                | (Applying, Done)
                | (Applying, Failed)
        )
    }

    /// True once a plan exists, whatever happened to it afterwards.
    pub fn has_plan(&self) -> bool {
        matches!(
            self,
            SessionStatus::Planned
                | SessionStatus::Applying
                | SessionStatus::Done
                | SessionStatus::Failed
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "session status",
                value: s.to_string(),
            })
    }
}

/// One reorganization task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Absolute path of the directory being reorganized.
    pub directory: PathBuf,
    pub recursive: bool,
    pub analysis_method: Option<String>,
    pub struct_algorithm: Option<String>,
    pub status: SessionStatus,
    pub files_total: usize,
    pub actions_total: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new session in status `NEW`.
    pub fn new(directory: PathBuf, recursive: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            directory,
            recursive,
            analysis_method: None,
            struct_algorithm: None,
            status: SessionStatus::New,
            files_total: 0,
            actions_total: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the session to `next`, or fails with `InvalidTransition`.
    pub fn transition(&mut self, next: SessionStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        tracing::debug!(session = %self.id, from = %self.status, to = %next, "Session transition");
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Apply progress as reported to pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 0..=100, rounded down.
    pub percent: u8,
    pub status: SessionStatus,
}

impl Progress {
    /// Derives progress from the number of resolved instructions.
    pub fn compute(status: SessionStatus, resolved: usize, total: usize) -> Self {
        let percent = match status {
            SessionStatus::Done => 100,
            SessionStatus::Planned | SessionStatus::Applying | SessionStatus::Failed
                if total > 0 =>
            {
                (resolved.min(total) * 100 / total) as u8
            }
            _ => 0,
        };
        Self { percent, status }
    }
}
