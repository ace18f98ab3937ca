//! restruct - plan, preview and apply directory reorganizations
//!
//! A session scans a directory, describes every file with an analysis method,
//! groups the descriptions with a structuring algorithm into an ordered list
//! of filesystem instructions, and applies that list while tolerating
//! per-instruction failures. Configuration comes from TOML files.

pub mod algorithm;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod extractor;
pub mod file_category;
pub mod instruction;
pub mod output;
pub mod planner;
pub mod preview;
pub mod registry;
pub mod scanner;
pub mod service;
pub mod session;
pub mod store;

pub use config::{AppConfig, CompiledFilters, ConfigError};
pub use error::{ApplyError, Error, Result};
pub use executor::{ApplyExecutor, ApplySummary};
pub use file_category::{Category, CategoryMapper};
pub use instruction::{Action, ActionKind, Instruction, InstructionStatus};
pub use planner::{AnalysisSummary, PlanCompiler, PlanSummary};
pub use preview::{PreviewNode, build_preview};
pub use service::{DirectoryEntry, DirectoryListing, SessionService};
pub use session::{Progress, Session, SessionStatus};
pub use store::{SessionRecord, SessionStore};
