//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored messages,
//! the apply progress bar, summary tables and the preview tree. Every report
//! can also be printed as JSON.

use crate::executor::ApplySummary;
use crate::planner::{AnalysisSummary, PlanSummary};
use crate::preview::PreviewNode;
use crate::registry::StrategyInfo;
use crate::service::DirectoryListing;
use crate::session::{Progress, Session, SessionStatus};
use crate::store::SessionRecord;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use restruct::output::OutputFormatter;
    /// OutputFormatter::success("Plan applied");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Pretty-prints any report as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Creates a progress bar for applying `total` instructions.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }

    fn status(status: SessionStatus) -> ColoredString {
        match status {
            SessionStatus::Done => status.as_str().green(),
            SessionStatus::Failed => status.as_str().red(),
            SessionStatus::Applying | SessionStatus::Analyzing => status.as_str().yellow(),
            _ => status.as_str().cyan(),
        }
    }

    /// One line per session.
    pub fn session_list(sessions: &[&Session]) {
        if sessions.is_empty() {
            Self::plain("No sessions.");
            return;
        }
        for session in sessions {
            println!(
                "{}  {:<10} {}",
                session.id,
                Self::status(session.status),
                session.directory.display()
            );
        }
    }

    pub fn session_details(record: &SessionRecord) {
        let session = &record.session;
        Self::header(&format!("SESSION {}", session.id));
        println!("  Directory:  {}", session.directory.display());
        println!("  Recursive:  {}", session.recursive);
        println!("  Status:     {}", Self::status(session.status));
        println!(
            "  Method:     {}",
            session.analysis_method.as_deref().unwrap_or("-")
        );
        println!(
            "  Algorithm:  {}",
            session.struct_algorithm.as_deref().unwrap_or("-")
        );
        println!("  Files:      {}", session.files_total);
        println!(
            "  Actions:    {} ({} resolved)",
            session.actions_total,
            record.resolved_count()
        );
        println!("  Created:    {}", session.created_at.to_rfc3339());
        println!("  Updated:    {}", session.updated_at.to_rfc3339());

        let failed: Vec<_> = record
            .instructions
            .iter()
            .filter_map(|i| i.error.as_ref().map(|e| (i, e)))
            .collect();
        if !failed.is_empty() {
            Self::header("FAILED INSTRUCTIONS");
            for (instruction, error) in failed {
                println!(
                    "  {} {}: {}",
                    instruction.kind(),
                    instruction.target.display(),
                    error.red()
                );
            }
        }
    }

    pub fn analysis_summary(summary: &AnalysisSummary) {
        Self::success(&format!("Analyzed {} files", summary.files_analyzed));
        for example in &summary.description_examples {
            println!("  {}", example);
        }
    }

    /// Prints the per-action breakdown of a plan.
    pub fn plan_summary(summary: &PlanSummary) {
        if summary.already_planned {
            Self::warning("Session already planned; existing plan kept.");
        }
        Self::summary_table(&summary.breakdown, summary.actions_created);
        println!("Files analyzed: {}", summary.files_analyzed);
    }

    fn summary_table(counts: &BTreeMap<String, usize>, total: usize) {
        Self::header("PLAN");

        let width = counts.keys().map(|name| name.len()).max().unwrap_or(0).max(6);

        println!(
            "{:<width$} | {}",
            "Action".bold(),
            "Count".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));
        for (action, count) in counts {
            println!(
                "{:<width$} | {}",
                action,
                count.to_string().green(),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {}",
            "Total".bold(),
            total.to_string().green().bold(),
            width = width
        );
    }

    pub fn apply_summary(summary: &ApplySummary) {
        if summary.dry_run {
            Self::dry_run_notice(&format!(
                "{} pending instructions, nothing was changed.",
                summary.skipped
            ));
            return;
        }

        Self::header("APPLY");
        println!("  Applied: {}", summary.applied.to_string().green());
        println!("  Failed:  {}", summary.failed.to_string().red());
        for failure in &summary.errors {
            println!(
                "    - {} {}: {}",
                failure.action,
                failure.target.display(),
                failure.error
            );
        }
        if !summary.removed_dirs.is_empty() {
            println!("  Removed empty directories:");
            for dir in &summary.removed_dirs {
                println!("    - {}", dir.display());
            }
        }

        if summary.failed == 0 {
            Self::success("All instructions applied.");
        } else {
            Self::warning("Some instructions failed. Please review errors above.");
        }
    }

    /// Prints the preview tree with two-space indentation per level.
    pub fn preview_tree(tree: &PreviewNode) {
        match tree.children() {
            Some(children) if !children.is_empty() => Self::preview_level(children, 0),
            _ => Self::plain("Nothing planned."),
        }
    }

    fn preview_level(children: &BTreeMap<String, PreviewNode>, depth: usize) {
        let indent = "  ".repeat(depth);
        for (name, node) in children {
            match node {
                PreviewNode::Dir(grandchildren) => {
                    println!("{}{}/", indent, name.blue().bold());
                    Self::preview_level(grandchildren, depth + 1);
                }
                PreviewNode::Leaf(note) => {
                    println!("{}{}  {}", indent, name, format!("({})", note).dimmed());
                }
            }
        }
    }

    pub fn directory_listing(listing: &DirectoryListing) {
        Self::header(&listing.directory.display().to_string());
        if listing.entries.is_empty() {
            Self::plain("  (empty)");
        }
        for entry in &listing.entries {
            if entry.is_dir {
                println!("  {}/", entry.name.blue().bold());
            } else {
                println!("  {}", entry.name);
            }
        }
    }

    pub fn progress(progress: &Progress) {
        println!("{}% {}", progress.percent, Self::status(progress.status));
    }

    pub fn strategies(title: &str, entries: &[StrategyInfo]) {
        Self::header(title);
        for entry in entries {
            let flag = if entry.enabled {
                "enabled".green()
            } else {
                "disabled".red()
            };
            println!("  {:<10} {:<9} {}", entry.id, flag, entry.description);
        }
    }
}
