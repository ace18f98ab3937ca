//! Scan → extract → group, persisted against a session record.
//!
//! The compiler mutates the record it is given. Callers run it inside
//! [`SessionStore::transaction`](crate::store::SessionStore::transaction) so
//! that a failed pass leaves no partial descriptors or instructions behind.

use crate::error::{Error, Result};
use crate::extractor::Description;
use crate::instruction::Instruction;
use crate::registry::Registry;
use crate::scanner::DirectoryScanner;
use crate::session::SessionStatus;
use crate::store::SessionRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many description summaries an analysis reports back.
const EXAMPLE_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub files_analyzed: usize,
    pub description_examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub files_analyzed: usize,
    pub actions_created: usize,
    /// Action name → number of instructions with that action.
    pub breakdown: BTreeMap<String, usize>,
    /// True when the session already had a plan and nothing was generated.
    pub already_planned: bool,
}

impl PlanSummary {
    fn from_record(record: &SessionRecord, already_planned: bool) -> Self {
        let mut breakdown = BTreeMap::new();
        for instruction in &record.instructions {
            *breakdown
                .entry(instruction.kind().as_str().to_string())
                .or_insert(0) += 1;
        }
        Self {
            files_analyzed: record.session.files_total,
            actions_created: record.instructions.len(),
            breakdown,
            already_planned,
        }
    }
}

/// Builds descriptors, descriptions and instructions for a session.
pub struct PlanCompiler {
    scanner: DirectoryScanner,
    registry: Registry,
}

impl PlanCompiler {
    pub fn new(scanner: DirectoryScanner, registry: Registry) -> Self {
        Self { scanner, registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Scans the session directory and describes every file with `method_id`.
    ///
    /// Replaces any descriptors and descriptions from an earlier analysis.
    pub fn analyze(&self, record: &mut SessionRecord, method_id: &str) -> Result<AnalysisSummary> {
        let method = self.registry.method(method_id)?;
        record.session.transition(SessionStatus::Analyzing)?;

        let descriptors = self
            .scanner
            .scan(&record.session.directory, record.session.recursive)?;
        let descriptions: Vec<Description> = descriptors.iter().map(|d| method.run(d)).collect();

        tracing::info!(
            session = %record.session.id,
            method = method.id(),
            files = descriptors.len(),
            "Analysis complete"
        );

        record.session.files_total = descriptors.len();
        record.session.analysis_method = Some(method.id().to_string());
        record.descriptors = descriptors;
        record.descriptions = descriptions;
        record.session.transition(SessionStatus::Analyzed)?;

        Ok(AnalysisSummary {
            files_analyzed: record.session.files_total,
            description_examples: record
                .descriptions
                .iter()
                .take(EXAMPLE_COUNT)
                .map(|d| d.summary.clone())
                .collect(),
        })
    }

    /// Runs `algorithm_id` over the stored descriptions and persists the
    /// resulting instructions.
    ///
    /// A session that already has a plan is acknowledged without generating
    /// anything.
    pub fn plan(&self, record: &mut SessionRecord, algorithm_id: &str) -> Result<PlanSummary> {
        if record.session.status.has_plan() {
            tracing::info!(
                session = %record.session.id,
                status = %record.session.status,
                "Session already planned, keeping existing instructions"
            );
            return Ok(PlanSummary::from_record(record, true));
        }

        if !record.session.status.can_transition_to(SessionStatus::Planned) {
            return Err(Error::InvalidTransition {
                from: record.session.status,
                to: SessionStatus::Planned,
            });
        }

        let algorithm = self.registry.algorithm(algorithm_id)?;
        let actions = algorithm.run(&record.session.directory, &record.descriptions)?;
        let session_id = record.session.id;
        let base = record.session.directory.clone();
        record.instructions = actions
            .into_iter()
            .map(|action| Instruction::new(session_id, &base, action))
            .collect();
        record.session.actions_total = record.instructions.len();
        record.session.struct_algorithm = Some(algorithm.id().to_string());
        record.session.transition(SessionStatus::Planned)?;

        tracing::info!(
            session = %session_id,
            algorithm = algorithm.id(),
            actions = record.instructions.len(),
            "Plan compiled"
        );
        Ok(PlanSummary::from_record(record, false))
    }

    /// Analysis followed by planning.
    ///
    /// Like [`plan`](Self::plan), a session that already has a plan is
    /// acknowledged as is; it is not analyzed again.
    pub fn process(
        &self,
        record: &mut SessionRecord,
        method_id: &str,
        algorithm_id: &str,
    ) -> Result<PlanSummary> {
        if record.session.status.has_plan() {
            return self.plan(record, algorithm_id);
        }
        self.analyze(record, method_id)?;
        self.plan(record, algorithm_id)
    }
}

impl Default for PlanCompiler {
    fn default() -> Self {
        Self::new(DirectoryScanner::default(), Registry::default())
    }
}
