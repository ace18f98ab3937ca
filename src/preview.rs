//! Nested view of what a plan will produce.

use crate::instruction::{Action, Instruction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path};

/// A directory (segment → child) or an annotated leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreviewNode {
    Dir(BTreeMap<String, PreviewNode>),
    Leaf(String),
}

impl PreviewNode {
    pub fn empty() -> Self {
        PreviewNode::Dir(BTreeMap::new())
    }

    pub fn children(&self) -> Option<&BTreeMap<String, PreviewNode>> {
        match self {
            PreviewNode::Dir(children) => Some(children),
            PreviewNode::Leaf(_) => None,
        }
    }

    /// Follows `path` segment by segment.
    pub fn get(&self, path: &str) -> Option<&PreviewNode> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, segment| node.children()?.get(segment))
    }
}

/// Builds the preview tree for `instructions`, with paths shown relative to
/// `base`. Reads nothing from the filesystem.
pub fn build_preview(instructions: &[Instruction], base: &Path) -> PreviewNode {
    let entries: Vec<(Vec<String>, Option<String>)> = instructions
        .iter()
        .map(|instruction| {
            let action = &instruction.action;
            let note = match action {
                Action::CreateDir { .. } => None,
                Action::DeleteEmptyDir { .. } => Some("delete if empty".to_string()),
                Action::MoveFile { src, .. } => Some(format!("move from {}", src.display())),
                Action::RenameFile { src, .. } => Some(format!("rename from {}", src.display())),
            };
            (segments(&action.destination(base), base), note)
        })
        .collect();

    let level: Vec<(&[String], Option<&String>)> = entries
        .iter()
        .map(|(segments, note)| (segments.as_slice(), note.as_ref()))
        .collect();
    PreviewNode::Dir(build_level(level))
}

/// Groups entries by their first segment. A name with entries below it is a
/// directory; otherwise the last note for it becomes the leaf.
fn build_level(entries: Vec<(&[String], Option<&String>)>) -> BTreeMap<String, PreviewNode> {
    let mut groups: BTreeMap<&String, Vec<(&[String], Option<&String>)>> = BTreeMap::new();
    for (segments, note) in entries {
        if let Some((first, rest)) = segments.split_first() {
            groups.entry(first).or_default().push((rest, note));
        }
    }

    groups
        .into_iter()
        .map(|(name, members)| {
            let deeper: Vec<_> = members
                .iter()
                .filter(|(rest, _)| !rest.is_empty())
                .copied()
                .collect();
            let node = if !deeper.is_empty() {
                PreviewNode::Dir(build_level(deeper))
            } else {
                match members.iter().rev().find_map(|(_, note)| *note) {
                    Some(note) => PreviewNode::Leaf(note.clone()),
                    None => PreviewNode::empty(),
                }
            };
            (name.clone(), node)
        })
        .collect()
}

fn segments(path: &Path, base: &Path) -> Vec<String> {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().to_string()),
            _ => None,
        })
        .collect()
}
