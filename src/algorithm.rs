//! Structuring algorithms: turn descriptions into an ordered action list.
//!
//! Every algorithm emits the `CREATE_DIR` instructions for its categories, in
//! first-encounter order, before any file instruction. File instructions
//! follow in input order. Two files that would land on the same name in the
//! same category are disambiguated with a `RENAME_FILE` to `name_1.ext`,
//! `name_2.ext`, and so on. A file that already sits at its destination keeps
//! its name; incoming files are renamed around it.

use crate::error::{Error, Result};
use crate::extractor::Description;
use crate::file_category::CategoryMapper;
use crate::instruction::Action;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A grouping strategy.
pub trait StructAlgorithm: Send + Sync {
    /// Registry id of this algorithm.
    fn id(&self) -> &'static str;

    /// Builds the ordered action list for `descriptions` of files under
    /// `base`.
    ///
    /// Directory paths and destinations are relative to `base`.
    fn run(&self, base: &Path, descriptions: &[Description]) -> Result<Vec<Action>>;
}

/// Groups files into the static extension category table.
#[derive(Debug, Clone, Default)]
pub struct ByTypeAlgorithm {
    mapper: CategoryMapper,
}

impl ByTypeAlgorithm {
    pub fn new(mapper: CategoryMapper) -> Self {
        Self { mapper }
    }
}

impl StructAlgorithm for ByTypeAlgorithm {
    fn id(&self) -> &'static str {
        "BY_TYPE"
    }

    fn run(&self, base: &Path, descriptions: &[Description]) -> Result<Vec<Action>> {
        Ok(group_by(base, descriptions, |description| {
            let file_type = &description.descriptor.file_type;
            PathBuf::from(self.mapper.categorize(Some(file_type)).dir_name())
        }))
    }
}

/// Groups files by the value of one description field.
#[derive(Debug, Clone)]
pub struct CriteriaAlgorithm {
    field: String,
}

impl CriteriaAlgorithm {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Default for CriteriaAlgorithm {
    fn default() -> Self {
        Self::new("mime_type")
    }
}

impl StructAlgorithm for CriteriaAlgorithm {
    fn id(&self) -> &'static str {
        "CRITERIA"
    }

    fn run(&self, base: &Path, descriptions: &[Description]) -> Result<Vec<Action>> {
        Ok(group_by(base, descriptions, |description| {
            category_path(description.field(&self.field).as_deref().unwrap_or(""))
        }))
    }
}

/// Similarity clustering. Registered but not implemented.
#[derive(Debug, Clone, Default)]
pub struct ClusterAlgorithm;

impl StructAlgorithm for ClusterAlgorithm {
    fn id(&self) -> &'static str {
        "CLUSTER"
    }

    fn run(&self, _base: &Path, _descriptions: &[Description]) -> Result<Vec<Action>> {
        Err(Error::NotImplemented(
            "CLUSTER algorithm has no implementation".to_string(),
        ))
    }
}

/// Turns a field value into a relative directory path.
///
/// `/` separates nesting levels. Characters other than alphanumerics and
/// `- _ . + space` become `_`. Empty, `.` and `..` segments are dropped.
/// An empty result maps to `Other`.
pub fn category_path(value: &str) -> PathBuf {
    let segments: Vec<String> = value
        .split('/')
        .map(|segment| {
            segment
                .trim()
                .chars()
                .map(|c| {
                    if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '+' | ' ') {
                        c
                    } else {
                        '_'
                    }
                })
                .collect::<String>()
        })
        .filter(|segment| !segment.is_empty() && segment != "." && segment != "..")
        .collect();

    if segments.is_empty() {
        return PathBuf::from("Other");
    }
    segments.iter().collect()
}

fn group_by<F>(base: &Path, descriptions: &[Description], category_of: F) -> Vec<Action>
where
    F: Fn(&Description) -> PathBuf,
{
    let categories: Vec<PathBuf> = descriptions.iter().map(&category_of).collect();

    // Files already in place hold their names before anything else claims them.
    let mut claimed: HashSet<PathBuf> = descriptions
        .iter()
        .zip(&categories)
        .map(|(description, category)| {
            (description, category.join(&description.descriptor.filename))
        })
        .filter(|(description, slot)| description.descriptor.original_path == base.join(slot))
        .map(|(_, slot)| slot)
        .collect();

    let mut dirs: Vec<Action> = Vec::new();
    let mut files: Vec<Action> = Vec::new();
    let mut seen_categories: HashSet<PathBuf> = HashSet::new();

    for (description, category) in descriptions.iter().zip(categories) {
        if seen_categories.insert(category.clone()) {
            dirs.push(Action::CreateDir {
                path: category.clone(),
            });
        }

        let src = description.descriptor.original_path.clone();
        let filename = &description.descriptor.filename;
        let slot = category.join(filename);
        if src == base.join(&slot) || claimed.insert(slot) {
            files.push(Action::MoveFile { src, dst: category });
        } else {
            let renamed = unique_name(&category, filename, &claimed);
            let dst = category.join(&renamed);
            claimed.insert(dst.clone());
            files.push(Action::RenameFile { src, dst });
        }
    }

    dirs.extend(files);
    dirs
}

fn unique_name(category: &Path, filename: &str, claimed: &HashSet<PathBuf>) -> String {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, counter, ext);
        if !claimed.contains(&category.join(&candidate)) {
            return candidate;
        }
        counter += 1;
    }
}
