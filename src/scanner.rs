//! Directory traversal feeding the descriptor builder.

use crate::config::CompiledFilters;
use crate::descriptor::{DescriptorBuilder, FileDescriptor};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walks a directory and describes every regular file found.
pub struct DirectoryScanner {
    builder: DescriptorBuilder,
    filters: CompiledFilters,
    /// Absolute paths never reported, such as the tool's own state files.
    skipped: Vec<PathBuf>,
}

impl DirectoryScanner {
    pub fn new(builder: DescriptorBuilder, filters: CompiledFilters) -> Self {
        Self {
            builder,
            filters,
            skipped: Vec::new(),
        }
    }

    /// Leaves the given files out of every scan.
    pub fn skip_paths<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.skipped
            .extend(paths.into_iter().filter_map(|p| std::path::absolute(p).ok()));
        self
    }

    fn is_skipped(&self, path: &Path) -> bool {
        !self.skipped.is_empty()
            && std::path::absolute(path).is_ok_and(|path| self.skipped.contains(&path))
    }

    /// Scans `root`, immediate children only unless `recursive` is set.
    ///
    /// Symlinks are not followed. A file that cannot be described is logged
    /// and skipped. Descriptors come back sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDirectory`] if `root` does not exist or is not
    /// a directory.
    pub fn scan(&self, root: &Path, recursive: bool) -> Result<Vec<FileDescriptor>> {
        if !root.exists() {
            return Err(Error::InvalidDirectory {
                path: root.to_path_buf(),
                reason: "directory does not exist".to_string(),
            });
        }
        if !root.is_dir() {
            return Err(Error::InvalidDirectory {
                path: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        let paths = self.collect_paths(root, recursive);
        tracing::info!(
            root = %root.display(),
            recursive,
            files = paths.len(),
            "Collected files to describe"
        );

        let mut descriptors: Vec<FileDescriptor> = paths
            .par_iter()
            .filter_map(|path| match self.builder.build(path) {
                Ok(descriptor) => Some(descriptor),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            })
            .collect();

        descriptors.sort_by(|a, b| a.original_path.cmp(&b.original_path));
        Ok(descriptors)
    }

    fn collect_paths(&self, root: &Path, recursive: bool) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(root).min_depth(1).follow_links(false);
        if !recursive {
            walker = walker.max_depth(1);
        }

        walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| !self.is_skipped(entry.path()))
            .filter(|entry| {
                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                self.filters.should_include(relative)
            })
            .map(|entry| entry.into_path())
            .collect()
    }
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self::new(DescriptorBuilder::default(), CompiledFilters::allow_all())
    }
}
