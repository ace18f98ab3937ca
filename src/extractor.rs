//! Analysis methods: turn a raw descriptor into an enriched description.

use crate::descriptor::FileDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The output of a [`MethodExtractor`] for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub descriptor: FileDescriptor,
    /// Registry id of the method that produced this description.
    pub method: String,
    /// One-line human readable summary.
    pub summary: String,
    pub attributes: BTreeMap<String, String>,
}

impl Description {
    /// Looks up a field by name: extracted attributes first, then the
    /// descriptor's own fields.
    pub fn field(&self, name: &str) -> Option<String> {
        if let Some(value) = self.attributes.get(name) {
            return Some(value.clone());
        }
        let d = &self.descriptor;
        match name {
            "file_hash" => d.file_hash.clone(),
            "filename" => Some(d.filename.clone()),
            "original_path" => Some(d.original_path.to_string_lossy().to_string()),
            "file_type" => Some(d.file_type.clone()),
            "mime_type" => Some(d.mime_type.clone()),
            "size_bytes" => Some(d.size_bytes.to_string()),
            "extension" => d.extension(),
            _ => None,
        }
    }
}

/// A stateless analysis method.
pub trait MethodExtractor: Send + Sync {
    /// Registry id of this method.
    fn id(&self) -> &'static str;

    fn run(&self, file: &FileDescriptor) -> Description;
}

fn describe(
    method: &'static str,
    file: &FileDescriptor,
    summary: String,
    attributes: &[(&str, String)],
) -> Description {
    Description {
        descriptor: file.clone(),
        method: method.to_string(),
        summary,
        attributes: attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    }
}

/// Size, type and MIME type.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetaExtractor;

impl MethodExtractor for MetaExtractor {
    fn id(&self) -> &'static str {
        "META"
    }

    fn run(&self, file: &FileDescriptor) -> Description {
        let summary = format!(
            "{} – size: {} B, type: {}, mime: {}",
            file.filename, file.size_bytes, file.file_type, file.mime_type
        );
        describe(
            self.id(),
            file,
            summary,
            &[
                ("size_bytes", file.size_bytes.to_string()),
                ("file_type", file.file_type.clone()),
                ("mime_type", file.mime_type.clone()),
            ],
        )
    }
}

/// Extension and location depth.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructExtractor;

impl MethodExtractor for StructExtractor {
    fn id(&self) -> &'static str {
        "STRUCT"
    }

    fn run(&self, file: &FileDescriptor) -> Description {
        let depth = file.original_path.components().count();
        let summary = format!(
            "{} structure: extension={}; path depth={}",
            file.filename, file.file_type, depth
        );
        describe(
            self.id(),
            file,
            summary,
            &[
                ("extension", file.extension().unwrap_or_default()),
                ("path_depth", depth.to_string()),
                ("mime_type", file.mime_type.clone()),
            ],
        )
    }
}

/// Extension as written plus MIME type.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeExtractor;

impl MethodExtractor for TypeExtractor {
    fn id(&self) -> &'static str {
        "TYPE"
    }

    fn run(&self, file: &FileDescriptor) -> Description {
        let real_extension = file.extension().unwrap_or_default();
        let summary = format!("{}: .{} ({})", file.filename, real_extension, file.mime_type);
        describe(
            self.id(),
            file,
            summary,
            &[
                ("real_extension", real_extension),
                ("mime_type", file.mime_type.clone()),
            ],
        )
    }
}
