//! Per-file metadata: content hash, MIME type, type classification and size.

use crate::config::ScanSettings;
use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// MIME type reported when the extension lookup has no answer.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// File type reported when neither the extension nor the header tells.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Immutable description of one scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Hex SHA-256 of the content; `None` when the file exceeded the hash limit.
    pub file_hash: Option<String>,
    pub filename: String,
    /// Absolute path at scan time.
    pub original_path: PathBuf,
    /// Lower-case extension, or a sniffed type for extensionless files.
    pub file_type: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl FileDescriptor {
    /// The extension as written, lower-cased, without the dot.
    pub fn extension(&self) -> Option<String> {
        self.original_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// Builds [`FileDescriptor`]s from paths.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    chunk_size: usize,
    max_hash_size: u64,
}

impl DescriptorBuilder {
    pub fn new(settings: &ScanSettings) -> Self {
        Self {
            chunk_size: settings.hash_chunk_size.max(1),
            max_hash_size: settings.max_hash_size,
        }
    }

    /// Describes a single file.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if the file metadata or content cannot be read.
    pub fn build(&self, path: &Path) -> Result<FileDescriptor, ScanError> {
        let scan_err = |source| ScanError {
            path: path.to_path_buf(),
            source,
        };

        let original_path = std::path::absolute(path).map_err(scan_err)?;
        let metadata = std::fs::metadata(&original_path).map_err(scan_err)?;
        let size_bytes = metadata.len();

        let file_hash = if size_bytes > self.max_hash_size {
            tracing::debug!(
                path = %original_path.display(),
                size_bytes,
                "Skipping content hash for large file"
            );
            None
        } else {
            Some(hash_file(&original_path, self.chunk_size).map_err(scan_err)?)
        };

        let filename = original_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let extension = original_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty());

        let mime_type = extension
            .as_deref()
            .and_then(|ext| mime_guess::from_ext(ext).first())
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        let file_type = match extension {
            Some(ext) => ext,
            None => sniff_type(&original_path),
        };

        Ok(FileDescriptor {
            file_hash,
            filename,
            original_path,
            file_type,
            mime_type,
            size_bytes,
        })
    }
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self::new(&ScanSettings::default())
    }
}

/// Computes the hex SHA-256 of a file, reading `chunk_size` bytes at a time.
pub fn hash_file(path: &Path, chunk_size: usize) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Classifies an extensionless file from its header.
fn sniff_type(path: &Path) -> String {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => kind.extension().to_string(),
        Ok(None) => UNKNOWN_TYPE.to_string(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Header sniff failed");
            UNKNOWN_TYPE.to_string()
        }
    }
}
