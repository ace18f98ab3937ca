//! Configuration loading and file filtering.
//!
//! Configuration is read from a TOML file. Every section is optional and falls
//! back to its defaults:
//!
//! ```toml
//! [defaults]
//! analysis_method = "META"
//! struct_algorithm = "BY_TYPE"
//! recursive = true
//!
//! [scan]
//! hash_chunk_size = 4096
//! max_hash_size = 52428800
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "**/node_modules/**"]
//! extensions = ["bak"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//!
//! [registry]
//! disabled_methods = ["SEMANTIC"]
//! disabled_algorithms = []
//! criteria_field = "mime_type"
//!
//! [store]
//! path = "/home/me/.config/restruct/sessions.json"
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub defaults: SessionDefaults,
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub filters: FilterRules,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub store: StoreSettings,
    /// Absolute path of the file this configuration was read from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Method, algorithm and recursion used when the caller does not pick one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDefaults {
    #[serde(default = "default_analysis_method")]
    pub analysis_method: String,
    #[serde(default = "default_struct_algorithm")]
    pub struct_algorithm: String,
    #[serde(default = "default_true")]
    pub recursive: bool,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            analysis_method: default_analysis_method(),
            struct_algorithm: default_struct_algorithm(),
            recursive: true,
        }
    }
}

fn default_analysis_method() -> String {
    "META".to_string()
}

fn default_struct_algorithm() -> String {
    "BY_TYPE".to_string()
}

fn default_true() -> bool {
    true
}

/// Tuning for descriptor building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Bytes read per hashing step.
    #[serde(default = "default_hash_chunk_size")]
    pub hash_chunk_size: usize,
    /// Files larger than this are described without a content hash.
    #[serde(default = "default_max_hash_size")]
    pub max_hash_size: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            hash_chunk_size: default_hash_chunk_size(),
            max_hash_size: default_max_hash_size(),
        }
    }
}

fn default_hash_chunk_size() -> usize {
    4096
}

fn default_max_hash_size() -> u64 {
    50 * 1024 * 1024
}

/// Enable flags and parameters for the strategy registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    #[serde(default = "default_disabled_methods")]
    pub disabled_methods: Vec<String>,
    #[serde(default)]
    pub disabled_algorithms: Vec<String>,
    /// Descriptor field the `CRITERIA` algorithm groups by.
    #[serde(default = "default_criteria_field")]
    pub criteria_field: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            disabled_methods: default_disabled_methods(),
            disabled_algorithms: Vec::new(),
            criteria_field: default_criteria_field(),
        }
    }
}

fn default_disabled_methods() -> Vec<String> {
    vec!["SEMANTIC".to_string()]
}

fn default_criteria_field() -> String {
    "mime_type".to_string()
}

/// Where the session store is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreSettings {
    /// The configured store path, or `~/.config/restruct/sessions.json`,
    /// or `.restruct_sessions.json` in the working directory without a home.
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home)
                .join(".config")
                .join("restruct")
                .join("sessions.json"),
            Err(_) => PathBuf::from(".restruct_sessions.json"),
        }
    }
}

/// File filtering rules applied by the scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_true")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist; overrides exclude rules.
    #[serde(default)]
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding files from a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp", "**/node_modules/**").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "bak", "tmp", "log").
    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl AppConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.restructrc.toml` in the current directory
    /// 3. Look for `~/.config/restruct/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".restructrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("restruct")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&content)?;
        config.source = std::path::absolute(path).ok();
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Compiled filter rules, ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    /// Compile filter rules, validating every glob and regex pattern.
    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Filters that accept every file.
    pub fn allow_all() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    /// Check if a file should be scanned.
    ///
    /// `file_path` is matched as given; the scanner passes paths relative to
    /// the scan root so that patterns like `logs/**` behave as expected.
    ///
    /// Include patterns win; then hidden files, exact filenames, extensions,
    /// glob patterns and regex patterns exclude in that order.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.matches_any(&self.include_patterns, file_path) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.matches_any(&self.exclude_patterns, file_path) {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }

    fn matches_any(&self, patterns: &[Pattern], file_path: &Path) -> bool {
        patterns.iter().any(|pattern| pattern.matches_path(file_path))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
