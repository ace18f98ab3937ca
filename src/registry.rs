//! Static id → constructor tables for analysis methods and structuring
//! algorithms.
//!
//! Adding a strategy means adding one entry to [`METHODS`] or [`ALGORITHMS`].
//! Whether an entry may be selected is decided by [`RegistrySettings`].

use crate::algorithm::{ByTypeAlgorithm, ClusterAlgorithm, CriteriaAlgorithm, StructAlgorithm};
use crate::config::RegistrySettings;
use crate::error::{Error, Result};
use crate::extractor::{MetaExtractor, MethodExtractor, StructExtractor, TypeExtractor};
use serde::Serialize;

type MethodFactory = fn(&RegistrySettings) -> Result<Box<dyn MethodExtractor>>;
type AlgorithmFactory = fn(&RegistrySettings) -> Result<Box<dyn StructAlgorithm>>;

/// A registered analysis method.
pub struct MethodEntry {
    pub id: &'static str,
    pub description: &'static str,
    factory: MethodFactory,
}

/// A registered structuring algorithm.
pub struct AlgorithmEntry {
    pub id: &'static str,
    pub description: &'static str,
    factory: AlgorithmFactory,
}

pub static METHODS: &[MethodEntry] = &[
    MethodEntry {
        id: "META",
        description: "File metadata: size, type and MIME type",
        factory: meta,
    },
    MethodEntry {
        id: "STRUCT",
        description: "Structural data: extension and path depth",
        factory: structure,
    },
    MethodEntry {
        id: "TYPE",
        description: "Real extension and MIME type",
        factory: file_type,
    },
    MethodEntry {
        id: "SEMANTIC",
        description: "Content-based semantic analysis",
        factory: semantic,
    },
];

pub static ALGORITHMS: &[AlgorithmEntry] = &[
    AlgorithmEntry {
        id: "BY_TYPE",
        description: "Group files into category folders by extension",
        factory: by_type,
    },
    AlgorithmEntry {
        id: "CRITERIA",
        description: "Group files by the value of one descriptor field",
        factory: criteria,
    },
    AlgorithmEntry {
        id: "CLUSTER",
        description: "Group files by similarity",
        factory: cluster,
    },
];

fn meta(_: &RegistrySettings) -> Result<Box<dyn MethodExtractor>> {
    Ok(Box::new(MetaExtractor))
}

fn structure(_: &RegistrySettings) -> Result<Box<dyn MethodExtractor>> {
    Ok(Box::new(StructExtractor))
}

fn file_type(_: &RegistrySettings) -> Result<Box<dyn MethodExtractor>> {
    Ok(Box::new(TypeExtractor))
}

fn semantic(_: &RegistrySettings) -> Result<Box<dyn MethodExtractor>> {
    Err(Error::NotImplemented(
        "SEMANTIC analysis method has no implementation".to_string(),
    ))
}

fn by_type(_: &RegistrySettings) -> Result<Box<dyn StructAlgorithm>> {
    Ok(Box::new(ByTypeAlgorithm::default()))
}

fn criteria(settings: &RegistrySettings) -> Result<Box<dyn StructAlgorithm>> {
    Ok(Box::new(CriteriaAlgorithm::new(
        settings.criteria_field.clone(),
    )))
}

fn cluster(_: &RegistrySettings) -> Result<Box<dyn StructAlgorithm>> {
    Ok(Box::new(ClusterAlgorithm))
}

/// Listing row for the outer adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyInfo {
    pub id: String,
    pub description: String,
    pub enabled: bool,
}

/// Resolves strategy ids against the static tables.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    settings: RegistrySettings,
}

impl Registry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self { settings }
    }

    pub fn methods(&self) -> Vec<StrategyInfo> {
        METHODS
            .iter()
            .map(|entry| StrategyInfo {
                id: entry.id.to_string(),
                description: entry.description.to_string(),
                enabled: !is_listed(&self.settings.disabled_methods, entry.id),
            })
            .collect()
    }

    pub fn algorithms(&self) -> Vec<StrategyInfo> {
        ALGORITHMS
            .iter()
            .map(|entry| StrategyInfo {
                id: entry.id.to_string(),
                description: entry.description.to_string(),
                enabled: !is_listed(&self.settings.disabled_algorithms, entry.id),
            })
            .collect()
    }

    /// Builds the analysis method registered under `id`.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if the id is unknown or disabled. A method
    /// without an implementation yields [`Error::NotImplemented`].
    pub fn method(&self, id: &str) -> Result<Box<dyn MethodExtractor>> {
        let entry = METHODS
            .iter()
            .find(|entry| entry.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| Error::Configuration(format!("unknown analysis method '{}'", id)))?;
        if is_listed(&self.settings.disabled_methods, entry.id) {
            return Err(Error::Configuration(format!(
                "analysis method '{}' is disabled",
                entry.id
            )));
        }
        (entry.factory)(&self.settings)
    }

    /// Builds the structuring algorithm registered under `id`.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if the id is unknown or disabled.
    pub fn algorithm(&self, id: &str) -> Result<Box<dyn StructAlgorithm>> {
        let entry = ALGORITHMS
            .iter()
            .find(|entry| entry.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| {
                Error::Configuration(format!("unknown structuring algorithm '{}'", id))
            })?;
        if is_listed(&self.settings.disabled_algorithms, entry.id) {
            return Err(Error::Configuration(format!(
                "structuring algorithm '{}' is disabled",
                entry.id
            )));
        }
        (entry.factory)(&self.settings)
    }
}

fn is_listed(list: &[String], id: &str) -> bool {
    list.iter().any(|item| item.eq_ignore_ascii_case(id))
}
