use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::datatypes::ConstructorName;
use crate::{return_config_error, return_file_error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "weft.toml";

/// A snapshot of the host's configuration, passed into inference when it starts.
/// Nothing in the engine reads configuration from anywhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceConfig {
    pub features: FeatureToggles,
    pub inference: InferenceOptions,
}

/// Which type constructors the host has enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureToggles {
    pub vectors: bool,
    pub iterators: bool,
    pub options: bool,
    pub cells: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        FeatureToggles {
            vectors: true,
            iterators: true,
            options: true,
            cells: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceOptions {
    /// Feed values handed back by inserted lifetime terminations into drop nodes
    pub insert_implicit_drops: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        InferenceOptions {
            insert_implicit_drops: true,
        }
    }
}

impl FeatureToggles {
    pub fn is_enabled(&self, constructor: ConstructorName) -> bool {
        match constructor {
            ConstructorName::Vector => self.vectors,
            ConstructorName::Iterator => self.iterators,
            ConstructorName::Option => self.options,
            ConstructorName::LockingCell | ConstructorName::NonLockingCell => self.cells,
        }
    }
}

impl InferenceConfig {
    pub fn from_toml_str(source: &str) -> Result<InferenceConfig, CompilerError> {
        match toml::from_str::<InferenceConfig>(source) {
            Ok(config) => Ok(config),
            Err(error) => return_config_error!(
                format!("Could not parse inference config: {error}"),
                {
                    CompilationStage => "Configuration",
                    PrimarySuggestion => "Only [features] and [inference] tables are recognised",
                }
            ),
        }
    }

    pub fn from_file(path: &Path) -> Result<InferenceConfig, CompilerError> {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(error) => return_file_error!(path, format!("Could not read config: {error}")),
        };

        Self::from_toml_str(&source)
    }

    pub fn is_enabled(&self, constructor: ConstructorName) -> bool {
        self.features.is_enabled(constructor)
    }
}
