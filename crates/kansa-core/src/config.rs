//! Configuration loading and parsing for Kansa
//!
//! Provides functionality to load and parse `kansa.toml` configuration
//! files into the linter's activation payload.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analysis::FileType;
use crate::linter::{LinterConfig, RuleActivation};

pub const CONFIG_FILENAME: &str = "kansa.toml";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["linter"];
const KNOWN_LINTER_KEYS: &[&str] = &["environments", "globals", "rules"];
const KNOWN_RULE_KEYS: &[&str] = &["key", "configurations", "file_type_target"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub linter: LinterSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinterSection {
    pub environments: Vec<String>,
    pub globals: Vec<String>,
    pub rules: Vec<RuleEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RuleEntry {
    pub key: String,
    #[serde(default)]
    pub configurations: Vec<toml::Value>,
    #[serde(default = "default_targets")]
    pub file_type_target: Vec<FileType>,
}

fn default_targets() -> Vec<FileType> {
    vec![FileType::Main]
}

impl Config {
    pub fn load_from(path: &Path) -> Result<ConfigResult, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<ConfigResult, ConfigError> {
        let value: toml::Value =
            toml::from_str(content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let warnings = collect_unknown_key_warnings(&value);

        let config: Config = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(ConfigResult { config, warnings })
    }

    /// Converts the file form into the linter's activation payload.
    pub fn to_linter_config(&self) -> LinterConfig {
        LinterConfig {
            rules: self
                .linter
                .rules
                .iter()
                .map(|entry| {
                    let mut activation =
                        RuleActivation::new(&entry.key, &entry.file_type_target);
                    activation.configurations = entry
                        .configurations
                        .iter()
                        .filter_map(|value| serde_json::to_value(value.clone()).ok())
                        .collect();
                    activation
                })
                .collect(),
            environments: self.linter.environments.clone(),
            globals: self.linter.globals.clone(),
        }
    }
}

fn collect_unknown_key_warnings(value: &toml::Value) -> Vec<String> {
    let mut warnings = Vec::new();

    let Some(table) = value.as_table() else {
        return warnings;
    };

    for key in table.keys() {
        if !KNOWN_TOP_LEVEL_KEYS.contains(&key.as_str()) {
            warnings.push(format!("Unknown configuration key '{key}'"));
        }
    }

    if let Some(linter) = table.get("linter").and_then(|v| v.as_table()) {
        for key in linter.keys() {
            if !KNOWN_LINTER_KEYS.contains(&key.as_str()) {
                warnings.push(format!("Unknown configuration key 'linter.{key}'"));
            }
        }

        if let Some(rules) = linter.get("rules").and_then(|v| v.as_array()) {
            for rule in rules.iter().filter_map(|r| r.as_table()) {
                for key in rule.keys() {
                    if !KNOWN_RULE_KEYS.contains(&key.as_str()) {
                        warnings
                            .push(format!("Unknown configuration key 'linter.rules.{key}'"));
                    }
                }
            }
        }
    }

    warnings
}
