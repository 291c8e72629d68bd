//! Rule engine for the analysis pipeline.
//!
//! A [`Linter`] is the explicit initialization handle the orchestrator
//! requires: it is built once from the host's rule configuration and then
//! shared across analyses. Configuration failures surface at construction
//! time, so an analysis can never run against stale or undefined rule
//! state.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::analysis::FileType;
use crate::highlight::{self, SymbolHighlight};
use crate::metrics;
use crate::parser::ParsedSource;

mod no_extra_semi;
mod unused_import;

pub use no_extra_semi::NoExtraSemi;
pub use unused_import::UnusedImport;

/// A lint-reported issue. Positions are 1-based lines and columns with an
/// exclusive end; `start`/`end` byte offsets are derived downstream by the
/// bridge adapters, never by rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub rule_id: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetadata {
    pub key: &'static str,
    pub description: &'static str,
}

pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;
    fn check(&self, source: &ParsedSource) -> Vec<Issue>;
}

#[macro_export]
macro_rules! declare_rule {
    (
        $name:ident,
        key = $key:literal,
        description = $desc:literal
    ) => {
        pub struct $name {
            metadata: $crate::linter::RuleMetadata,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    metadata: $crate::linter::RuleMetadata {
                        key: $key,
                        description: $desc,
                    },
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// The `/init-linter` payload: which rule keys are active, for which
/// file-type targets, and the environment/global declarations the host
/// carries along.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinterConfig {
    pub rules: Vec<RuleActivation>,
    pub environments: Vec<String>,
    pub globals: Vec<String>,
}

impl LinterConfig {
    /// Activates every bundled rule for both file types.
    pub fn default_rules() -> Self {
        Self {
            rules: vec![
                RuleActivation::new("no-extra-semi", &[FileType::Main, FileType::Test]),
                RuleActivation::new("unused-import", &[FileType::Main, FileType::Test]),
            ],
            environments: Vec::new(),
            globals: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleActivation {
    pub key: String,
    #[serde(default)]
    pub configurations: Vec<serde_json::Value>,
    #[serde(default = "default_file_type_target")]
    pub file_type_target: Vec<FileType>,
}

impl RuleActivation {
    pub fn new(key: &str, targets: &[FileType]) -> Self {
        Self {
            key: key.to_string(),
            configurations: Vec::new(),
            file_type_target: targets.to_vec(),
        }
    }
}

fn default_file_type_target() -> Vec<FileType> {
    vec![FileType::Main]
}

#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error("unknown rule key '{0}'")]
    UnknownRule(String),
    #[error("analysis engine fault: {0}")]
    CompilerFault(String),
}

/// Everything one lint pass produces: the issues themselves plus the
/// symbol highlighting and cognitive complexity the metrics selection
/// consumes.
#[derive(Debug)]
pub struct LintResult {
    pub issues: Vec<Issue>,
    pub highlighted_symbols: Vec<SymbolHighlight>,
    pub cognitive_complexity: Option<u32>,
}

struct ActiveRule {
    rule: Box<dyn Rule>,
    targets: Vec<FileType>,
}

pub struct Linter {
    rules: Vec<ActiveRule>,
    config: LinterConfig,
}

impl std::fmt::Debug for Linter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linter")
            .field("rules", &self.rules.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Linter {
    pub fn from_config(config: LinterConfig) -> Result<Self, LintError> {
        let mut rules = Vec::new();

        for activation in &config.rules {
            let rule = bundled_rule(&activation.key)
                .ok_or_else(|| LintError::UnknownRule(activation.key.clone()))?;
            rules.push(ActiveRule {
                rule,
                targets: activation.file_type_target.clone(),
            });
        }

        tracing::debug!(
            rules = rules.len(),
            environments = config.environments.len(),
            globals = config.globals.len(),
            "linter initialized"
        );

        Ok(Self { rules, config })
    }

    /// Registers a rule outside the bundled set.
    pub fn register(&mut self, rule: Box<dyn Rule>, targets: &[FileType]) {
        self.rules.push(ActiveRule {
            rule,
            targets: targets.to_vec(),
        });
    }

    pub fn config(&self) -> &LinterConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule targeting `file_type` over the source, plus the
    /// engine-internal symbol and cognitive-complexity passes.
    ///
    /// Rule and pass bodies run behind an unwind guard: a panic raised
    /// inside the engine surfaces as [`LintError::CompilerFault`] so the
    /// orchestrator can reclassify it instead of tearing down the worker.
    pub fn lint(
        &self,
        source: &ParsedSource,
        file_path: &str,
        file_type: FileType,
    ) -> Result<LintResult, LintError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut issues = Vec::new();
            for active in &self.rules {
                if active.targets.contains(&file_type) {
                    issues.extend(active.rule.check(source));
                }
            }

            LintResult {
                issues,
                highlighted_symbols: highlight::symbol_highlighting(source),
                cognitive_complexity: Some(metrics::cognitive_complexity(source)),
            }
        }));

        match outcome {
            Ok(result) => {
                tracing::debug!(file_path, issues = result.issues.len(), "lint complete");
                Ok(result)
            }
            Err(payload) => Err(LintError::CompilerFault(panic_message(payload))),
        }
    }
}

fn bundled_rule(key: &str) -> Option<Box<dyn Rule>> {
    match key {
        "no-extra-semi" => Some(Box::new(NoExtraSemi::new())),
        "unused-import" => Some(Box::new(UnusedImport::new())),
        _ => None,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unrecoverable engine fault".to_string()
    }
}
