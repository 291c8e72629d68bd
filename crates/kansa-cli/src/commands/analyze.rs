//! Analyze command - runs the analysis pipeline over a single file.

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use kansa_core::analysis::{AnalysisInput, Analyzer, FileType, ToolingMode};
use kansa_core::config::{CONFIG_FILENAME, Config};
use kansa_core::linter::{Linter, LinterConfig};
use kansa_core::parser::detect_language;

use crate::output::pretty;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the file to analyze
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// How the file is classified for rule targeting and metrics
    #[arg(long, value_enum, default_value = "main")]
    pub file_type: FileTypeArg,

    /// Compute NOSONAR metrics only, skipping highlights and CPD tokens
    #[arg(long)]
    pub lint_only: bool,

    /// Output format for the analysis result
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Path to a kansa.toml configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTypeArg {
    Main,
    Test,
}

impl From<FileTypeArg> for FileType {
    fn from(value: FileTypeArg) -> Self {
        match value {
            FileTypeArg::Main => FileType::Main,
            FileTypeArg::Test => FileType::Test,
        }
    }
}

impl AnalyzeArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(&self.path)?;
        let linter = Linter::from_config(self.linter_config()?)?;
        let analyzer = Analyzer::new(linter);

        let file_path = self.path.to_string_lossy().to_string();
        let mut input = AnalysisInput::new(&file_path, &content);
        input.file_type = self.file_type.into();
        input.tooling_mode = if self.lint_only {
            ToolingMode::LintOnly
        } else {
            ToolingMode::Standard
        };

        let output = analyzer.analyze(&input, detect_language(&file_path))?;

        match self.format.as_str() {
            "pretty" => print!("{}", pretty::render(&output, &file_path)),
            _ => println!("{}", serde_json::to_string_pretty(&output)?),
        }

        Ok(())
    }

    fn linter_config(&self) -> anyhow::Result<LinterConfig> {
        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => {
                let default = PathBuf::from(CONFIG_FILENAME);
                default.exists().then_some(default)
            }
        };

        match path {
            Some(path) => {
                let result = Config::load_from(&path)?;
                for warning in &result.warnings {
                    tracing::warn!("{warning}");
                }
                Ok(result.config.to_linter_config())
            }
            None => Ok(LinterConfig::default_rules()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_for(path: &PathBuf) -> AnalyzeArgs {
        AnalyzeArgs {
            path: path.clone(),
            file_type: FileTypeArg::Main,
            lint_only: false,
            format: "json".to_string(),
            config: None,
        }
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn run_analyzes_a_javascript_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "sample.js", "var x = 1;;\n");

        let result = args_for(&path).run();

        assert!(result.is_ok());
    }

    #[test]
    fn run_fails_for_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.js");

        let result = args_for(&path).run();

        assert!(result.is_err());
    }

    #[test]
    fn run_uses_an_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_file(&dir, "sample.js", "var x = 1;\n");
        let config = write_file(
            &dir,
            "kansa.toml",
            "[[linter.rules]]\nkey = \"no-extra-semi\"\n",
        );

        let mut args = args_for(&source);
        args.config = Some(config);

        assert!(args.run().is_ok());
    }

    #[test]
    fn run_rejects_configs_with_unknown_rules() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_file(&dir, "sample.js", "var x = 1;\n");
        let config = write_file(
            &dir,
            "kansa.toml",
            "[[linter.rules]]\nkey = \"no-such-rule\"\n",
        );

        let mut args = args_for(&source);
        args.config = Some(config);

        assert!(args.run().is_err());
    }

    #[test]
    fn file_type_arg_maps_to_the_core_enum() {
        assert_eq!(FileType::from(FileTypeArg::Main), FileType::Main);
        assert_eq!(FileType::from(FileTypeArg::Test), FileType::Test);
    }
}
