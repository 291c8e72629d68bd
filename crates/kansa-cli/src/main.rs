//! Kansa CLI - command-line front end for the Kansa analysis pipeline.
//!
//! Runs one analysis unit at a time and prints the normalized analysis
//! record as JSON, or a human-readable issue listing.

mod commands;
mod output;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "kansa",
    author,
    version,
    about = "JavaScript/TypeScript analysis bridge",
    long_about = "Kansa analyzes a JavaScript or TypeScript source file and reports\n\
                  lint issues, code metrics, highlighting and performance data in the\n\
                  shape a static-analysis host consumes."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => args.run(),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_analyze_command() {
        let cli = Cli::try_parse_from(["kansa", "analyze", "./src/index.js"]).unwrap();

        let Commands::Analyze(args) = cli.command;
        assert_eq!(args.path.to_str().unwrap(), "./src/index.js");
    }

    #[test]
    fn cli_parses_analyze_with_format() {
        let cli =
            Cli::try_parse_from(["kansa", "analyze", "a.js", "--format", "pretty"]).unwrap();

        let Commands::Analyze(args) = cli.command;
        assert_eq!(args.format, "pretty");
    }

    #[test]
    fn cli_parses_lint_only_flag() {
        let cli = Cli::try_parse_from(["kansa", "analyze", "a.js", "--lint-only"]).unwrap();

        let Commands::Analyze(args) = cli.command;
        assert!(args.lint_only);
    }

    #[test]
    fn cli_parses_file_type() {
        let cli =
            Cli::try_parse_from(["kansa", "analyze", "a.spec.js", "--file-type", "test"]).unwrap();

        let Commands::Analyze(args) = cli.command;
        assert_eq!(args.file_type, commands::FileTypeArg::Test);
    }

    #[test]
    fn cli_rejects_missing_path() {
        assert!(Cli::try_parse_from(["kansa", "analyze"]).is_err());
    }
}
