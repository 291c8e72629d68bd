//! CLI subcommands.

mod analyze;

pub use analyze::{AnalyzeArgs, FileTypeArg};

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a JavaScript/TypeScript file
    Analyze(AnalyzeArgs),
}
