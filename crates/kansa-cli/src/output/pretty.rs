//! Pretty formatter for human-readable terminal output.

use colored::Colorize;

use kansa_core::analysis::AnalysisOutput;

pub fn render(output: &AnalysisOutput, file_path: &str) -> String {
    let mut lines = Vec::new();

    if let Some(parsing_error) = &output.parsing_error {
        lines.push(format!(
            "{}: {}",
            "parse error".red().bold(),
            parsing_error.message
        ));
        lines.push(format!("  {} {}", "-->".blue(), file_path));
        return finish(lines);
    }

    for issue in &output.issues {
        lines.push(format!(
            "{}[{}]: {}",
            "issue".yellow().bold(),
            issue.rule_id.dimmed(),
            issue.message
        ));
        lines.push(format!(
            "  {} {}:{}:{}",
            "-->".blue(),
            file_path,
            issue.line,
            issue.column
        ));
    }

    let summary = match output.issues.len() {
        0 => "no issues found".green().to_string(),
        1 => "1 issue found".yellow().to_string(),
        n => format!("{n} issues found").yellow().to_string(),
    };
    lines.push(format!(
        "{summary} ({}ms parse, {}ms analysis)",
        output.perf.parse_time, output.perf.analysis_time
    ));

    finish(lines)
}

fn finish(lines: Vec<String>) -> String {
    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}
