//! End-to-end tests for the analysis pipeline: orchestration, failure
//! classification and metrics selection against the real linter.

use std::sync::atomic::{AtomicUsize, Ordering};

use kansa_core::analysis::{
    AnalysisInput, Analyzer, ErrorCode, FileType, RuleEngine, ToolingMode,
};
use kansa_core::linter::{
    Issue, LintError, LintResult, Linter, LinterConfig, Rule, RuleMetadata,
};
use kansa_core::metrics::Metrics;
use kansa_core::parser::{Language, ParsedSource};

fn analyzer() -> Analyzer<Linter> {
    Analyzer::new(Linter::from_config(LinterConfig::default_rules()).unwrap())
}

fn input(code: &str, file_type: FileType, tooling_mode: ToolingMode) -> AnalysisInput {
    let mut input = AnalysisInput::new("test.js", code);
    input.file_type = file_type;
    input.tooling_mode = tooling_mode;
    input
}

/// An engine that records whether it was ever invoked.
struct ProbeEngine {
    calls: AtomicUsize,
    outcome: fn() -> Result<LintResult, LintError>,
}

impl ProbeEngine {
    fn new(outcome: fn() -> Result<LintResult, LintError>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RuleEngine for ProbeEngine {
    fn lint(
        &self,
        _source: &ParsedSource,
        _file_path: &str,
        _file_type: FileType,
    ) -> Result<LintResult, LintError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

fn empty_lint_result() -> Result<LintResult, LintError> {
    Ok(LintResult {
        issues: Vec::new(),
        highlighted_symbols: Vec::new(),
        cognitive_complexity: Some(0),
    })
}

struct PanickingRule {
    metadata: RuleMetadata,
}

impl PanickingRule {
    fn new() -> Self {
        Self {
            metadata: RuleMetadata {
                key: "panicking-rule",
                description: "always panics",
            },
        }
    }
}

impl Rule for PanickingRule {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, _source: &ParsedSource) -> Vec<Issue> {
        panic!("Debug Failure. False expression");
    }
}

#[test]
fn build_failure_short_circuits_before_the_engine_runs() {
    let engine = ProbeEngine::new(empty_lint_result);
    let analyzer = Analyzer::new(engine);
    let input = input("if (", FileType::Main, ToolingMode::Standard);

    let output = analyzer.analyze(&input, Language::JavaScript).unwrap();

    assert_eq!(analyzer.engine().call_count(), 0, "phase 2 must not run");
    let parsing_error = output.parsing_error.expect("parsing error must be set");
    assert_eq!(parsing_error.code, ErrorCode::Parsing);
    assert!(output.issues.is_empty());
    assert_eq!(output.metrics, Metrics::empty());
    assert_eq!(output.perf.analysis_time, 0);
}

#[test]
fn engine_faults_are_reclassified_as_parsing_errors() {
    let mut linter = Linter::from_config(LinterConfig::default_rules()).unwrap();
    linter.register(Box::new(PanickingRule::new()), &[FileType::Main]);
    let analyzer = Analyzer::new(linter);
    let input = input("var x = 1;", FileType::Main, ToolingMode::Standard);

    let output = analyzer.analyze(&input, Language::JavaScript).unwrap();

    let parsing_error = output.parsing_error.expect("fault must be reported");
    assert_eq!(parsing_error.code, ErrorCode::FailingCompiler);
    assert!(parsing_error.message.contains("Debug Failure"));
    assert!(output.issues.is_empty());
}

#[test]
fn unclassified_failures_propagate_to_the_caller() {
    let engine = ProbeEngine::new(|| Err(LintError::UnknownRule("mystery".to_string())));
    let analyzer = Analyzer::new(engine);
    let input = input("var x = 1;", FileType::Main, ToolingMode::Standard);

    let error = analyzer.analyze(&input, Language::JavaScript).unwrap_err();

    assert!(matches!(error, LintError::UnknownRule(key) if key == "mystery"));
}

#[test]
fn lint_only_output_has_issues_but_no_extended_payload() {
    let analyzer = analyzer();
    let code = "var x = 1;; // NOSONAR\n";
    let input = input(code, FileType::Main, ToolingMode::LintOnly);

    let output = analyzer.analyze(&input, Language::JavaScript).unwrap();

    assert!(
        output.issues.iter().any(|i| i.rule_id == "no-extra-semi"),
        "lint issues are still reported in lint-only mode"
    );
    assert!(output.highlights.is_none());
    assert!(output.highlighted_symbols.is_none());
    assert!(output.cpd_tokens.is_none());
    assert!(matches!(output.metrics, Metrics::Nosonar(ref m) if m.nosonar_lines == vec![1]));
}

#[test]
fn standard_main_output_has_the_full_payload() {
    let analyzer = analyzer();
    let input = input("var x = 1;;\n", FileType::Main, ToolingMode::Standard);

    let output = analyzer.analyze(&input, Language::JavaScript).unwrap();

    assert!(!output.highlights.as_ref().unwrap().is_empty());
    assert!(output.highlighted_symbols.is_some());
    assert!(!output.cpd_tokens.as_ref().unwrap().is_empty());
    assert!(matches!(output.metrics, Metrics::Full(_)));
}

#[test]
fn standard_test_output_skips_size_and_duplication_scoring() {
    let analyzer = analyzer();
    let input = input("var x = 1;;\n", FileType::Test, ToolingMode::Standard);

    let output = analyzer.analyze(&input, Language::JavaScript).unwrap();

    assert!(
        output.issues.iter().any(|i| i.rule_id == "no-extra-semi"),
        "test files are still linted"
    );
    assert!(output.highlights.is_some());
    assert!(output.highlighted_symbols.is_some());
    assert!(output.cpd_tokens.is_none());
    assert!(matches!(output.metrics, Metrics::Nosonar(_)));
}

#[test]
fn redundant_semicolon_scenario_reports_full_metrics() {
    let analyzer = analyzer();
    let input = input("var x = 1;;\n", FileType::Main, ToolingMode::Standard);

    let output = analyzer.analyze(&input, Language::JavaScript).unwrap();

    let issue = output
        .issues
        .iter()
        .find(|i| i.rule_id == "no-extra-semi")
        .expect("redundant semicolon must be reported");
    assert_eq!((issue.line, issue.column), (1, 11));
    assert_eq!((issue.end_line, issue.end_column), (1, 12));

    match &output.metrics {
        Metrics::Full(metrics) => {
            assert_eq!(metrics.ncloc, vec![1]);
            assert_eq!(metrics.statements, 1);
        }
        other => panic!("expected full metrics, got {other:?}"),
    }
}

#[test]
fn timing_is_present_on_success_and_failure() {
    let analyzer = analyzer();

    let success = analyzer
        .analyze(
            &input("var x = 1;", FileType::Main, ToolingMode::Standard),
            Language::JavaScript,
        )
        .unwrap();
    let failure = analyzer
        .analyze(
            &input("if (", FileType::Main, ToolingMode::Standard),
            Language::JavaScript,
        )
        .unwrap();

    let success_json = serde_json::to_value(&success).unwrap();
    let failure_json = serde_json::to_value(&failure).unwrap();

    assert!(success_json["perf"]["parseTime"].is_number());
    assert!(success_json["perf"]["analysisTime"].is_number());
    assert!(failure_json["perf"]["parseTime"].is_number());
    assert!(failure_json["perf"]["analysisTime"].is_number());
}

#[test]
fn typescript_sources_analyze_with_the_typescript_dialect() {
    let analyzer = analyzer();
    let mut ts_input = AnalysisInput::new("test.ts", "const x: number = 1;;\n");
    ts_input.file_type = FileType::Main;

    let output = analyzer.analyze(&ts_input, Language::TypeScript).unwrap();

    assert!(output.parsing_error.is_none());
    assert!(output.issues.iter().any(|i| i.rule_id == "no-extra-semi"));
}

#[test]
fn analyses_are_independent_across_calls() {
    let analyzer = analyzer();

    let broken = analyzer
        .analyze(
            &input("if (", FileType::Main, ToolingMode::Standard),
            Language::JavaScript,
        )
        .unwrap();
    let clean = analyzer
        .analyze(
            &input("var x = 1;", FileType::Main, ToolingMode::Standard),
            Language::JavaScript,
        )
        .unwrap();

    assert!(broken.parsing_error.is_some());
    assert!(clean.parsing_error.is_none());
}
