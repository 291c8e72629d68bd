//! Analysis orchestration.
//!
//! Two phases, each independently timed: build the source representation,
//! then lint it and compute the context-appropriate extended metrics. A
//! build failure short-circuits to an empty output carrying the parsing
//! error. A lint failure is classified exactly once: engine-internal
//! faults become reportable parsing errors, everything else propagates to
//! the caller untouched.

use serde::{Deserialize, Serialize};

use crate::cpd::{self, CpdToken};
use crate::highlight::{self, Highlight, SymbolHighlight};
use crate::linter::{Issue, LintError, LintResult, Linter};
use crate::metrics::{self, FileMetrics, Metrics, NosonarMetrics};
use crate::parser::{Language, ParsedSource};
use crate::perf::measure_duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "MAIN", alias = "main")]
    Main,
    #[serde(rename = "TEST", alias = "test")]
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolingMode {
    #[serde(rename = "STANDARD", alias = "standard")]
    Standard,
    #[serde(rename = "LINT_ONLY", alias = "lint_only")]
    LintOnly,
}

/// One unit of analysis work. Immutable for the duration of the call.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub file_path: String,
    pub file_content: String,
    pub file_type: FileType,
    pub tooling_mode: ToolingMode,
    pub ignore_header_comments: bool,
}

impl AnalysisInput {
    pub fn new(file_path: &str, file_content: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            file_content: file_content.to_string(),
            file_type: FileType::Main,
            tooling_mode: ToolingMode::Standard,
            ignore_header_comments: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Parsing,
    FailingCompiler,
    LinterInitialization,
    GeneralError,
}

/// A reportable analysis failure. Terminal for the analysis unit,
/// non-fatal for the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsingError {
    pub message: String,
    pub code: ErrorCode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Perf {
    pub parse_time: u64,
    pub analysis_time: u64,
}

/// The normalized record returned to the host. `parsing_error` is present
/// exactly when every other field is at its empty default.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutput {
    pub issues: Vec<Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<Highlight>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted_symbols: Option<Vec<SymbolHighlight>>,
    pub metrics: Metrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpd_tokens: Option<Vec<CpdToken>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsing_error: Option<ParsingError>,
    pub perf: Perf,
}

impl AnalysisOutput {
    /// The empty output: no issues, empty highlight and token lists, the
    /// full metric record at its defaults.
    pub fn empty() -> Self {
        Self {
            issues: Vec::new(),
            highlights: Some(Vec::new()),
            highlighted_symbols: Some(Vec::new()),
            metrics: Metrics::empty(),
            cpd_tokens: Some(Vec::new()),
            parsing_error: None,
            perf: Perf::default(),
        }
    }
}

/// The rule-engine seam the orchestrator lints through. Implemented by
/// [`Linter`]; tests substitute failing engines.
pub trait RuleEngine {
    fn lint(
        &self,
        source: &ParsedSource,
        file_path: &str,
        file_type: FileType,
    ) -> Result<LintResult, LintError>;
}

impl RuleEngine for Linter {
    fn lint(
        &self,
        source: &ParsedSource,
        file_path: &str,
        file_type: FileType,
    ) -> Result<LintResult, LintError> {
        Linter::lint(self, source, file_path, file_type)
    }
}

/// Outcome of classifying a lint-phase failure.
#[derive(Debug)]
pub enum Classified {
    /// A known engine-internal fault, converted to a reportable outcome.
    Recoverable(ParsingError),
    /// Anything else: propagate unmodified.
    Fatal(LintError),
}

pub fn classify_lint_failure(error: LintError) -> Classified {
    match error {
        LintError::CompilerFault(message) => Classified::Recoverable(ParsingError {
            message,
            code: ErrorCode::FailingCompiler,
        }),
        other => Classified::Fatal(other),
    }
}

/// Context-dependent extension of the lint result. Exactly one variant
/// per analysis; the variants cannot contaminate each other.
#[derive(Debug)]
pub enum ExtendedMetrics {
    NosonarOnly {
        metrics: NosonarMetrics,
    },
    TestFileSubset {
        highlights: Vec<Highlight>,
        highlighted_symbols: Vec<SymbolHighlight>,
        metrics: NosonarMetrics,
    },
    MainFileFull {
        highlights: Vec<Highlight>,
        highlighted_symbols: Vec<SymbolHighlight>,
        metrics: FileMetrics,
        cpd_tokens: Vec<CpdToken>,
    },
}

impl ExtendedMetrics {
    fn apply_to(self, output: &mut AnalysisOutput) {
        match self {
            ExtendedMetrics::NosonarOnly { metrics } => {
                output.highlights = None;
                output.highlighted_symbols = None;
                output.cpd_tokens = None;
                output.metrics = Metrics::Nosonar(metrics);
            }
            ExtendedMetrics::TestFileSubset {
                highlights,
                highlighted_symbols,
                metrics,
            } => {
                output.highlights = Some(highlights);
                output.highlighted_symbols = Some(highlighted_symbols);
                output.cpd_tokens = None;
                output.metrics = Metrics::Nosonar(metrics);
            }
            ExtendedMetrics::MainFileFull {
                highlights,
                highlighted_symbols,
                metrics,
                cpd_tokens,
            } => {
                output.highlights = Some(highlights);
                output.highlighted_symbols = Some(highlighted_symbols);
                output.cpd_tokens = Some(cpd_tokens);
                output.metrics = Metrics::Full(metrics);
            }
        }
    }
}

/// Selects which metrics to compute for the analysis context. Tooling
/// mode is checked first: the cheapest, most restrictive mode wins.
pub fn select_extended_metrics(
    input: &AnalysisInput,
    source: &ParsedSource,
    highlighted_symbols: Vec<SymbolHighlight>,
    cognitive_complexity: Option<u32>,
) -> ExtendedMetrics {
    if input.tooling_mode == ToolingMode::LintOnly {
        return ExtendedMetrics::NosonarOnly {
            metrics: metrics::find_nosonar_lines(source),
        };
    }

    match input.file_type {
        FileType::Main => ExtendedMetrics::MainFileFull {
            highlights: highlight::syntax_highlighting(source),
            highlighted_symbols,
            metrics: metrics::compute_metrics(
                source,
                input.ignore_header_comments,
                cognitive_complexity,
            ),
            cpd_tokens: cpd::cpd_tokens(source),
        },
        FileType::Test => ExtendedMetrics::TestFileSubset {
            highlights: highlight::syntax_highlighting(source),
            highlighted_symbols,
            metrics: metrics::find_nosonar_lines(source),
        },
    }
}

/// The top-level orchestrator. Holds an initialized rule engine; one
/// `Analyzer` serves any number of independent analysis calls.
pub struct Analyzer<E = Linter> {
    engine: E,
}

impl<E: RuleEngine> Analyzer<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Runs one analysis. Returns `Err` only for failures the classifier
    /// deems fatal; every reportable outcome is a normal output value.
    pub fn analyze(
        &self,
        input: &AnalysisInput,
        language: Language,
    ) -> Result<AnalysisOutput, LintError> {
        let build = measure_duration(|| {
            ParsedSource::build_with_language(&input.file_path, &input.file_content, language)
        });

        match build.result {
            Ok(source) => {
                let analysis = measure_duration(|| self.analyze_source(input, &source));
                let perf = Perf {
                    parse_time: build.duration_ms,
                    analysis_time: analysis.duration_ms,
                };

                match analysis.result {
                    Ok(mut output) => {
                        output.perf = perf;
                        Ok(output)
                    }
                    Err(error) => match classify_lint_failure(error) {
                        Classified::Recoverable(parsing_error) => {
                            tracing::warn!(
                                file_path = %input.file_path,
                                message = %parsing_error.message,
                                "engine fault reclassified as parsing error"
                            );
                            let mut output = AnalysisOutput::empty();
                            output.parsing_error = Some(parsing_error);
                            output.perf = perf;
                            Ok(output)
                        }
                        Classified::Fatal(error) => Err(error),
                    },
                }
            }
            Err(parse_error) => {
                tracing::debug!(
                    file_path = %input.file_path,
                    error = %parse_error,
                    "source representation build failed"
                );
                let mut output = AnalysisOutput::empty();
                output.parsing_error = Some(ParsingError {
                    message: parse_error.to_string(),
                    code: ErrorCode::Parsing,
                });
                output.perf.parse_time = build.duration_ms;
                Ok(output)
            }
        }
    }

    fn analyze_source(
        &self,
        input: &AnalysisInput,
        source: &ParsedSource,
    ) -> Result<AnalysisOutput, LintError> {
        let LintResult {
            issues,
            highlighted_symbols,
            cognitive_complexity,
        } = self
            .engine
            .lint(source, &input.file_path, input.file_type)?;

        let extended =
            select_extended_metrics(input, source, highlighted_symbols, cognitive_complexity);

        let mut output = AnalysisOutput::empty();
        output.issues = issues;
        extended.apply_to(&mut output);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str) -> ParsedSource {
        ParsedSource::build("test.js", code).unwrap()
    }

    fn input_for(code: &str, file_type: FileType, tooling_mode: ToolingMode) -> AnalysisInput {
        let mut input = AnalysisInput::new("test.js", code);
        input.file_type = file_type;
        input.tooling_mode = tooling_mode;
        input
    }

    const SAMPLE: &str = "var x = 1; // NOSONAR\nvar y = 2;\n";

    #[test]
    fn lint_only_selects_nosonar_metrics_regardless_of_file_type() {
        let source = parse(SAMPLE);

        for file_type in [FileType::Main, FileType::Test] {
            let input = input_for(SAMPLE, file_type, ToolingMode::LintOnly);
            let selected = select_extended_metrics(&input, &source, Vec::new(), None);

            assert!(
                matches!(selected, ExtendedMetrics::NosonarOnly { ref metrics }
                    if metrics.nosonar_lines == vec![1]),
                "expected NosonarOnly for {file_type:?}"
            );
        }
    }

    #[test]
    fn standard_main_selects_the_full_set() {
        let source = parse(SAMPLE);
        let input = input_for(SAMPLE, FileType::Main, ToolingMode::Standard);

        let selected = select_extended_metrics(&input, &source, Vec::new(), Some(0));

        match selected {
            ExtendedMetrics::MainFileFull {
                highlights,
                metrics,
                cpd_tokens,
                ..
            } => {
                assert!(!highlights.is_empty());
                assert!(!cpd_tokens.is_empty());
                assert_eq!(metrics.ncloc, vec![1, 2]);
            }
            other => panic!("expected MainFileFull, got {other:?}"),
        }
    }

    #[test]
    fn standard_test_selects_the_subset() {
        let source = parse(SAMPLE);
        let input = input_for(SAMPLE, FileType::Test, ToolingMode::Standard);

        let selected = select_extended_metrics(&input, &source, Vec::new(), None);

        match selected {
            ExtendedMetrics::TestFileSubset {
                highlights,
                metrics,
                ..
            } => {
                assert!(!highlights.is_empty());
                assert_eq!(metrics.nosonar_lines, vec![1]);
            }
            other => panic!("expected TestFileSubset, got {other:?}"),
        }
    }

    #[test]
    fn compiler_faults_are_recoverable() {
        let classified =
            classify_lint_failure(LintError::CompilerFault("debug failure".to_string()));

        match classified {
            Classified::Recoverable(parsing_error) => {
                assert_eq!(parsing_error.code, ErrorCode::FailingCompiler);
                assert_eq!(parsing_error.message, "debug failure");
            }
            other => panic!("expected Recoverable, got {other:?}"),
        }
    }

    #[test]
    fn other_failures_stay_fatal() {
        let classified = classify_lint_failure(LintError::UnknownRule("x".to_string()));

        assert!(matches!(classified, Classified::Fatal(_)));
    }

    #[test]
    fn empty_output_serializes_with_wire_names() {
        let json = serde_json::to_value(AnalysisOutput::empty()).unwrap();

        assert_eq!(json["issues"], serde_json::json!([]));
        assert_eq!(json["highlights"], serde_json::json!([]));
        assert_eq!(json["highlightedSymbols"], serde_json::json!([]));
        assert_eq!(json["cpdTokens"], serde_json::json!([]));
        assert_eq!(json["metrics"]["functions"], 0);
        assert_eq!(json["perf"]["parseTime"], 0);
        assert_eq!(json["perf"]["analysisTime"], 0);
        assert!(json.get("parsingError").is_none());
    }

    #[test]
    fn error_codes_serialize_screaming() {
        assert_eq!(
            serde_json::to_value(ErrorCode::FailingCompiler).unwrap(),
            "FAILING_COMPILER"
        );
        assert_eq!(serde_json::to_value(ErrorCode::Parsing).unwrap(), "PARSING");
    }

    #[test]
    fn file_type_uses_wire_spelling() {
        assert_eq!(serde_json::to_value(FileType::Main).unwrap(), "MAIN");
        let parsed: FileType = serde_json::from_str("\"TEST\"").unwrap();
        assert_eq!(parsed, FileType::Test);
    }

    #[test]
    fn input_defaults_to_standard_main() {
        let input = AnalysisInput::new("a.js", "var x = 1;");

        assert_eq!(input.file_type, FileType::Main);
        assert_eq!(input.tooling_mode, ToolingMode::Standard);
        assert!(!input.ignore_header_comments);
    }
}
