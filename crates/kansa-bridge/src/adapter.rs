//! Per-dialect analysis adapters.
//!
//! An adapter owns an initialized analyzer for one dialect. Rule
//! configuration happens at construction; if it fails there is no adapter
//! and therefore no way to analyze against undefined rule state. Each
//! analysis runs against a fixed synthetic file path and enriches the
//! resulting issues with absolute offsets.

use serde_json::{Value, json};
use swc_common::Spanned;
use swc_ecma_ast::{Decl, ImportSpecifier, ModuleDecl, ModuleItem, Pat, Stmt};

use kansa_core::analysis::{AnalysisInput, Analyzer, FileType, ToolingMode};
use kansa_core::linter::{Issue, LintError, Linter};
use kansa_core::parser::{Language, ParsedSource};
use kansa_core::position::LineOffsetTable;

use crate::protocol::{AnalysisRequest, BridgeAnalysis, InitLinterRequest, TsRawResponse};

const JS_SYNTHETIC_PATH: &str = "inline.js";
const TS_SYNTHETIC_PATH: &str = "inline.ts";

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("linter initialization failed: {0}")]
    Initialization(#[source] LintError),
    #[error("analysis failed: {0}")]
    Analysis(#[source] LintError),
    #[error("malformed engine payload: {0}")]
    Payload(#[from] serde_json::Error),
}

struct DialectAdapter {
    analyzer: Analyzer<Linter>,
    language: Language,
    synthetic_path: &'static str,
}

impl DialectAdapter {
    fn new(
        init: InitLinterRequest,
        language: Language,
        synthetic_path: &'static str,
    ) -> Result<Self, BridgeError> {
        let linter = Linter::from_config(init).map_err(BridgeError::Initialization)?;
        Ok(Self {
            analyzer: Analyzer::new(linter),
            language,
            synthetic_path,
        })
    }

    fn analyze(&self, code: &str) -> Result<BridgeAnalysis, BridgeError> {
        Ok(self.analyze_with_scopes(code)?.0)
    }

    fn analyze_with_scopes(&self, code: &str) -> Result<(BridgeAnalysis, Value), BridgeError> {
        let request = AnalysisRequest {
            file_path: self.synthetic_path.to_string(),
            file_content: code.to_string(),
            file_type: FileType::Main,
            ts_configs: Vec::new(),
        };

        let mut input = AnalysisInput::new(&request.file_path, &request.file_content);
        input.file_type = request.file_type;
        input.tooling_mode = ToolingMode::Standard;

        let output = self
            .analyzer
            .analyze(&input, self.language)
            .map_err(BridgeError::Analysis)?;

        if let Some(parsing_error) = &output.parsing_error {
            tracing::debug!(message = %parsing_error.message, "bridge analysis reported a parsing error");
            let empty = BridgeAnalysis {
                issues: Vec::new(),
                ast: Value::Null,
            };
            return Ok((empty, Value::Array(Vec::new())));
        }

        let table = LineOffsetTable::build(code);
        let issues = output
            .issues
            .into_iter()
            .map(|issue| enrich_issue(issue, &table))
            .collect();

        let (ast, scopes) = match self.parse_for_payload(code) {
            Some(source) => (ast_summary(&source), scopes_summary(&source)),
            None => (Value::Null, Value::Array(Vec::new())),
        };

        Ok((BridgeAnalysis { issues, ast }, scopes))
    }

    fn parse_for_payload(&self, code: &str) -> Option<ParsedSource> {
        ParsedSource::build_with_language(self.synthetic_path, code, self.language).ok()
    }
}

/// Derives the absolute offsets of an issue's start and end positions,
/// independently of each other.
fn enrich_issue(mut issue: Issue, table: &LineOffsetTable) -> Issue {
    issue.start = Some(table.to_absolute(issue.line, issue.column));
    issue.end = Some(table.to_absolute(issue.end_line, issue.end_column));
    issue
}

/// JavaScript dialect adapter.
pub struct JsAdapter {
    inner: DialectAdapter,
}

impl std::fmt::Debug for JsAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsAdapter").finish_non_exhaustive()
    }
}

impl JsAdapter {
    pub fn new(init: InitLinterRequest) -> Result<Self, BridgeError> {
        Ok(Self {
            inner: DialectAdapter::new(init, Language::JavaScript, JS_SYNTHETIC_PATH)?,
        })
    }

    pub fn analyze(&self, code: &str) -> Result<BridgeAnalysis, BridgeError> {
        self.inner.analyze(code)
    }
}

/// TypeScript dialect adapter. Its engine responses cross the wire with
/// `ast` and `scopes` JSON-encoded; the adapter decodes them before
/// returning.
pub struct TsAdapter {
    inner: DialectAdapter,
}

impl TsAdapter {
    pub fn new(init: InitLinterRequest) -> Result<Self, BridgeError> {
        Ok(Self {
            inner: DialectAdapter::new(init, Language::TypeScript, TS_SYNTHETIC_PATH)?,
        })
    }

    pub fn analyze(&self, code: &str) -> Result<BridgeAnalysis, BridgeError> {
        let raw = self.analyze_raw(code)?;
        let decoded = raw.decode()?;
        Ok(BridgeAnalysis {
            issues: decoded.issues,
            ast: decoded.ast,
        })
    }

    /// Produces the legacy wire form with nested encoded payloads.
    pub fn analyze_raw(&self, code: &str) -> Result<TsRawResponse, BridgeError> {
        let (analysis, scopes) = self.inner.analyze_with_scopes(code)?;

        Ok(TsRawResponse {
            issues: analysis.issues,
            ast: serde_json::to_string(&analysis.ast)?,
            scopes: serde_json::to_string(&scopes)?,
        })
    }
}

/// Shallow ESTree-style summary of the parsed module: one entry per
/// top-level item with its normalized byte range.
fn ast_summary(source: &ParsedSource) -> Value {
    let body: Vec<Value> = source
        .module()
        .body
        .iter()
        .map(|item| {
            let range = source.relative_range(item.span());
            json!({
                "type": item_type(item),
                "start": range.start,
                "end": range.end,
            })
        })
        .collect();

    json!({
        "type": "Module",
        "start": 0,
        "end": source.source().len(),
        "body": body,
    })
}

fn item_type(item: &ModuleItem) -> &'static str {
    match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(_)) => "ImportDeclaration",
        ModuleItem::ModuleDecl(_) => "ModuleDeclaration",
        ModuleItem::Stmt(stmt) => match stmt {
            Stmt::Decl(Decl::Var(_)) => "VariableDeclaration",
            Stmt::Decl(Decl::Fn(_)) => "FunctionDeclaration",
            Stmt::Decl(Decl::Class(_)) => "ClassDeclaration",
            Stmt::Decl(_) => "Declaration",
            Stmt::Expr(_) => "ExpressionStatement",
            Stmt::If(_) => "IfStatement",
            Stmt::Return(_) => "ReturnStatement",
            Stmt::Empty(_) => "EmptyStatement",
            Stmt::Block(_) => "BlockStatement",
            _ => "Statement",
        },
    }
}

/// Module-level bindings, the shape the host renders as scope
/// information.
fn scopes_summary(source: &ParsedSource) -> Value {
    let mut bindings: Vec<String> = Vec::new();

    for item in &source.module().body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                for specifier in &import.specifiers {
                    match specifier {
                        ImportSpecifier::Named(named) => {
                            bindings.push(named.local.sym.to_string())
                        }
                        ImportSpecifier::Default(default) => {
                            bindings.push(default.local.sym.to_string())
                        }
                        ImportSpecifier::Namespace(namespace) => {
                            bindings.push(namespace.local.sym.to_string())
                        }
                    }
                }
            }
            ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) => {
                for declarator in &var.decls {
                    if let Pat::Ident(binding) = &declarator.name {
                        bindings.push(binding.id.sym.to_string());
                    }
                }
            }
            ModuleItem::Stmt(Stmt::Decl(Decl::Fn(function))) => {
                bindings.push(function.ident.sym.to_string());
            }
            ModuleItem::Stmt(Stmt::Decl(Decl::Class(class))) => {
                bindings.push(class.ident.sym.to_string());
            }
            _ => {}
        }
    }

    json!([{ "type": "module", "bindings": bindings }])
}
