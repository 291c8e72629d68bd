//! Source-representation builder for JavaScript/TypeScript source code.
//!
//! Integrates with SWC to turn raw source text into the parsed form the
//! rest of the pipeline operates on. Parsing is recovering: a build only
//! fails when no module can be produced at all.

use std::ops::Range;

use swc_common::comments::{CommentKind, SingleThreadedComments};
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Span, Spanned};
use swc_ecma_parser::{EsSyntax, Syntax, TsSyntax, parse_file_as_module};

use crate::position::LineOffsetTable;

pub use swc_ecma_ast::{EsVersion, Module};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

pub fn detect_language(file_path: &str) -> Language {
    let ext = file_path.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "ts" | "mts" | "cts" => Language::TypeScript,
        "tsx" => Language::Tsx,
        "jsx" => Language::Jsx,
        _ => Language::JavaScript,
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// A comment extracted during parsing, with its span normalized to the
/// start of the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentToken {
    pub range: Range<usize>,
    pub text: String,
    pub block: bool,
}

impl CommentToken {
    /// `/** ... */` documentation comments get their own highlighting kind.
    pub fn is_structured(&self) -> bool {
        self.block && self.text.starts_with('*')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub file_path: String,
    pub language: Language,
    pub line_count: usize,
    pub has_errors: bool,
}

/// A successfully built source representation: owned source text, the
/// parsed module, recovered (non-fatal) parse errors, extracted comments
/// and the line index every downstream position derives from.
///
/// Spans taken from the AST are global SWC byte positions; they must go
/// through [`ParsedSource::relative_range`] or
/// [`ParsedSource::span_to_range`] before being interpreted against the
/// source text.
pub struct ParsedSource {
    source: String,
    metadata: FileMetadata,
    module: Module,
    errors: Vec<ParseError>,
    comments: Vec<CommentToken>,
    line_index: LineOffsetTable,
    span_base: u32,
}

impl std::fmt::Debug for ParsedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedSource")
            .field("metadata", &self.metadata)
            .field("error_count", &self.errors.len())
            .field("comment_count", &self.comments.len())
            .finish()
    }
}

impl ParsedSource {
    /// Builds a source representation, detecting the language from the
    /// file extension.
    pub fn build(file_path: &str, source: &str) -> Result<Self, ParseError> {
        Self::build_with_language(file_path, source, detect_language(file_path))
    }

    /// Builds a source representation for an explicitly chosen dialect.
    /// The bridge adapters use this: their synthetic file paths carry no
    /// meaningful extension.
    pub fn build_with_language(
        file_path: &str,
        source: &str,
        language: Language,
    ) -> Result<Self, ParseError> {
        let parser = Parser::for_language(language);
        let parsed = parser.parse_module_recovering(file_path, source)?;

        let line_index = LineOffsetTable::build(source);
        let line_count = if source.is_empty() {
            0
        } else {
            source.lines().count()
        };

        if !parsed.errors.is_empty() {
            tracing::debug!(
                file_path,
                recovered = parsed.errors.len(),
                "parsed with recovered errors"
            );
        }

        let metadata = FileMetadata {
            file_path: file_path.to_string(),
            language,
            line_count,
            has_errors: !parsed.errors.is_empty(),
        };

        Ok(Self {
            source: source.to_string(),
            metadata,
            module: parsed.module,
            errors: parsed.errors,
            comments: parsed.comments,
            line_index,
            span_base: parsed.span_base,
        })
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn comments(&self) -> &[CommentToken] {
        &self.comments
    }

    pub fn line_index(&self) -> &LineOffsetTable {
        &self.line_index
    }

    /// Normalizes an AST span to a 0-based byte range into the content.
    pub fn relative_range(&self, span: Span) -> Range<usize> {
        let lo = (span.lo.0.saturating_sub(self.span_base)) as usize;
        let hi = (span.hi.0.saturating_sub(self.span_base)) as usize;
        lo..hi
    }

    /// Normalizes an AST span into 1-based `(line, column, end_line,
    /// end_column)` positions; the end is exclusive.
    pub fn span_to_range(&self, span: Span) -> (u32, u32, u32, u32) {
        let range = self.relative_range(span);
        let (line, column) = self.line_index.position_of(range.start);
        let (end_line, end_column) = self.line_index.position_of(range.end);
        (line, column, end_line, end_column)
    }

    pub fn text_of(&self, span: Span) -> Option<&str> {
        self.source.get(self.relative_range(span))
    }

    /// Byte range of a comment including its `//` or `/* */` delimiters,
    /// whichever convention the recorded span followed.
    pub fn comment_extent(&self, comment: &CommentToken) -> Range<usize> {
        let mut range = comment.range.clone();

        let text = self.source.get(range.clone()).unwrap_or_default();
        if !(text.starts_with("//") || text.starts_with("/*")) {
            range.start = range.start.saturating_sub(2);
            if comment.block && range.end + 2 <= self.source.len() {
                range.end += 2;
            }
        }

        range
    }
}

struct RecoveredModule {
    module: Module,
    errors: Vec<ParseError>,
    comments: Vec<CommentToken>,
    span_base: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    jsx: bool,
    typescript: bool,
    decorators: bool,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jsx(mut self, enabled: bool) -> Self {
        self.jsx = enabled;
        self
    }

    pub fn typescript(mut self, enabled: bool) -> Self {
        self.typescript = enabled;
        self
    }

    pub fn decorators(mut self, enabled: bool) -> Self {
        self.decorators = enabled;
        self
    }

    pub fn build(self) -> Parser {
        let syntax = if self.typescript {
            Syntax::Typescript(TsSyntax {
                tsx: self.jsx,
                decorators: self.decorators,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: self.jsx,
                decorators: self.decorators,
                ..Default::default()
            })
        };

        Parser { syntax }
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    syntax: Syntax,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            syntax: Syntax::Es(Default::default()),
        }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    pub fn for_language(language: Language) -> Self {
        match language {
            Language::JavaScript => Self::new(),
            Language::TypeScript => Self::builder().typescript(true).build(),
            Language::Jsx => Self::builder().jsx(true).build(),
            Language::Tsx => Self::builder().typescript(true).jsx(true).build(),
        }
    }

    fn parse_module_recovering(
        &self,
        file_path: &str,
        source: &str,
    ) -> Result<RecoveredModule, ParseError> {
        let source_map: Lrc<SourceMap> = Default::default();
        let fm = source_map.new_source_file(
            FileName::Custom(file_path.to_string()).into(),
            source.to_string(),
        );
        let span_base = fm.start_pos.0;
        let comments = SingleThreadedComments::default();

        let mut recovered_errors = Vec::new();

        let result = parse_file_as_module(
            &fm,
            self.syntax,
            EsVersion::latest(),
            Some(&comments),
            &mut recovered_errors,
        );

        let errors: Vec<ParseError> = recovered_errors
            .into_iter()
            .map(|e| {
                let loc = source_map.lookup_char_pos(e.span().lo);
                ParseError {
                    line: loc.line,
                    column: loc.col_display,
                    message: e.kind().msg().to_string(),
                }
            })
            .collect();

        match result {
            Ok(module) => Ok(RecoveredModule {
                module,
                errors,
                comments: extract_comments(comments, span_base),
                span_base,
            }),
            Err(e) => {
                let loc = source_map.lookup_char_pos(e.span().lo);
                Err(ParseError {
                    line: loc.line,
                    column: loc.col_display,
                    message: e.kind().msg().to_string(),
                })
            }
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_comments(comments: SingleThreadedComments, span_base: u32) -> Vec<CommentToken> {
    let (leading, trailing) = comments.take_all();
    let mut out = Vec::new();

    for map in [leading, trailing] {
        for batch in map.borrow().values() {
            for comment in batch {
                let lo = (comment.span.lo.0.saturating_sub(span_base)) as usize;
                let hi = (comment.span.hi.0.saturating_sub(span_base)) as usize;
                out.push(CommentToken {
                    range: lo..hi,
                    text: comment.text.to_string(),
                    block: comment.kind == CommentKind::Block,
                });
            }
        }
    }

    out.sort_by_key(|c| c.range.start);
    out.dedup_by_key(|c| c.range.start);
    out
}
