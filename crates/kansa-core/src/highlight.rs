//! Syntax and symbol highlighting over a parsed source.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

use phf::phf_set;
use regex::Regex;
use serde::Serialize;
use swc_ecma_ast::{
    BigInt, ClassDecl, FnDecl, Ident, ImportDecl, ImportSpecifier, Number, Pat, Str, Tpl,
    VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::parser::ParsedSource;

/// 1-based line/column range; the end is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl TextRange {
    pub fn from_byte_range(source: &ParsedSource, range: &Range<usize>) -> Self {
        let (start_line, start_col) = source.line_index().position_of(range.start);
        let (end_line, end_col) = source.line_index().position_of(range.end);
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextType {
    Keyword,
    Comment,
    StructuredComment,
    Constant,
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub location: TextRange,
    pub text_type: TextType,
}

/// A symbol's declaration range and every reference to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolHighlight {
    pub declaration: TextRange,
    pub references: Vec<TextRange>,
}

static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "async", "await", "break", "case", "catch", "class", "const", "continue",
    "debugger", "default", "delete", "do", "else", "enum", "export",
    "extends", "false", "finally", "for", "function", "get", "if", "import",
    "in", "instanceof", "interface", "let", "new", "null", "of", "return",
    "set", "static", "super", "switch", "this", "throw", "true", "try",
    "typeof", "undefined", "var", "void", "while", "with", "yield",
};

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").expect("hard-coded pattern"))
}

/// Computes keyword, comment, string and constant highlighting for the
/// whole file.
pub fn syntax_highlighting(source: &ParsedSource) -> Vec<Highlight> {
    let mut highlights = Vec::new();

    for comment in source.comments() {
        let text_type = if comment.is_structured() {
            TextType::StructuredComment
        } else {
            TextType::Comment
        };
        let extent = source.comment_extent(comment);
        highlights.push(Highlight {
            location: TextRange::from_byte_range(source, &extent),
            text_type,
        });
    }

    let literals = collect_literals(source);
    for literal in &literals {
        highlights.push(Highlight {
            location: TextRange::from_byte_range(source, &literal.range),
            text_type: literal.text_type,
        });
    }

    for range in keyword_ranges(source, &literals) {
        highlights.push(Highlight {
            location: TextRange::from_byte_range(source, &range),
            text_type: TextType::Keyword,
        });
    }

    highlights.sort_by_key(|h| (h.location.start_line, h.location.start_col));
    highlights
}

/// Declaration and reference ranges for every named binding the file
/// introduces. References are matched by name; the first declaration of a
/// name wins.
pub fn symbol_highlighting(source: &ParsedSource) -> Vec<SymbolHighlight> {
    let mut declarations = DeclarationCollector {
        source,
        declared: Vec::new(),
    };
    source.module().visit_with(&mut declarations);

    let mut occurrences = IdentCollector {
        source,
        idents: Vec::new(),
    };
    source.module().visit_with(&mut occurrences);

    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (index, declaration) in declarations.declared.iter().enumerate() {
        by_name.entry(declaration.name.as_str()).or_insert(index);
    }

    let mut references: Vec<Vec<TextRange>> = vec![Vec::new(); declarations.declared.len()];
    for (name, range) in &occurrences.idents {
        if let Some(&index) = by_name.get(name.as_str()) {
            if *range != declarations.declared[index].range {
                references[index].push(TextRange::from_byte_range(source, range));
            }
        }
    }

    declarations
        .declared
        .iter()
        .zip(references)
        .map(|(declaration, references)| SymbolHighlight {
            declaration: TextRange::from_byte_range(source, &declaration.range),
            references,
        })
        .collect()
}

struct LiteralRange {
    range: Range<usize>,
    text_type: TextType,
}

fn collect_literals(source: &ParsedSource) -> Vec<LiteralRange> {
    let mut collector = LiteralCollector {
        source,
        literals: Vec::new(),
    };
    source.module().visit_with(&mut collector);
    collector.literals.sort_by_key(|l| l.range.start);
    collector.literals
}

struct LiteralCollector<'a> {
    source: &'a ParsedSource,
    literals: Vec<LiteralRange>,
}

impl LiteralCollector<'_> {
    fn push(&mut self, range: Range<usize>, text_type: TextType) {
        self.literals.push(LiteralRange { range, text_type });
    }
}

impl Visit for LiteralCollector<'_> {
    fn visit_str(&mut self, node: &Str) {
        let range = self.source.relative_range(node.span);
        self.push(range, TextType::String);
    }

    fn visit_tpl(&mut self, node: &Tpl) {
        let range = self.source.relative_range(node.span);
        self.push(range, TextType::String);
    }

    fn visit_number(&mut self, node: &Number) {
        let range = self.source.relative_range(node.span);
        self.push(range, TextType::Constant);
    }

    fn visit_big_int(&mut self, node: &BigInt) {
        let range = self.source.relative_range(node.span);
        self.push(range, TextType::Constant);
    }

    fn visit_regex(&mut self, node: &swc_ecma_ast::Regex) {
        let range = self.source.relative_range(node.span);
        self.push(range, TextType::Constant);
    }
}

/// Scans for keywords outside comments and string/template literals.
fn keyword_ranges(source: &ParsedSource, literals: &[LiteralRange]) -> Vec<Range<usize>> {
    let text = source.source();
    let mut masked = vec![false; text.len()];
    for comment in source.comments() {
        let extent = source.comment_extent(comment);
        for flag in &mut masked[extent.start.min(text.len())..extent.end.min(text.len())] {
            *flag = true;
        }
    }
    for literal in literals {
        if literal.text_type == TextType::String {
            let end = literal.range.end.min(text.len());
            for flag in &mut masked[literal.range.start.min(text.len())..end] {
                *flag = true;
            }
        }
    }

    word_pattern()
        .find_iter(text)
        .filter(|word| !masked[word.start()] && KEYWORDS.contains(word.as_str()))
        .map(|word| word.range())
        .collect()
}

struct Declaration {
    name: String,
    range: Range<usize>,
}

struct DeclarationCollector<'a> {
    source: &'a ParsedSource,
    declared: Vec<Declaration>,
}

impl DeclarationCollector<'_> {
    fn record(&mut self, ident: &Ident) {
        self.declared.push(Declaration {
            name: ident.sym.to_string(),
            range: self.source.relative_range(ident.span),
        });
    }
}

impl Visit for DeclarationCollector<'_> {
    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if let Pat::Ident(binding) = &node.name {
            self.record(&binding.id);
        }
        node.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        self.record(&node.ident);
        node.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        self.record(&node.ident);
        node.visit_children_with(self);
    }

    fn visit_import_decl(&mut self, node: &ImportDecl) {
        for specifier in &node.specifiers {
            match specifier {
                ImportSpecifier::Named(named) => self.record(&named.local),
                ImportSpecifier::Default(default) => self.record(&default.local),
                ImportSpecifier::Namespace(namespace) => self.record(&namespace.local),
            }
        }
    }
}

struct IdentCollector<'a> {
    source: &'a ParsedSource,
    idents: Vec<(String, Range<usize>)>,
}

impl Visit for IdentCollector<'_> {
    fn visit_ident(&mut self, node: &Ident) {
        self.idents
            .push((node.sym.to_string(), self.source.relative_range(node.span)));
    }
}
