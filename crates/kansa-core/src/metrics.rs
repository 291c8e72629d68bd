//! Code metrics over a parsed source.
//!
//! Pure functions: each takes a [`ParsedSource`] and produces the metric
//! record the selection table asks for. `find_nosonar_lines` is the cheap
//! subset computed in every context; `compute_metrics` is the full record
//! for main files.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use swc_common::Spanned;
use swc_ecma_ast::{
    ArrowExpr, BinExpr, BinaryOp, CatchClause, Class, CondExpr, Decl, DoWhileStmt, ForInStmt,
    ForOfStmt, ForStmt, Function, IfStmt, Stmt, SwitchCase, SwitchStmt, WhileStmt,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::parser::ParsedSource;

/// The full metric record computed for main files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetrics {
    pub ncloc: Vec<u32>,
    pub comment_lines: Vec<u32>,
    pub nosonar_lines: Vec<u32>,
    pub executable_lines: Vec<u32>,
    pub functions: u32,
    pub statements: u32,
    pub classes: u32,
    pub complexity: u32,
    pub cognitive_complexity: u32,
}

/// The NOSONAR-only record used for lint-only analyses and test files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NosonarMetrics {
    pub nosonar_lines: Vec<u32>,
}

/// Metric payload of an analysis output. Which variant is populated
/// depends on the analysis context; the two serialize to the shapes the
/// host expects, with no cross-contamination of fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Metrics {
    Nosonar(NosonarMetrics),
    Full(FileMetrics),
}

impl Metrics {
    /// The empty default carried by failed analyses.
    pub fn empty() -> Self {
        Metrics::Full(FileMetrics::default())
    }
}

fn nosonar_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*NOSONAR").expect("hard-coded pattern"))
}

/// Lines carrying a NOSONAR marker comment.
pub fn find_nosonar_lines(source: &ParsedSource) -> NosonarMetrics {
    let mut lines = BTreeSet::new();

    for comment in source.comments() {
        if nosonar_pattern().is_match(&comment.text) {
            let (line, _) = source.line_index().position_of(comment.range.start);
            lines.insert(line);
        }
    }

    NosonarMetrics {
        nosonar_lines: lines.into_iter().collect(),
    }
}

/// Nesting-weighted complexity of the whole file. Each control-flow
/// structure costs one plus its nesting depth; every logical operator
/// costs one.
pub fn cognitive_complexity(source: &ParsedSource) -> u32 {
    let mut visitor = CognitiveVisitor {
        score: 0,
        nesting: 0,
        function_depth: 0,
    };
    source.module().visit_with(&mut visitor);
    visitor.score
}

/// Computes the full metric record. `cognitive` is the value the rule
/// engine already computed during linting; when absent it is derived
/// here.
pub fn compute_metrics(
    source: &ParsedSource,
    ignore_header_comments: bool,
    cognitive: Option<u32>,
) -> FileMetrics {
    let mut counter = CountVisitor {
        source,
        executable_lines: BTreeSet::new(),
        functions: 0,
        statements: 0,
        classes: 0,
    };
    source.module().visit_with(&mut counter);

    let mut complexity = ComplexityVisitor { score: 0 };
    source.module().visit_with(&mut complexity);

    FileMetrics {
        ncloc: ncloc_lines(source),
        comment_lines: comment_lines(source, ignore_header_comments),
        nosonar_lines: find_nosonar_lines(source).nosonar_lines,
        executable_lines: counter.executable_lines.into_iter().collect(),
        functions: counter.functions,
        statements: counter.statements,
        classes: counter.classes,
        complexity: complexity.score,
        cognitive_complexity: cognitive.unwrap_or_else(|| cognitive_complexity(source)),
    }
}

/// Lines containing at least one byte of code outside comments.
fn ncloc_lines(source: &ParsedSource) -> Vec<u32> {
    let text = source.source();
    let mut in_comment = vec![false; text.len()];
    for comment in source.comments() {
        let extent = source.comment_extent(comment);
        for flag in &mut in_comment[extent.start.min(text.len())..extent.end.min(text.len())] {
            *flag = true;
        }
    }

    let offsets = source.line_index().offsets();
    let mut lines = Vec::new();
    for line in 0..source.line_index().line_count() {
        let start = offsets[line];
        let end = (offsets[line + 1] - 1).min(text.len());
        let has_code = text.as_bytes()[start..end]
            .iter()
            .enumerate()
            .any(|(i, byte)| !byte.is_ascii_whitespace() && !in_comment[start + i]);
        if has_code {
            lines.push(line as u32 + 1);
        }
    }

    lines
}

/// Lines touched by comments. With `ignore_header_comments`, the first
/// comment is skipped when it precedes any code.
fn comment_lines(source: &ParsedSource, ignore_header_comments: bool) -> Vec<u32> {
    let first_code = source
        .module()
        .body
        .first()
        .map(|item| source.relative_range(item.span()).start);

    let mut lines = BTreeSet::new();
    for (index, comment) in source.comments().iter().enumerate() {
        let is_header = index == 0 && first_code.is_none_or(|code| comment.range.start < code);
        if ignore_header_comments && is_header {
            continue;
        }

        let (start_line, _) = source.line_index().position_of(comment.range.start);
        let last = comment.range.end.saturating_sub(1).max(comment.range.start);
        let (end_line, _) = source.line_index().position_of(last);
        for line in start_line..=end_line {
            lines.insert(line);
        }
    }

    lines.into_iter().collect()
}

struct CountVisitor<'a> {
    source: &'a ParsedSource,
    executable_lines: BTreeSet<u32>,
    functions: u32,
    statements: u32,
    classes: u32,
}

impl Visit for CountVisitor<'_> {
    fn visit_stmt(&mut self, node: &Stmt) {
        match node {
            Stmt::Block(_) | Stmt::Empty(_) => {}
            Stmt::Decl(decl) => {
                if matches!(decl, Decl::Var(_) | Decl::Using(_)) {
                    self.statements += 1;
                    let (line, _) = self
                        .source
                        .line_index()
                        .position_of(self.source.relative_range(node.span()).start);
                    self.executable_lines.insert(line);
                }
            }
            _ => {
                self.statements += 1;
                let (line, _) = self
                    .source
                    .line_index()
                    .position_of(self.source.relative_range(node.span()).start);
                self.executable_lines.insert(line);
            }
        }
        node.visit_children_with(self);
    }

    fn visit_function(&mut self, node: &Function) {
        self.functions += 1;
        node.visit_children_with(self);
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        self.functions += 1;
        node.visit_children_with(self);
    }

    fn visit_class(&mut self, node: &Class) {
        self.classes += 1;
        node.visit_children_with(self);
    }
}

struct ComplexityVisitor {
    score: u32,
}

impl Visit for ComplexityVisitor {
    fn visit_function(&mut self, node: &Function) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_if_stmt(&mut self, node: &IfStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_for_stmt(&mut self, node: &ForStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_for_in_stmt(&mut self, node: &ForInStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_for_of_stmt(&mut self, node: &ForOfStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_while_stmt(&mut self, node: &WhileStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_do_while_stmt(&mut self, node: &DoWhileStmt) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_switch_case(&mut self, node: &SwitchCase) {
        if node.test.is_some() {
            self.score += 1;
        }
        node.visit_children_with(self);
    }

    fn visit_catch_clause(&mut self, node: &CatchClause) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_cond_expr(&mut self, node: &CondExpr) {
        self.score += 1;
        node.visit_children_with(self);
    }

    fn visit_bin_expr(&mut self, node: &BinExpr) {
        if matches!(
            node.op,
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
        ) {
            self.score += 1;
        }
        node.visit_children_with(self);
    }
}

struct CognitiveVisitor {
    score: u32,
    nesting: u32,
    function_depth: u32,
}

impl CognitiveVisitor {
    fn enter_structure(&mut self, visit_children: impl FnOnce(&mut Self)) {
        self.score += 1 + self.nesting;
        self.nesting += 1;
        visit_children(self);
        self.nesting -= 1;
    }
}

impl Visit for CognitiveVisitor {
    fn visit_if_stmt(&mut self, node: &IfStmt) {
        self.score += 1 + self.nesting;
        node.test.visit_with(self);
        self.nesting += 1;
        node.cons.visit_with(self);
        self.nesting -= 1;

        if let Some(alt) = &node.alt {
            if matches!(&**alt, Stmt::If(_)) {
                // An else-if chain continues at the same nesting level.
                alt.visit_with(self);
            } else {
                self.score += 1;
                self.nesting += 1;
                alt.visit_with(self);
                self.nesting -= 1;
            }
        }
    }

    fn visit_for_stmt(&mut self, node: &ForStmt) {
        self.enter_structure(|v| node.visit_children_with(v));
    }

    fn visit_for_in_stmt(&mut self, node: &ForInStmt) {
        self.enter_structure(|v| node.visit_children_with(v));
    }

    fn visit_for_of_stmt(&mut self, node: &ForOfStmt) {
        self.enter_structure(|v| node.visit_children_with(v));
    }

    fn visit_while_stmt(&mut self, node: &WhileStmt) {
        self.enter_structure(|v| node.visit_children_with(v));
    }

    fn visit_do_while_stmt(&mut self, node: &DoWhileStmt) {
        self.enter_structure(|v| node.visit_children_with(v));
    }

    fn visit_switch_stmt(&mut self, node: &SwitchStmt) {
        self.enter_structure(|v| node.visit_children_with(v));
    }

    fn visit_catch_clause(&mut self, node: &CatchClause) {
        self.enter_structure(|v| node.visit_children_with(v));
    }

    fn visit_cond_expr(&mut self, node: &CondExpr) {
        self.enter_structure(|v| node.visit_children_with(v));
    }

    fn visit_bin_expr(&mut self, node: &BinExpr) {
        if matches!(
            node.op,
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
        ) {
            self.score += 1;
        }
        node.visit_children_with(self);
    }

    fn visit_function(&mut self, node: &Function) {
        self.function_depth += 1;
        if self.function_depth > 1 {
            self.nesting += 1;
            node.visit_children_with(self);
            self.nesting -= 1;
        } else {
            node.visit_children_with(self);
        }
        self.function_depth -= 1;
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        self.function_depth += 1;
        if self.function_depth > 1 {
            self.nesting += 1;
            node.visit_children_with(self);
            self.nesting -= 1;
        } else {
            node.visit_children_with(self);
        }
        self.function_depth -= 1;
    }
}
