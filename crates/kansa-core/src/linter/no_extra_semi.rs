//! no-extra-semi: semicolons that terminate nothing.

use swc_ecma_ast::EmptyStmt;
use swc_ecma_visit::{Visit, VisitWith};

use crate::declare_rule;
use crate::linter::{Issue, Rule, RuleMetadata};
use crate::parser::ParsedSource;

declare_rule!(
    NoExtraSemi,
    key = "no-extra-semi",
    description = "Extra semicolons should be removed"
);

impl Rule for NoExtraSemi {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, source: &ParsedSource) -> Vec<Issue> {
        let mut visitor = EmptyStmtVisitor {
            source,
            issues: Vec::new(),
        };
        source.module().visit_with(&mut visitor);
        visitor.issues
    }
}

struct EmptyStmtVisitor<'a> {
    source: &'a ParsedSource,
    issues: Vec<Issue>,
}

impl Visit for EmptyStmtVisitor<'_> {
    fn visit_empty_stmt(&mut self, node: &EmptyStmt) {
        let (line, column, end_line, end_column) = self.source.span_to_range(node.span);
        self.issues.push(Issue {
            rule_id: "no-extra-semi".to_string(),
            line,
            column,
            end_line,
            end_column,
            message: "Unnecessary semicolon.".to_string(),
            start: None,
            end: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_rule(code: &str) -> Vec<Issue> {
        let source = ParsedSource::build("test.js", code).unwrap();
        let rule = NoExtraSemi::new();
        rule.check(&source)
    }

    #[test]
    fn clean_code_reports_nothing() {
        let issues = run_rule("var x = 1;");

        assert!(issues.is_empty());
    }

    #[test]
    fn redundant_semicolon_is_reported() {
        let issues = run_rule("var x = 1;;\n");

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Unnecessary semicolon.");
        assert_eq!(issues[0].line, 1);
        assert_eq!(issues[0].column, 11);
        assert_eq!(issues[0].end_line, 1);
        assert_eq!(issues[0].end_column, 12);
    }

    #[test]
    fn offsets_are_left_for_the_adapter() {
        let issues = run_rule("var x = 1;;");

        assert_eq!(issues[0].start, None);
        assert_eq!(issues[0].end, None);
    }

    #[test]
    fn each_redundant_semicolon_is_reported() {
        let issues = run_rule("var x = 1;;;\nvar y = 2;;");

        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn semicolon_after_block_is_reported() {
        let issues = run_rule("if (x) { y(); };");

        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn metadata_is_correct() {
        let rule = NoExtraSemi::new();

        assert_eq!(rule.metadata().key, "no-extra-semi");
    }
}
