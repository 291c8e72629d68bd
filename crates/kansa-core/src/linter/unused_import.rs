//! unused-import: imported bindings that are never referenced.

use std::collections::HashSet;
use std::ops::Range;

use swc_ecma_ast::{Ident, ImportDecl, ImportSpecifier};
use swc_ecma_visit::{Visit, VisitWith};

use crate::declare_rule;
use crate::linter::{Issue, Rule, RuleMetadata};
use crate::parser::ParsedSource;

declare_rule!(
    UnusedImport,
    key = "unused-import",
    description = "Unnecessary imports should be removed"
);

impl Rule for UnusedImport {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, source: &ParsedSource) -> Vec<Issue> {
        let mut imports = ImportCollector {
            source,
            imported: Vec::new(),
        };
        source.module().visit_with(&mut imports);

        if imports.imported.is_empty() {
            return Vec::new();
        }

        let mut usages = UsageCollector {
            used: HashSet::new(),
        };
        source.module().visit_with(&mut usages);

        imports
            .imported
            .into_iter()
            .filter(|binding| !usages.used.contains(&binding.name))
            .map(|binding| {
                let (line, column) = source.line_index().position_of(binding.range.start);
                let (end_line, end_column) = source.line_index().position_of(binding.range.end);
                Issue {
                    rule_id: "unused-import".to_string(),
                    line,
                    column,
                    end_line,
                    end_column,
                    message: format!("Remove this unused import of '{}'.", binding.name),
                    start: None,
                    end: None,
                }
            })
            .collect()
    }
}

struct ImportedBinding {
    name: String,
    range: Range<usize>,
}

struct ImportCollector<'a> {
    source: &'a ParsedSource,
    imported: Vec<ImportedBinding>,
}

impl ImportCollector<'_> {
    fn record(&mut self, local: &Ident) {
        self.imported.push(ImportedBinding {
            name: local.sym.to_string(),
            range: self.source.relative_range(local.span),
        });
    }
}

impl Visit for ImportCollector<'_> {
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

struct UsageCollector {
    used: HashSet<String>,
}

impl Visit for UsageCollector {
    fn visit_import_decl(&mut self, _node: &ImportDecl) {
        // Local bindings inside the import clause are declarations, not
        // usages.
    }

    fn visit_ident(&mut self, node: &Ident) {
        self.used.insert(node.sym.to_string());
    }
}
