//! Copy-paste-detection token stream.
//!
//! Emits one token per word or punctuation mark outside comments, with
//! string and template literals collapsed to a single `LITERAL` image so
//! duplicated code is detected regardless of embedded text.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use swc_ecma_ast::{Str, Tpl};
use swc_ecma_visit::{Visit, VisitWith};

use crate::highlight::TextRange;
use crate::parser::ParsedSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpdToken {
    pub location: TextRange,
    pub image: String,
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+|[^\w\s]").expect("hard-coded pattern"))
}

pub fn cpd_tokens(source: &ParsedSource) -> Vec<CpdToken> {
    let text = source.source();

    let mut in_comment = vec![false; text.len()];
    for comment in source.comments() {
        let extent = source.comment_extent(comment);
        for flag in &mut in_comment[extent.start.min(text.len())..extent.end.min(text.len())] {
            *flag = true;
        }
    }

    let mut strings = StringCollector {
        source,
        ranges: Vec::new(),
    };
    source.module().visit_with(&mut strings);
    strings.ranges.sort_by_key(|r| r.start);

    let mut tokens = Vec::new();
    let mut emitted_literal: Option<usize> = None;

    for word in token_pattern().find_iter(text) {
        if in_comment[word.start()] {
            continue;
        }

        if let Some(range) = strings
            .ranges
            .iter()
            .find(|r| r.start <= word.start() && word.start() < r.end)
        {
            if emitted_literal != Some(range.start) {
                emitted_literal = Some(range.start);
                tokens.push(CpdToken {
                    location: TextRange::from_byte_range(source, range),
                    image: "LITERAL".to_string(),
                });
            }
            continue;
        }

        tokens.push(CpdToken {
            location: TextRange::from_byte_range(source, &word.range()),
            image: word.as_str().to_string(),
        });
    }

    tokens
}

struct StringCollector<'a> {
    source: &'a ParsedSource,
    ranges: Vec<Range<usize>>,
}

impl Visit for StringCollector<'_> {
    fn visit_str(&mut self, node: &Str) {
        self.ranges.push(self.source.relative_range(node.span));
    }

    fn visit_tpl(&mut self, node: &Tpl) {
        self.ranges.push(self.source.relative_range(node.span));
        node.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images_of(code: &str) -> Vec<String> {
        let source = ParsedSource::build("test.js", code).unwrap();
        cpd_tokens(&source).into_iter().map(|t| t.image).collect()
    }

    #[test]
    fn code_produces_one_token_per_word_and_punctuator() {
        let images = images_of("var x = 1;");

        assert_eq!(images, vec!["var", "x", "=", "1", ";"]);
    }

    #[test]
    fn string_literals_collapse_to_a_single_image() {
        let images = images_of("var s = 'some text';");

        assert_eq!(images, vec!["var", "s", "=", "LITERAL", ";"]);
    }

    #[test]
    fn template_literals_collapse_too() {
        let images = images_of("var s = `a ${b} c`;");

        assert_eq!(images, vec!["var", "s", "=", "LITERAL", ";"]);
    }

    #[test]
    fn comments_produce_no_tokens() {
        let images = images_of("var x = 1; // trailing comment\n/* block */");

        assert_eq!(images, vec!["var", "x", "=", "1", ";"]);
    }

    #[test]
    fn locations_are_one_based() {
        let source = ParsedSource::build("test.js", "var x = 1;\nvar y = 2;").unwrap();

        let tokens = cpd_tokens(&source);

        assert_eq!(tokens[0].location.start_line, 1);
        assert_eq!(tokens[0].location.start_col, 1);
        assert_eq!(tokens[0].location.end_col, 4);
        let second_line = tokens.iter().find(|t| t.location.start_line == 2).unwrap();
        assert_eq!(second_line.image, "var");
    }

    #[test]
    fn identical_statements_produce_identical_images() {
        let first = images_of("if (a) { run('x'); }");
        let second = images_of("if (a) { run('y'); }");

        assert_eq!(first, second);
    }
}
