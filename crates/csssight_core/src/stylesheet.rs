//! Stylesheet outlining and declared-selector extraction.
//!
//! The stylesheet is walked token by token with `cssparser`, so comments and
//! strings are handled by a real CSS tokenizer: a selector that only appears
//! inside `/* ... */` is never part of the outline. Every style rule is
//! recorded with the byte span of each entry of its selector list and of its
//! block, which is what the rule locator and the removal planner work from.

use cssparser::{ParseError, Parser, ParserInput, ToCss, Token};
use log::{debug, trace};
use std::ops::Range;

use crate::{
    constants::GROUP_AT_RULES,
    error::{StylesheetError, StylesheetErrorKind},
    position::LineIndex,
    types::{SelectorSet, SelectorSpan},
};

/// A style rule: a selector list followed by a `{ ... }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selectors: Vec<SelectorSpan>,
    /// From the first selector's first byte to the last selector's last byte.
    pub prelude: Range<usize>,
    /// From the opening `{` to just past the closing `}`.
    pub block: Range<usize>,
    /// False when the block runs to the end of input without a `}`.
    pub closed: bool,
    /// Number of enclosing blocks (group at-rules or parent style rules).
    pub depth: usize,
}

impl StyleRule {
    pub fn declares(&self, selector: &str) -> bool {
        self.selectors.iter().any(|s| s.text == selector)
    }
}

/// Every style rule of a stylesheet, in source order of their preludes.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    pub rules: Vec<StyleRule>,
    problems: Vec<(StylesheetErrorKind, usize)>,
}

impl Outline {
    /// Outlines `text`. Never fails: problems are recorded and reported by
    /// [`Outline::error`].
    pub fn parse(text: &str) -> Outline {
        let mut input = ParserInput::new(text);
        let mut parser = Parser::new(&mut input);
        let mut walker = Walker { source: text, rules: Vec::new(), problems: Vec::new() };
        walker.walk(&mut parser, Context::RuleList, 0);

        debug!(
            "Outlined {} style rules ({} problems) in {} bytes",
            walker.rules.len(),
            walker.problems.len(),
            text.len()
        );
        Outline { rules: walker.rules, problems: walker.problems }
    }

    /// The first problem found in `text`, if any. `text` must be the text
    /// this outline was parsed from.
    pub fn error(&self, text: &str) -> Option<StylesheetError> {
        let (kind, offset) = self.problems.iter().min_by_key(|(_, offset)| *offset)?.clone();
        let pos = LineIndex::new(text).line_col(offset);
        Some(StylesheetError { kind, line: pos.line, column: pos.column, offset })
    }

    pub fn declared(&self) -> SelectorSet {
        self.rules.iter().flat_map(|rule| rule.selectors.iter().map(|s| s.text.clone())).collect()
    }

    /// Every selector-list entry that is in `selectors`, ordered by position.
    pub fn occurrences(&self, selectors: &SelectorSet) -> Vec<&SelectorSpan> {
        let mut spans: Vec<&SelectorSpan> = self
            .rules
            .iter()
            .flat_map(|rule| rule.selectors.iter())
            .filter(|span| selectors.contains(&span.text))
            .collect();
        spans.sort_by_key(|span| span.range.start);
        spans
    }
}

/// Extracts every selector declared by a rule of the stylesheet, including
/// each member of a grouped selector list and rules nested in `@media` and
/// friends.
pub fn extract_declared(text: &str) -> Result<SelectorSet, StylesheetError> {
    let outline = Outline::parse(text);
    if let Some(err) = outline.error(text) {
        debug!("Stylesheet rejected: {}", err);
        return Err(err);
    }
    Ok(outline.declared())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Top level and group at-rule bodies: only rules and at-rules.
    RuleList,
    /// Style rule bodies: declarations, possibly nested rules.
    Block,
}

struct Walker<'s> {
    source: &'s str,
    rules: Vec<StyleRule>,
    problems: Vec<(StylesheetErrorKind, usize)>,
}

/// Tokens collected since the last statement boundary.
#[derive(Default)]
struct Prelude {
    at_rule: Option<String>,
    start: Option<usize>,
    end: usize,
    pieces: Vec<SelectorSpan>,
    current: String,
    current_start: Option<usize>,
    current_end: usize,
    pending_space: bool,
}

impl Prelude {
    fn is_empty(&self) -> bool {
        self.start.is_none()
    }

    fn mark(&mut self, range: &Range<usize>) {
        self.start.get_or_insert(range.start);
        self.end = range.end;
    }

    fn push(&mut self, text: &str, range: Range<usize>) {
        self.mark(&range);
        if self.current_start.is_none() {
            self.current_start = Some(range.start);
        } else if self.pending_space {
            self.current.push(' ');
        }
        self.pending_space = false;
        self.current.push_str(text);
        self.current_end = range.end;
    }

    fn space(&mut self) {
        if self.current_start.is_some() {
            self.pending_space = true;
        }
    }

    /// Closes the selector being built at a top-level comma.
    fn split(&mut self) {
        if let Some(start) = self.current_start.take() {
            let text = std::mem::take(&mut self.current);
            self.pieces.push(SelectorSpan { text, range: start..self.current_end });
        }
        self.current.clear();
        self.pending_space = false;
    }

    fn finish(mut self) -> Vec<SelectorSpan> {
        self.split();
        self.pieces
    }
}

impl<'s> Walker<'s> {
    fn problem(&mut self, kind: StylesheetErrorKind, offset: usize) {
        trace!("Stylesheet problem at byte {}: {}", offset, kind);
        self.problems.push((kind, offset));
    }

    fn check_comment(&mut self, range: Range<usize>) {
        let raw = &self.source[range.clone()];
        if raw.len() < 4 || !raw.ends_with("*/") {
            self.problem(StylesheetErrorKind::UnterminatedComment, range.start);
        }
    }

    fn walk<'i, 't>(&mut self, input: &mut Parser<'i, 't>, context: Context, depth: usize) {
        let mut prelude = Prelude::default();

        loop {
            let start = input.position().byte_index();
            let token = match input.next_including_whitespace_and_comments() {
                Ok(token) => token.clone(),
                Err(_) => break,
            };
            let end = input.position().byte_index();

            match token {
                Token::WhiteSpace(_) => prelude.space(),
                // A comment separates nothing; only real whitespace is a combinator.
                Token::Comment(_) => self.check_comment(start..end),
                Token::Semicolon => {
                    let finished = std::mem::take(&mut prelude);
                    if context == Context::RuleList && finished.at_rule.is_none() {
                        self.missing_block(&finished);
                    }
                }
                Token::AtKeyword(ref name) if prelude.is_empty() => {
                    prelude.at_rule = Some(name.to_ascii_lowercase());
                    prelude.mark(&(start..end));
                }
                Token::Comma if prelude.at_rule.is_none() => {
                    prelude.mark(&(start..end));
                    prelude.split();
                }
                Token::CurlyBracketBlock => {
                    let finished = std::mem::take(&mut prelude);
                    self.block(input, finished, start, context, depth);
                }
                Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                    let text = self.nested_text(input, &token, start);
                    let end = input.position().byte_index();
                    prelude.push(&text, start..end);
                }
                Token::CloseCurlyBracket => {
                    self.problem(StylesheetErrorKind::UnexpectedClose('}'), start)
                }
                Token::CloseParenthesis => {
                    self.problem(StylesheetErrorKind::UnexpectedClose(')'), start)
                }
                Token::CloseSquareBracket => {
                    self.problem(StylesheetErrorKind::UnexpectedClose(']'), start)
                }
                Token::BadString(_) => self.problem(StylesheetErrorKind::UnterminatedString, start),
                Token::BadUrl(_) => self.problem(StylesheetErrorKind::BadUrl, start),
                other => prelude.push(&other.to_css_string(), start..end),
            }
        }

        if context == Context::RuleList && prelude.at_rule.is_none() {
            self.missing_block(&prelude);
        }
    }

    fn missing_block(&mut self, prelude: &Prelude) {
        if let Some(start) = prelude.start {
            let text = self.source[start..prelude.end].trim().to_string();
            self.problem(StylesheetErrorKind::MissingBlock(text), start);
        }
    }

    fn block<'i, 't>(
        &mut self,
        input: &mut Parser<'i, 't>,
        prelude: Prelude,
        open: usize,
        context: Context,
        depth: usize,
    ) {
        let prelude_end = prelude.end;
        let at_rule = prelude.at_rule.clone();
        let (body, rule_index) = match at_rule.as_deref() {
            Some(name) if GROUP_AT_RULES.contains(&name) => {
                trace!("Entering @{} block at byte {}", name, open);
                // Nested group rules inside a style rule may hold bare declarations.
                (Some(context), None)
            }
            Some(name) => {
                trace!("Skipping body of @{} at byte {}", name, open);
                (None, None)
            }
            None => {
                let selectors = prelude.finish();
                if selectors.is_empty() || selectors[0].text.starts_with("--") {
                    // `{}` with no selectors, or a custom property holding a block
                    (None, None)
                } else {
                    let prelude_range = selectors[0].range.start
                        ..selectors.last().map_or(prelude_end, |s| s.range.end);
                    self.rules.push(StyleRule {
                        selectors,
                        prelude: prelude_range,
                        block: open..open + 1,
                        closed: false,
                        depth,
                    });
                    (Some(Context::Block), Some(self.rules.len() - 1))
                }
            }
        };

        let mut inner_end = open + 1;
        let _: Result<(), ParseError<'i, ()>> = input.parse_nested_block(|nested| {
            match body {
                Some(context) => self.walk(nested, context, depth + 1),
                None => while nested.next_including_whitespace_and_comments().is_ok() {},
            }
            inner_end = nested.position().byte_index();
            Ok(())
        });
        let end = input.position().byte_index();

        // The closing brace is the only thing between the body's end and ours.
        let closed = end > inner_end;
        if !closed {
            self.problem(StylesheetErrorKind::UnclosedBlock, open);
        }
        if let Some(index) = rule_index {
            let rule = &mut self.rules[index];
            rule.block = open..end;
            rule.closed = closed;
        }
    }

    /// Serializes a function, `( ... )` or `[ ... ]` block back to text,
    /// collapsing whitespace and dropping comments.
    fn nested_text<'i, 't>(
        &mut self,
        input: &mut Parser<'i, 't>,
        opener: &Token<'i>,
        start: usize,
    ) -> String {
        let close = match opener {
            Token::SquareBracketBlock => ']',
            Token::CurlyBracketBlock => '}',
            _ => ')',
        };
        let mut text = opener.to_css_string();
        let mut inner_end = start;

        let inner: Result<String, ParseError<'i, ()>> = input.parse_nested_block(|nested| {
            let mut inner = String::new();
            let mut pending_space = false;
            loop {
                let token_start = nested.position().byte_index();
                let token = match nested.next_including_whitespace_and_comments() {
                    Ok(token) => token.clone(),
                    Err(_) => break,
                };
                let token_end = nested.position().byte_index();

                let piece = match token {
                    Token::WhiteSpace(_) => {
                        pending_space = !inner.is_empty();
                        continue;
                    }
                    Token::Comment(_) => {
                        self.check_comment(token_start..token_end);
                        continue;
                    }
                    Token::Function(_)
                    | Token::ParenthesisBlock
                    | Token::SquareBracketBlock
                    | Token::CurlyBracketBlock => self.nested_text(nested, &token, token_start),
                    Token::CloseCurlyBracket => {
                        self.problem(StylesheetErrorKind::UnexpectedClose('}'), token_start);
                        continue;
                    }
                    Token::CloseParenthesis => {
                        self.problem(StylesheetErrorKind::UnexpectedClose(')'), token_start);
                        continue;
                    }
                    Token::CloseSquareBracket => {
                        self.problem(StylesheetErrorKind::UnexpectedClose(']'), token_start);
                        continue;
                    }
                    Token::BadString(_) => {
                        self.problem(StylesheetErrorKind::UnterminatedString, token_start);
                        continue;
                    }
                    Token::BadUrl(_) => {
                        self.problem(StylesheetErrorKind::BadUrl, token_start);
                        continue;
                    }
                    other => other.to_css_string(),
                };
                if pending_space {
                    inner.push(' ');
                    pending_space = false;
                }
                inner.push_str(&piece);
            }
            inner_end = nested.position().byte_index();
            Ok(inner)
        });

        if input.position().byte_index() <= inner_end {
            self.problem(StylesheetErrorKind::UnclosedBlock, start);
        }
        text.push_str(&inner.unwrap_or_default());
        text.push(close);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> SelectorSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_class_and_id_rules() {
        let declared = extract_declared(".test-class {} #test-id {}").unwrap();
        assert_eq!(declared, set(&[".test-class", "#test-id"]));
    }

    #[test]
    fn test_distinct_top_level_selectors_once_each() {
        let css = "div { color: red; }\n.card { margin: 0 }\n#main {}\n.card { padding: 0 }\n";
        let declared = extract_declared(css).unwrap();
        assert_eq!(declared, set(&["div", ".card", "#main"]));
    }

    #[test]
    fn test_grouped_selectors_are_split() {
        let declared = extract_declared("h1, h2,\n.title { font-weight: bold }").unwrap();
        assert_eq!(declared, set(&["h1", "h2", ".title"]));
    }

    #[test]
    fn test_commented_rules_are_not_declared() {
        let css = ".used-class {}\n/* .unused-class-in-comment {\n} */\n";
        let declared = extract_declared(css).unwrap();
        assert_eq!(declared, set(&[".used-class"]));
    }

    #[test]
    fn test_compound_selectors_keep_their_shape() {
        let css = ".nav  >  li a:hover, .a.b, #x .y {}";
        let declared = extract_declared(css).unwrap();
        assert_eq!(declared, set(&[".nav > li a:hover", ".a.b", "#x .y"]));
    }

    #[test]
    fn test_comments_inside_selectors() {
        let css = ".a/**/.b, .c /* note */ .d, :is(.e/**/.f) {}";
        let declared = extract_declared(css).unwrap();
        assert_eq!(declared, set(&[".a.b", ".c .d", ":is(.e.f)"]));
    }

    #[test]
    fn test_commas_inside_functions_do_not_split() {
        let declared = extract_declared(":is(.a, .b) .c, .d {}").unwrap();
        assert_eq!(declared, set(&[":is(.a, .b) .c", ".d"]));
    }

    #[test]
    fn test_rules_inside_media_are_declared() {
        let css = "@media (max-width: 600px) {\n  .mobile { display: none }\n}\n.desktop {}";
        let declared = extract_declared(css).unwrap();
        assert_eq!(declared, set(&[".mobile", ".desktop"]));
    }

    #[test]
    fn test_keyframe_selectors_are_not_declared() {
        let css = "@keyframes spin { from { opacity: 0 } 50% { opacity: .5 } to { opacity: 1 } }\n.spinner {}";
        let declared = extract_declared(css).unwrap();
        assert_eq!(declared, set(&[".spinner"]));
    }

    #[test]
    fn test_statement_at_rules_are_skipped() {
        let css = "@charset \"utf-8\";\n@import url(\"base.css\");\n.a {}";
        let declared = extract_declared(css).unwrap();
        assert_eq!(declared, set(&[".a"]));
    }

    #[test]
    fn test_nested_style_rules_are_declared() {
        let css = ".card { color: red; .title { font-size: 2em } &:hover { color: blue } }";
        let declared = extract_declared(css).unwrap();
        assert_eq!(declared, set(&[".card", ".title", "&:hover"]));
    }

    #[test]
    fn test_empty_stylesheet() {
        assert!(extract_declared("").unwrap().is_empty());
        assert!(extract_declared("  /* nothing */\n").unwrap().is_empty());
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let err = extract_declared(".a { color: red;\n").unwrap_err();
        assert_eq!(err.kind, StylesheetErrorKind::UnclosedBlock);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 4);
    }

    #[test]
    fn test_stray_closing_brace_is_an_error() {
        let err = extract_declared(".a {}\n}\n.b {}").unwrap_err();
        assert_eq!(err.kind, StylesheetErrorKind::UnexpectedClose('}'));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unterminated_comment_is_an_error() {
        let err = extract_declared(".a {}\n/* never closed").unwrap_err();
        assert_eq!(err.kind, StylesheetErrorKind::UnterminatedComment);
    }

    #[test]
    fn test_selector_without_block_is_an_error() {
        let err = extract_declared(".a {}\n.dangling").unwrap_err();
        assert_eq!(err.kind, StylesheetErrorKind::MissingBlock(".dangling".to_string()));
    }

    #[test]
    fn test_outline_records_selector_spans() {
        let css = ".a, .b {}";
        let outline = Outline::parse(css);
        assert_eq!(outline.rules.len(), 1);
        let rule = &outline.rules[0];
        assert_eq!(rule.selectors[0].range, 0..2);
        assert_eq!(rule.selectors[1].range, 4..6);
        assert_eq!(rule.prelude, 0..6);
        assert_eq!(rule.block, 7..9);
        assert!(rule.closed);
    }

    #[test]
    fn test_outline_marks_unclosed_rule() {
        let outline = Outline::parse(".a {} .b { color: red");
        assert_eq!(outline.rules.len(), 2);
        assert!(outline.rules[0].closed);
        assert!(!outline.rules[1].closed);
    }

    #[test]
    fn test_outline_occurrences_in_one_pass() {
        let css = ".b {}\n/* .a {} */\n.a, h1 {}\n@media print { .b {} }\n.c {}\n";
        let outline = Outline::parse(css);
        let found: Vec<(&str, usize)> = outline
            .occurrences(&set(&[".a", ".b"]))
            .into_iter()
            .map(|span| (span.text.as_str(), span.range.start))
            .collect();
        assert_eq!(found, vec![(".b", 0), (".a", 18), (".b", 43)]);
    }

    #[test]
    fn test_outline_nested_rule_depth() {
        let outline = Outline::parse("@media print { .a {} }");
        assert_eq!(outline.rules.len(), 1);
        assert_eq!(outline.rules[0].depth, 1);
    }
}
