//! Finding the exact byte range of the rules that declare a selector.
//!
//! Ranges come from the stylesheet outline, so they always cover a complete
//! rule: the selector list, its block and the closing brace. A rule whose
//! block never closes is not returned at all.

use log::{debug, trace};
use std::ops::Range;

use crate::{
    position::LineIndex,
    stylesheet::{Outline, StyleRule},
    types::{RuleMatch, SelectorSet},
};

/// A closed style rule together with the range that deleting it removes.
#[derive(Debug, Clone)]
pub(crate) struct LocatedRule {
    pub rule: StyleRule,
    pub extent: Range<usize>,
}

impl LocatedRule {
    /// Whether every entry of the selector list is in `targets`.
    pub fn fully_targeted(&self, targets: &SelectorSet) -> bool {
        self.rule.selectors.iter().all(|s| targets.contains(&s.text))
    }
}

/// Every closed rule of `text` with its deletion extent, in source order.
pub(crate) fn located_rules(text: &str) -> Vec<LocatedRule> {
    let outline = Outline::parse(text);
    let lines = LineIndex::new(text);
    outline
        .rules
        .into_iter()
        .filter(|rule| rule.closed)
        .map(|rule| {
            let extent = rule_extent(text, &rule, &lines);
            LocatedRule { rule, extent }
        })
        .collect()
}

/// The range removed when `rule` is deleted.
///
/// A rule that starts its line takes the whole line with it: the range
/// begins at the line start and runs through the trailing whitespace up to
/// and including its last newline, so no blank line is left behind. A rule
/// sharing its line with something before it only takes the horizontal
/// whitespace that separates it from that text.
fn rule_extent(text: &str, rule: &StyleRule, lines: &LineIndex) -> Range<usize> {
    let start = rule.prelude.start;
    let end = rule.block.end;
    let line_start = lines.line_start(start);

    if text[line_start..start].chars().all(char::is_whitespace) {
        let after = &text[end..];
        let run = &after[..after.len() - after.trim_start().len()];
        let tail = match run.rfind('\n') {
            Some(newline) => newline + 1,
            None => run.len(),
        };
        line_start..end + tail
    } else {
        let before = text[..start].trim_end_matches([' ', '\t']).len();
        before..end
    }
}

/// Every complete rule whose selector list contains exactly `selector`.
///
/// Duplicated declarations yield one match each. Rules that group
/// `selector` with others are returned too; whether such a rule is deleted
/// or rewritten is up to the removal planner.
pub fn locate_rule(selector: &str, text: &str) -> Vec<RuleMatch> {
    locate_rule_in(&Outline::parse(text), selector, text)
}

/// [`locate_rule`] against an outline parsed from `text`, for callers that
/// look up many selectors in the same stylesheet.
pub fn locate_rule_in(outline: &Outline, selector: &str, text: &str) -> Vec<RuleMatch> {
    let lines = LineIndex::new(text);
    let matches: Vec<RuleMatch> = outline
        .rules
        .iter()
        .filter(|rule| rule.closed && rule.declares(selector))
        .map(|rule| RuleMatch {
            selector: selector.to_string(),
            range: rule_extent(text, rule, &lines),
        })
        .collect();
    debug!("Located {} rules declaring '{}'", matches.len(), selector);
    matches
}

/// The rule declaring `selector` whose range contains `target`.
pub fn locate_rule_at(selector: &str, text: &str, target: Range<usize>) -> Option<RuleMatch> {
    locate_rule(selector, text)
        .into_iter()
        .find(|m| m.range.start <= target.start && target.end <= m.range.end)
}

/// Deletion ranges for every rule whose whole selector list is targeted.
///
/// Ranges are computed against the unmodified text, sorted and merged so
/// that none overlap; a rule reached through several of its selectors is
/// deleted once.
pub fn locate_all_rules(selectors: &SelectorSet, text: &str) -> Vec<Range<usize>> {
    let ranges: Vec<Range<usize>> = located_rules(text)
        .into_iter()
        .filter(|located| located.fully_targeted(selectors))
        .map(|located| located.extent)
        .collect();
    merge_ranges(ranges)
}

/// Sorts `ranges` and coalesces the ones that overlap or touch.
pub(crate) fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                trace!("Merging {:?} into {:?}", range, last);
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Byte spans of every selector-list entry equal to `selector`. Text inside
/// comments is never reported.
///
/// To collect the spans of many selectors, parse once and use
/// [`Outline::occurrences`].
pub fn selector_occurrences(selector: &str, text: &str) -> Vec<Range<usize>> {
    let wanted = SelectorSet::from([selector.to_string()]);
    Outline::parse(text).occurrences(&wanted).into_iter().map(|span| span.range.clone()).collect()
}
