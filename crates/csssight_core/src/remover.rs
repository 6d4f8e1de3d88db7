//! Turning targeted selectors into one edit set against the original text.
//!
//! A rule is deleted only when every selector in its list is targeted. A
//! rule that groups a targeted selector with one that is still used keeps
//! its block; only its selector list is rewritten.

use log::{debug, trace};
use std::ops::Range;

use crate::{
    error::EditError,
    locator::{located_rules, merge_ranges},
    stylesheet::StyleRule,
    types::{SelectorSet, TextEdit},
};

/// Plans the removal of every selector in `selectors` from `text`.
///
/// The edits are sorted, never overlap and are all relative to `text`;
/// apply them in one go with [`apply_edits`].
pub fn plan_removal(selectors: &SelectorSet, text: &str) -> Vec<TextEdit> {
    let rules = located_rules(text);

    let deletions = merge_ranges(
        rules
            .iter()
            .filter(|located| located.fully_targeted(selectors))
            .map(|located| located.extent.clone())
            .collect(),
    );

    let mut edits: Vec<TextEdit> = deletions.iter().cloned().map(TextEdit::delete).collect();
    for located in &rules {
        let rule = &located.rule;
        let partial = !located.fully_targeted(selectors)
            && rule.selectors.iter().any(|s| selectors.contains(&s.text));
        if !partial || within_any(&rule.prelude, &deletions) {
            continue;
        }
        edits.push(rewrite_selector_list(text, rule, |s| !selectors.contains(s)));
    }

    edits.sort_by_key(|edit| edit.range.start);
    debug!(
        "Planned {} edits ({} deletions) for {} selectors",
        edits.len(),
        deletions.len(),
        selectors.len()
    );
    edits
}

/// Plans the removal of `selector` from the one rule containing `target`,
/// typically the span of the occurrence a user pointed at. Other rules
/// declaring the same selector are left alone.
pub fn plan_single_removal(selector: &str, text: &str, target: Range<usize>) -> Vec<TextEdit> {
    let Some(located) = located_rules(text).into_iter().find(|located| {
        located.rule.declares(selector)
            && located.extent.start <= target.start
            && target.end <= located.extent.end
    }) else {
        debug!("No rule declaring '{}' contains {:?}", selector, target);
        return Vec::new();
    };

    if located.rule.selectors.iter().all(|s| s.text == selector) {
        vec![TextEdit::delete(located.extent)]
    } else {
        vec![rewrite_selector_list(text, &located.rule, |s| s != selector)]
    }
}

/// Applies `edits` to `text` at once. Offsets refer to `text` as given, so
/// the order of `edits` does not matter; overlapping edits are rejected.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|edit| (edit.range.start, edit.range.end));

    for edit in &sorted {
        let range = &edit.range;
        if range.start > range.end
            || range.end > text.len()
            || !text.is_char_boundary(range.start)
            || !text.is_char_boundary(range.end)
        {
            return Err(EditError::OutOfBounds { range: range.clone(), len: text.len() });
        }
    }
    for pair in sorted.windows(2) {
        if pair[1].range.start < pair[0].range.end {
            return Err(EditError::Overlap {
                first: pair[0].range.clone(),
                second: pair[1].range.clone(),
            });
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in sorted {
        out.push_str(&text[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn within_any(range: &Range<usize>, deletions: &[Range<usize>]) -> bool {
    deletions.iter().any(|d| d.start <= range.start && range.end <= d.end)
}

/// Replaces the selector list of `rule` with the entries `keep` accepts.
/// Kept entries are copied from the source as written and joined with the
/// separator found between the first two entries.
fn rewrite_selector_list(text: &str, rule: &StyleRule, keep: impl Fn(&str) -> bool) -> TextEdit {
    let separator = match rule.selectors.as_slice() {
        [first, second, ..] => &text[first.range.end..second.range.start],
        _ => ", ",
    };
    let kept: Vec<&str> = rule
        .selectors
        .iter()
        .filter(|s| keep(&s.text))
        .map(|s| &text[s.range.clone()])
        .collect();
    let replacement = kept.join(separator);
    trace!("Rewriting selector list {:?} to '{}'", rule.prelude, replacement);
    TextEdit { range: rule.prelude.clone(), replacement }
}
