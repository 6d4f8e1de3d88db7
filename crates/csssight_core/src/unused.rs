use log::{debug, trace};

use crate::types::SelectorSet;

/// Characters that make a declared selector contextual or compound.
const AMBIGUOUS_CHARS: &[char] = &['>', ':', '%', ' ', '+', '~', '[', '(', '*', '&'];

/// Declared selectors that nothing uses.
///
/// Only simple `tag`, `.class` and `#id` tokens are ever reported. The usage
/// side can only produce those shapes, so a compound or contextual selector
/// would always look unused; those are left out rather than reported falsely.
pub fn compute_unused(declared: &SelectorSet, used: &SelectorSet) -> SelectorSet {
    let unused: SelectorSet = declared
        .iter()
        .filter(|selector| !used.contains(*selector) && !is_ambiguous(selector))
        .cloned()
        .collect();
    debug!(
        "{} of {} declared selectors are unused ({} used tokens)",
        unused.len(),
        declared.len(),
        used.len()
    );
    unused
}

/// True for selectors the usage extractors cannot reason about.
pub fn is_ambiguous(selector: &str) -> bool {
    if selector.contains(AMBIGUOUS_CHARS) {
        trace!("Selector '{}' is contextual", selector);
        return true;
    }
    // A `.`/`#` fragment after the first character with something following
    // it: `a.b`, `.a.b`, `.a#b`, `div#main`.
    let compound = selector
        .char_indices()
        .skip(1)
        .any(|(i, c)| matches!(c, '.' | '#') && i + c.len_utf8() < selector.len());
    if compound {
        trace!("Selector '{}' is compound", selector);
    }
    compound
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> SelectorSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_difference() {
        let unused = compute_unused(&set(&[".a", ".b"]), &set(&[".a"]));
        assert_eq!(unused, set(&[".b"]));
    }

    #[test]
    fn test_classes_ids_and_tags() {
        let declared = set(&[".unused-class", "#unused-id", ".used-class", "#used-id", "table"]);
        let used = set(&[".used-class", "#used-id", "div", "p"]);
        assert_eq!(compute_unused(&declared, &used), set(&[".unused-class", "#unused-id", "table"]));
    }

    #[test]
    fn test_descendant_selector_never_reported() {
        let unused = compute_unused(&set(&[".a .b"]), &SelectorSet::new());
        assert!(unused.is_empty());
    }

    #[test]
    fn test_ambiguous_shapes() {
        for selector in [
            "ul > li",
            "a:hover",
            "::selection",
            "50%",
            ".a .b",
            ".a.b",
            "div.card",
            "#main.wide",
            ".btn#go",
            "h1 + p",
            "h1 ~ p",
            "input[type]",
            ":is(.a)",
            "*",
            "&.active",
        ] {
            assert!(is_ambiguous(selector), "'{}' should be filtered", selector);
        }
    }

    #[test]
    fn test_simple_shapes_are_not_ambiguous() {
        for selector in [".menu-item", "#navbar", "section", ".a1", "#x"] {
            assert!(!is_ambiguous(selector), "'{}' should be kept", selector);
        }
    }

    #[test]
    fn test_trailing_dot_is_not_compound() {
        // Only a fragment with a name after it makes a compound.
        assert!(!is_ambiguous("a."));
    }
}
