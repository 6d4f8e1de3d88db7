//! Core engine for csssight.
//!
//! This crate finds CSS selectors that are declared but never used and plans
//! their exact removal. Everything here is a pure function over source text:
//! - Extracting the selectors a stylesheet declares
//! - Extracting the selectors an HTML, script or JSX/TSX file uses
//! - Computing the unused set under a conservative simple-selector filter
//! - Locating the byte range of the rules that declare a selector
//! - Planning and applying removal edits against the original text
//!
//! Selectors are exchanged as plain strings in one of three shapes: `.class`,
//! `#id` or a bare `tag`.

mod component;
mod constants;
mod error;
mod locator;
mod markup;
mod position;
mod remover;
mod script;
mod stylesheet;
mod types;
mod unused;
mod usage;

// Re-export public API
pub use component::extract_component_selectors;
pub use constants::{
    COMPONENT_EXTENSIONS, GROUP_AT_RULES, MARKUP_EXTENSIONS, SCRIPT_EXTENSIONS,
    STYLESHEET_EXTENSIONS,
};
pub use error::{EditError, StylesheetError, StylesheetErrorKind};
pub use locator::{
    locate_all_rules, locate_rule, locate_rule_at, locate_rule_in, selector_occurrences,
};
pub use markup::extract_markup_selectors;
pub use position::{LineCol, LineIndex};
pub use remover::{apply_edits, plan_removal, plan_single_removal};
pub use script::extract_script_selectors;
pub use stylesheet::{Outline, StyleRule, extract_declared};
pub use types::{FileKind, RuleMatch, SelectorSet, SelectorSpan, TextEdit};
pub use unused::{compute_unused, is_ambiguous};
pub use usage::extract_used;
