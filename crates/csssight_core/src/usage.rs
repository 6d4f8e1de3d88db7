use log::trace;

use crate::{
    component::extract_component_selectors, markup::extract_markup_selectors,
    script::extract_script_selectors, types::{FileKind, SelectorSet},
};

/// Selectors referenced by a usage file of the given kind.
///
/// Never fails: usage files are often half-written while being edited, so a
/// file that does not parse contributes an empty set. Stylesheets declare
/// selectors rather than use them and always contribute nothing here.
pub fn extract_used(kind: FileKind, text: &str) -> SelectorSet {
    trace!("Extracting used selectors from {:?} source ({} bytes)", kind, text.len());
    match kind {
        FileKind::Markup => extract_markup_selectors(text),
        FileKind::Script => extract_script_selectors(text),
        FileKind::Component => extract_component_selectors(text),
        FileKind::Stylesheet => SelectorSet::new(),
    }
}
