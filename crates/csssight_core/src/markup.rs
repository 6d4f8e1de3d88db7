use html5ever::{parse_document, tendril::TendrilSink};
use log::{debug, trace};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::types::SelectorSet;

/// Collects the selectors an HTML document uses: every element's tag name,
/// each token of its `class` attribute as `.token` and its `id` as `#id`.
///
/// The document is built the way a browser would build it, so the implied
/// `html`, `head` and `body` elements are reported too. HTML parsing never
/// fails; garbage input just yields a sparse tree.
pub fn extract_markup_selectors(text: &str) -> SelectorSet {
    let dom = parse_document(RcDom::default(), Default::default()).one(text);

    let mut selectors = SelectorSet::new();
    // Iterative walk; deeply nested documents must not overflow the stack.
    let mut stack: Vec<Handle> = vec![dom.document.clone()];
    while let Some(node) = stack.pop() {
        if let NodeData::Element { name, attrs, .. } = &node.data {
            let tag = name.local.to_string();
            trace!("Found element <{}>", tag);
            selectors.insert(tag);

            for attr in attrs.borrow().iter() {
                match &*attr.name.local {
                    "class" => {
                        for class in attr.value.split_whitespace() {
                            selectors.insert(format!(".{}", class));
                        }
                    }
                    "id" => {
                        // An id with inner whitespace can never match `#id`.
                        let id = attr.value.trim();
                        if !id.is_empty() && !id.contains(char::is_whitespace) {
                            selectors.insert(format!("#{}", id));
                        }
                    }
                    _ => {}
                }
            }
        }
        stack.extend(node.children.borrow().iter().cloned());
    }

    debug!("Found {} selectors in markup", selectors.len());
    selectors
}
