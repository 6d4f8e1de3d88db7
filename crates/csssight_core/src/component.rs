use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;

use crate::types::SelectorSet;

/// Collects selectors used by JSX elements: the tag of every intrinsic
/// element (`<div>`, not `<Button>`), each token of a literal `className`
/// as `.token` and a literal `id` as `#id`. Expression values such as
/// `className={styles.x}` are not resolved.
pub fn extract_component_selectors(text: &str) -> SelectorSet {
    let st = SourceType::default().with_typescript(true).with_jsx(true).with_module(true);
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } =
        OxcParser::new(&allocator, text, st).parse();

    if panicked || !errors.is_empty() {
        debug!("Component has {} syntax errors, ignoring its selectors", errors.len());
        return SelectorSet::new();
    }

    let mut visitor = JsxVisitor::default();
    visitor.visit_program(&program);
    debug!("Found {} selectors in component", visitor.selectors.len());
    visitor.selectors
}

#[derive(Default)]
struct JsxVisitor {
    selectors: SelectorSet,
}

impl JsxVisitor {
    fn on_opening_element(&mut self, el: &JSXOpeningElement) {
        // Intrinsic elements parse as plain identifiers; components are references.
        if let JSXElementName::Identifier(ident) = &el.name {
            trace!("Found intrinsic element <{}>", ident.name);
            self.selectors.insert(ident.name.to_string());
        }

        for item in &el.attributes {
            let JSXAttributeItem::Attribute(attr) = item else {
                continue;
            };
            let JSXAttributeName::Identifier(name) = &attr.name else {
                continue;
            };
            let Some(JSXAttributeValue::StringLiteral(value)) = &attr.value else {
                continue;
            };

            match name.name.as_str() {
                "className" => {
                    for class in value.value.split_whitespace() {
                        self.selectors.insert(format!(".{}", class));
                    }
                }
                "id" => {
                    let id = value.value.trim();
                    if !id.is_empty() && !id.contains(char::is_whitespace) {
                        self.selectors.insert(format!("#{}", id));
                    }
                }
                _ => {}
            }
        }
    }
}

impl<'a> Visit<'a> for JsxVisitor {
    fn visit_jsx_opening_element(&mut self, it: &JSXOpeningElement<'a>) {
        self.on_opening_element(it);
        walk::walk_jsx_opening_element(self, it);
    }
}
