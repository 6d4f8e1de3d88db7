use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;

use crate::types::SelectorSet;

/// Collects selectors a script references through the DOM APIs:
///
/// - `el.classList.add("a", "b")` yields `.a` and `.b`
/// - `document.getElementById("nav")` yields `#nav`
/// - `document.querySelector(".menu")` yields `.menu` verbatim
///
/// Only string literal arguments count. A script that does not parse
/// contributes nothing.
pub fn extract_script_selectors(text: &str) -> SelectorSet {
    let st = SourceType::default().with_typescript(true).with_module(true);
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } =
        OxcParser::new(&allocator, text, st).parse();

    if panicked || !errors.is_empty() {
        debug!("Script has {} syntax errors, ignoring its selectors", errors.len());
        return SelectorSet::new();
    }

    let mut visitor = DomCallVisitor::default();
    visitor.visit_program(&program);
    debug!("Found {} selectors in script", visitor.selectors.len());
    visitor.selectors
}

#[derive(Default)]
struct DomCallVisitor {
    selectors: SelectorSet,
}

impl DomCallVisitor {
    fn on_call(&mut self, call: &CallExpression) {
        let Expression::StaticMemberExpression(callee) = &call.callee else {
            return;
        };
        let method = callee.property.name.as_str();

        match &callee.object {
            // <expr>.classList.add(...)
            Expression::StaticMemberExpression(target)
                if target.property.name.as_str() == "classList" && method == "add" =>
            {
                for arg in &call.arguments {
                    if let Some(Expression::StringLiteral(sl)) = arg.as_expression()
                        && is_name(&sl.value)
                    {
                        trace!("Found classList.add('{}')", sl.value);
                        self.selectors.insert(format!(".{}", sl.value));
                    }
                }
            }
            Expression::Identifier(object) if object.name.as_str() == "document" => {
                let Some(Expression::StringLiteral(sl)) =
                    call.arguments.first().and_then(|arg| arg.as_expression())
                else {
                    return;
                };
                match method {
                    "getElementById" if is_name(&sl.value) => {
                        trace!("Found getElementById('{}')", sl.value);
                        self.selectors.insert(format!("#{}", sl.value));
                    }
                    "querySelector" if !sl.value.trim().is_empty() => {
                        trace!("Found querySelector('{}')", sl.value);
                        self.selectors.insert(sl.value.to_string());
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

/// A class or id the DOM would accept: non-empty, no whitespace.
fn is_name(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(char::is_whitespace)
}

impl<'a> Visit<'a> for DomCallVisitor {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        self.on_call(it);
        walk::walk_call_expression(self, it);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> SelectorSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_class_list_add() {
        let selectors = extract_script_selectors(r#"element.classList.add("active","hidden");"#);
        assert_eq!(selectors, set(&[".active", ".hidden"]));
    }

    #[test]
    fn test_get_element_by_id() {
        let selectors = extract_script_selectors(r#"document.getElementById("navbar");"#);
        assert_eq!(selectors, set(&["#navbar"]));
    }

    #[test]
    fn test_query_selector_is_verbatim() {
        let selectors = extract_script_selectors(r#"document.querySelector(".menu-item");"#);
        assert_eq!(selectors, set(&[".menu-item"]));
    }

    #[test]
    fn test_all_patterns_together() {
        let js = r#"
            document.getElementById("navbar");
            document.querySelector(".menu-item");
            element.classList.add("active", "hidden");
        "#;
        let selectors = extract_script_selectors(js);
        assert_eq!(selectors, set(&["#navbar", ".menu-item", ".active", ".hidden"]));
    }

    #[test]
    fn test_calls_inside_functions_and_callbacks() {
        let js = r##"
            function open(btn) {
                btn.addEventListener("click", () => {
                    document.querySelector("#drawer").classList.add("open");
                });
            }
        "##;
        let selectors = extract_script_selectors(js);
        assert_eq!(selectors, set(&["#drawer", ".open"]));
    }

    #[test]
    fn test_typescript_annotations() {
        let ts = r#"
            const el: HTMLElement | null = document.getElementById("app");
            function mark(node: HTMLElement): void { node.classList.add("ready"); }
        "#;
        let selectors = extract_script_selectors(ts);
        assert_eq!(selectors, set(&["#app", ".ready"]));
    }

    #[test]
    fn test_dynamic_arguments_are_ignored() {
        let js = r#"
            const name = "dyn";
            el.classList.add(name, `tpl-${name}`, "static");
            document.getElementById(name);
            document.querySelector(`.${name}`);
        "#;
        let selectors = extract_script_selectors(js);
        assert_eq!(selectors, set(&[".static"]));
    }

    #[test]
    fn test_other_call_shapes_are_ignored() {
        let js = r#"
            el.classList.remove("gone");
            other.getElementById("not-document");
            document.querySelectorAll(".many");
            classList.add("bare");
        "#;
        assert!(extract_script_selectors(js).is_empty());
    }

    #[test]
    fn test_empty_and_spaced_literals_are_ignored() {
        let js = r#"
            el.classList.add("", "two words", "ok");
            document.getElementById("");
            document.getElementById("a b");
            document.querySelector("");
            document.querySelector("   ");
        "#;
        assert_eq!(extract_script_selectors(js), set(&[".ok"]));
    }

    #[test]
    fn test_syntax_error_yields_nothing() {
        let js = r#"document.getElementById("navbar"); function ( {"#;
        assert!(extract_script_selectors(js).is_empty());
    }
}
