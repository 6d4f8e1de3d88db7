use serde::Serialize;
use std::{collections::BTreeSet, ops::Range, path::Path};

use crate::constants::{COMPONENT_EXTENSIONS, MARKUP_EXTENSIONS, SCRIPT_EXTENSIONS, STYLESHEET_EXTENSIONS};

/// Selector tokens in their canonical string form: `.class`, `#id` or `tag`.
pub type SelectorSet = BTreeSet<String>;

/// Which extractor a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Stylesheet,
    Markup,
    Script,
    Component,
}

impl FileKind {
    /// Tags a file by its extension. Unknown extensions are not analyzed.
    pub fn from_path(path: &Path) -> Option<FileKind> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_ascii_lowercase();
        let ext = ext.as_str();

        if STYLESHEET_EXTENSIONS.contains(&ext) {
            Some(FileKind::Stylesheet)
        } else if MARKUP_EXTENSIONS.contains(&ext) {
            Some(FileKind::Markup)
        } else if SCRIPT_EXTENSIONS.contains(&ext) {
            Some(FileKind::Script)
        } else if COMPONENT_EXTENSIONS.contains(&ext) {
            Some(FileKind::Component)
        } else {
            None
        }
    }

    pub fn is_stylesheet(self) -> bool {
        matches!(self, FileKind::Stylesheet)
    }
}

/// One entry of a rule's selector list and where it sits in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSpan {
    pub text: String,
    pub range: Range<usize>,
}

/// A complete rule that declares `selector`, as a deletable byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub selector: String,
    pub range: Range<usize>,
}

/// Replace `range` of the original text with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl TextEdit {
    pub fn delete(range: Range<usize>) -> Self {
        Self { range, replacement: String::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a/site.css")), Some(FileKind::Stylesheet));
        assert_eq!(FileKind::from_path(Path::new("index.HTML")), Some(FileKind::Markup));
        assert_eq!(FileKind::from_path(Path::new("main.ts")), Some(FileKind::Script));
        assert_eq!(FileKind::from_path(Path::new("lib.mjs")), Some(FileKind::Script));
        assert_eq!(FileKind::from_path(Path::new("App.tsx")), Some(FileKind::Component));
        assert_eq!(FileKind::from_path(Path::new("Button.jsx")), Some(FileKind::Component));
    }

    #[test]
    fn test_kind_unknown_extension() {
        assert_eq!(FileKind::from_path(Path::new("styles.scss")), None);
        assert_eq!(FileKind::from_path(Path::new("README")), None);
    }
}
