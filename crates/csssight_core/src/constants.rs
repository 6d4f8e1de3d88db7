//! File extensions routed to each extractor.
//!
//! - **Stylesheets**: `.css` (preprocessor dialects are not supported)
//! - **Markup**: `.html`, `.htm`
//! - **Scripts**: plain JavaScript/TypeScript modules
//! - **Components**: JSX/TSX files

pub const STYLESHEET_EXTENSIONS: &[&str] = &["css"];

pub const MARKUP_EXTENSIONS: &[&str] = &["html", "htm"];

pub const SCRIPT_EXTENSIONS: &[&str] = &[
    "ts",  // TypeScript
    "mts", // TypeScript module
    "cts", // TypeScript CommonJS
    "js",  // JavaScript
    "mjs", // JavaScript module
    "cjs", // JavaScript CommonJS
];

pub const COMPONENT_EXTENSIONS: &[&str] = &["tsx", "jsx"];

/// At-rules whose block holds further rules rather than declarations.
pub const GROUP_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "layer",
    "container",
    "document",
    "-moz-document",
    "scope",
    "starting-style",
];
