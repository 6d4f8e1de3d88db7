use csssight_core::FileKind;
use serde::Serialize;
use std::path::PathBuf;

/// A collected file and the extractor it is routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: FileKind,
}

/// One occurrence of an unused selector in a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Stylesheet path relative to the root
    pub file: String,
    pub selector: String,
    /// 1-based
    pub line: u32,
    /// 1-based, in bytes
    pub column: u32,
}

/// A stylesheet left out of the analysis because it does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// What a fix did (or would do, on a dry run) to one stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixSummary {
    pub file: String,
    pub removed: Vec<String>,
    pub edits: usize,
    pub written: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    pub findings: Vec<Finding>,
    pub skipped: Vec<SkippedFile>,
    pub fixes: Vec<FixSummary>,
    pub files_analyzed: usize,
    pub stylesheets_analyzed: usize,
}
