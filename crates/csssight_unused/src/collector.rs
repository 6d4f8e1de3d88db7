use anyhow::{Context, Result};
use csssight_core::FileKind;
use ignore::{WalkBuilder, overrides::OverrideBuilder};
use log::{debug, trace};
use std::path::Path;

use crate::types::SourceFile;

/// Always left out of the scan.
const DEFAULT_EXCLUDES: &[&str] = &["**/node_modules/**"];

/// Walks `root` and tags every file with a known extension.
///
/// Hidden files are included; `.gitignore` and `.ignore` files are honoured,
/// as are the extra `excludes` globs (relative to `root`).
pub fn collect_files(root: &Path, excludes: &[String]) -> Result<Vec<SourceFile>> {
    debug!("Collecting files under {}", root.display());

    let mut overrides = OverrideBuilder::new(root);
    for glob in DEFAULT_EXCLUDES.iter().copied().chain(excludes.iter().map(String::as_str)) {
        trace!("Excluding glob: {}", glob);
        overrides
            .add(&format!("!{}", glob))
            .with_context(|| format!("Invalid exclude glob '{}'", glob))?;
    }
    let overrides = overrides.build().context("Failed to build exclude globs")?;

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(true)
        .git_ignore(true)
        .overrides(overrides)
        .build();

    let mut files = Vec::new();
    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !p.is_file() {
            continue;
        }
        if let Some(kind) = FileKind::from_path(p) {
            trace!("Found {:?} file: {}", kind, p.display());
            files.push(SourceFile { path: p.to_path_buf(), kind });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Collected {} files", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn relative(root: &Path, files: &[SourceFile]) -> Vec<(String, FileKind)> {
        files
            .iter()
            .map(|f| (f.path.strip_prefix(root).unwrap().to_string_lossy().to_string(), f.kind))
            .collect()
    }

    #[test]
    fn test_collects_known_kinds() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "index.html", "<p></p>");
        create_test_file(root, "src/app.ts", "");
        create_test_file(root, "src/App.tsx", "");
        create_test_file(root, "styles/site.css", "");
        create_test_file(root, "README.md", "");
        create_test_file(root, "styles/theme.scss", "");

        let files = collect_files(root, &[]).unwrap();
        assert_eq!(
            relative(root, &files),
            vec![
                ("index.html".to_string(), FileKind::Markup),
                ("src/App.tsx".to_string(), FileKind::Component),
                ("src/app.ts".to_string(), FileKind::Script),
                ("styles/site.css".to_string(), FileKind::Stylesheet),
            ]
        );
    }

    #[test]
    fn test_node_modules_always_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "node_modules/lib/lib.css", ".lib {}");
        create_test_file(root, "packages/web/node_modules/x/index.js", "");
        create_test_file(root, "site.css", ".a {}");

        let files = collect_files(root, &[]).unwrap();
        assert_eq!(relative(root, &files), vec![("site.css".to_string(), FileKind::Stylesheet)]);
    }

    #[test]
    fn test_extra_excludes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "dist/bundle.css", "");
        create_test_file(root, "src/site.css", "");

        let files = collect_files(root, &["dist/**".to_string()]).unwrap();
        assert_eq!(relative(root, &files), vec![("src/site.css".to_string(), FileKind::Stylesheet)]);
    }

    #[test]
    fn test_ignore_file_is_honoured() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, ".ignore", "generated/\n");
        create_test_file(root, "generated/out.css", "");
        create_test_file(root, ".storybook/preview.js", "");

        let files = collect_files(root, &[]).unwrap();
        assert_eq!(
            relative(root, &files),
            vec![(".storybook/preview.js".to_string(), FileKind::Script)]
        );
    }
}
