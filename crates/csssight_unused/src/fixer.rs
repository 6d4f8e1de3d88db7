use anyhow::{Context, Result};
use csssight_core::{SelectorSet, apply_edits, plan_removal};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    checker::{Analysis, relative_to},
    config::Config,
    types::FixSummary,
};

/// Removes the rules of unused selectors from every stylesheet in scope.
///
/// Edits are planned against the text the analysis read, applied in one go
/// per file and written back unless `cfg.dry_run` is set.
pub fn apply_fixes(analysis: &Analysis, cfg: &Config) -> Result<Vec<FixSummary>> {
    for selector in &cfg.selector {
        if !analysis.unused.contains(selector) {
            warn!("'{}' is not an unused selector, leaving it alone", selector);
        }
    }

    let mut paths: Vec<PathBuf> =
        analysis.stylesheets.iter().map(|entry| entry.key().clone()).collect();
    paths.sort();

    let fixes: Vec<Option<FixSummary>> =
        paths.par_iter().map(|path| fix_stylesheet(analysis, cfg, path)).collect::<Result<_>>()?;
    let fixes: Vec<FixSummary> = fixes.into_iter().flatten().collect();

    info!(
        "{} {} selectors across {} stylesheets",
        if cfg.dry_run { "Would remove" } else { "Removed" },
        fixes.iter().map(|f| f.removed.len()).sum::<usize>(),
        fixes.len()
    );
    Ok(fixes)
}

fn fix_stylesheet(analysis: &Analysis, cfg: &Config, path: &Path) -> Result<Option<FixSummary>> {
    let Some(sheet) = analysis.stylesheets.get(path) else {
        return Ok(None);
    };

    let targets: SelectorSet = sheet
        .declared
        .intersection(&analysis.unused)
        .filter(|s| cfg.includes_selector(s))
        .cloned()
        .collect();
    if targets.is_empty() {
        return Ok(None);
    }

    let edits = plan_removal(&targets, &sheet.text);
    if edits.is_empty() {
        return Ok(None);
    }
    let fixed = apply_edits(&sheet.text, &edits)
        .with_context(|| format!("Failed to apply edits to {}", path.display()))?;

    let written = if cfg.dry_run {
        debug!("Dry run: {} edits planned for {}", edits.len(), path.display());
        false
    } else {
        fs::write(path, fixed).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Applied {} edits to {}", edits.len(), path.display());
        true
    };

    Ok(Some(FixSummary {
        file: relative_to(&analysis.root, path),
        removed: targets.into_iter().collect(),
        edits: edits.len(),
        written,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{checker::analyze, collector::collect_files, scheduler::CancelToken};
    use tempfile::TempDir;

    fn analysis_for(root: &Path, cfg: &mut Config) -> Analysis {
        cfg.root = Some(root.to_path_buf());
        cfg.initialize().unwrap();
        let files = collect_files(cfg.root().unwrap(), &[]).unwrap();
        analyze(cfg, &files, &CancelToken::never()).unwrap().unwrap()
    }

    #[test]
    fn test_grouped_rule_keeps_used_selector() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("index.html"), r#"<b class="keep"></b>"#).unwrap();
        fs::write(root.join("site.css"), ".keep, .drop { color: red }\n.drop-too {}\n").unwrap();

        let mut cfg = Config { fix: true, ..Default::default() };
        let analysis = analysis_for(root, &mut cfg);
        let fixes = apply_fixes(&analysis, &cfg).unwrap();

        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].removed, vec![".drop", ".drop-too"]);
        assert_eq!(fixes[0].edits, 2);
        let text = fs::read_to_string(root.join("site.css")).unwrap();
        assert_eq!(text, ".keep { color: red }\n");
    }

    #[test]
    fn test_nothing_to_fix() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("index.html"), r#"<b class="keep"></b>"#).unwrap();
        fs::write(root.join("site.css"), ".keep {}\n").unwrap();

        let mut cfg = Config { fix: true, ..Default::default() };
        let analysis = analysis_for(root, &mut cfg);
        assert!(apply_fixes(&analysis, &cfg).unwrap().is_empty());
    }

    #[test]
    fn test_selector_filter_that_matches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("site.css"), ".a {}\n").unwrap();

        let mut cfg =
            Config { fix: true, selector: vec![".not-declared".to_string()], ..Default::default() };
        let analysis = analysis_for(root, &mut cfg);
        assert!(apply_fixes(&analysis, &cfg).unwrap().is_empty());
        assert_eq!(fs::read_to_string(root.join("site.css")).unwrap(), ".a {}\n");
    }
}
