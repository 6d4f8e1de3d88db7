use anyhow::{Result, anyhow};
use csssight_core::{LineIndex, Outline, SelectorSet, compute_unused, extract_used};
use dashmap::DashMap;
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::{
    collections::HashSet,
    fs,
    io::{BufRead, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
};

use crate::{
    collector::collect_files,
    config::Config,
    fixer::apply_fixes,
    scheduler::{CancelToken, PassScheduler},
    types::{CheckResult, Finding, FixSummary, SkippedFile, SourceFile},
};

/// A stylesheet that parsed, kept with the exact text it was parsed from.
#[derive(Debug, Clone)]
pub struct ParsedStylesheet {
    pub text: String,
    pub outline: Outline,
    pub declared: SelectorSet,
}

/// Everything one analysis pass learned about the project.
#[derive(Debug)]
pub struct Analysis {
    pub root: PathBuf,
    /// Stylesheets in scope, by absolute path
    pub stylesheets: DashMap<PathBuf, ParsedStylesheet>,
    pub used: SelectorSet,
    pub unused: SelectorSet,
    pub skipped: Vec<SkippedFile>,
    pub files_analyzed: usize,
}

pub(crate) fn relative_to(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy().to_string()
}

impl Analysis {
    fn result(&self, findings: Vec<Finding>, fixes: Vec<FixSummary>) -> CheckResult {
        CheckResult {
            findings,
            skipped: self.skipped.clone(),
            fixes,
            files_analyzed: self.files_analyzed,
            stylesheets_analyzed: self.stylesheets.len(),
        }
    }

    /// One finding per occurrence of an unused selector, ordered by file
    /// and position.
    pub fn findings(&self) -> Vec<Finding> {
        let mut findings: Vec<Finding> = self
            .stylesheets
            .iter()
            .flat_map(|entry| {
                let (path, sheet) = entry.pair();
                let file = relative_to(&self.root, path);
                let lines = LineIndex::new(&sheet.text);

                sheet
                    .outline
                    .occurrences(&self.unused)
                    .into_iter()
                    .map(|span| {
                        let pos = lines.line_col(span.range.start);
                        trace!("Unused '{}' at {}:{}:{}", span.text, file, pos.line, pos.column);
                        Finding {
                            file: file.clone(),
                            selector: span.text.clone(),
                            line: pos.line,
                            column: pos.column,
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        findings.sort_by(|a, b| {
            (a.file.as_str(), a.line, a.column).cmp(&(b.file.as_str(), b.line, b.column))
        });
        findings
    }
}

/// Reads and extracts `files` in parallel.
///
/// Returns `None` when `cancel` flips before the pass completes.
pub fn analyze(cfg: &Config, files: &[SourceFile], cancel: &CancelToken) -> Result<Option<Analysis>> {
    let root = cfg.root()?.clone();
    info!("Analyzing {} files in parallel", files.len());

    let stylesheets: DashMap<PathBuf, ParsedStylesheet> = DashMap::new();
    let skipped: DashMap<PathBuf, String> = DashMap::new();
    let files_read = AtomicUsize::new(0);

    let used: SelectorSet = files
        .par_iter()
        .map(|file| {
            if cancel.is_cancelled() {
                return SelectorSet::new();
            }
            let thread_id = thread::current().id();
            debug!("Thread {:?} processing: {}", thread_id, file.path.display());

            let text = match fs::read_to_string(&file.path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping unreadable file {}: {}", file.path.display(), e);
                    return SelectorSet::new();
                }
            };
            files_read.fetch_add(1, Ordering::Relaxed);

            if !file.kind.is_stylesheet() {
                return extract_used(file.kind, &text);
            }
            if !cfg.includes_stylesheet(&file.path) {
                trace!("Stylesheet out of scope: {}", file.path.display());
                return SelectorSet::new();
            }
            let outline = Outline::parse(&text);
            match outline.error(&text) {
                None => {
                    let declared = outline.declared();
                    debug!("{} declares {} selectors", file.path.display(), declared.len());
                    stylesheets
                        .insert(file.path.clone(), ParsedStylesheet { text, outline, declared });
                }
                Some(e) => {
                    warn!("Skipping stylesheet {}: {}", file.path.display(), e);
                    skipped.insert(file.path.clone(), e.to_string());
                }
            }
            SelectorSet::new()
        })
        .reduce(SelectorSet::new, |mut acc, set| {
            acc.extend(set);
            acc
        });

    if cancel.is_cancelled() {
        debug!("Analysis cancelled");
        return Ok(None);
    }

    let declared: SelectorSet =
        stylesheets.iter().flat_map(|entry| entry.value().declared.clone()).collect();
    let unused = compute_unused(&declared, &used);
    info!(
        "{} declared, {} used, {} unused selectors",
        declared.len(),
        used.len(),
        unused.len()
    );

    let mut skipped: Vec<SkippedFile> = skipped
        .into_iter()
        .map(|(path, reason)| SkippedFile { file: relative_to(&root, &path), reason })
        .collect();
    skipped.sort_by(|a, b| a.file.cmp(&b.file));

    Ok(Some(Analysis {
        root,
        stylesheets,
        used,
        unused,
        skipped,
        files_analyzed: files_read.into_inner(),
    }))
}

pub fn run_unused_check(mut cfg: Config) -> Result<CheckResult> {
    info!("Starting unused selector check");

    cfg.initialize()?;
    let root = cfg.root()?.clone();

    debug!("Collecting files with excludes: {:?}", cfg.exclude);
    let files = collect_files(&root, &cfg.exclude)?;
    if !files.iter().any(|f| f.kind.is_stylesheet()) {
        warn!("No stylesheets found under {}", root.display());
        return Err(anyhow!("No stylesheets found under {}", root.display()));
    }
    info!("Found {} files", files.len());

    let analysis = analyze(&cfg, &files, &CancelToken::never())?
        .ok_or_else(|| anyhow!("Analysis was cancelled"))?;
    let mut findings = analysis.findings();

    let fixes = if cfg.fix { apply_fixes(&analysis, &cfg)? } else { Vec::new() };
    if !cfg.dry_run && !fixes.is_empty() {
        let removed: HashSet<(&str, &str)> = fixes
            .iter()
            .flat_map(|fix| fix.removed.iter().map(move |s| (fix.file.as_str(), s.as_str())))
            .collect();
        findings.retain(|f| !removed.contains(&(f.file.as_str(), f.selector.as_str())));
        debug!("{} findings remain after fixing", findings.len());
    }

    info!("Unused selector check complete. Found {} findings", findings.len());
    Ok(analysis.result(findings, fixes))
}

/// Runs one analysis pass at startup and one more for every line read from
/// `requests`, printing each completed pass to `out` as a line of JSON.
///
/// Passes run on a [`PassScheduler`], so lines that arrive while a pass is
/// running cancel it and collapse into a single follow-up. Files are
/// collected again on every pass. Returns how many passes were reported.
pub fn serve_passes<R: BufRead, W: Write>(
    mut cfg: Config,
    requests: R,
    out: &mut W,
) -> Result<usize> {
    cfg.initialize()?;
    let root = cfg.root()?.clone();
    info!("Listening for rescan requests under {}", root.display());

    let (tx, rx) = mpsc::channel::<CheckResult>();
    let mut scheduler = PassScheduler::new(move |token| {
        let files = match collect_files(&root, &cfg.exclude) {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to collect files: {}", e);
                return;
            }
        };
        match analyze(&cfg, &files, token) {
            Ok(Some(analysis)) if !token.is_cancelled() => {
                let result = analysis.result(analysis.findings(), Vec::new());
                if tx.send(result).is_err() {
                    debug!("Result receiver is gone");
                }
            }
            Ok(_) => debug!("Pass superseded before it finished"),
            Err(e) => warn!("Analysis failed: {}", e),
        }
    });

    let mut reported = 0;
    scheduler.request();
    for line in requests.lines() {
        let line = line?;
        trace!("Rescan requested: {:?}", line);
        scheduler.request();
        for result in rx.try_iter() {
            write_json_line(out, &result)?;
            reported += 1;
        }
    }

    scheduler.wait_idle();
    scheduler.shutdown();
    for result in rx.try_iter() {
        write_json_line(out, &result)?;
        reported += 1;
    }
    info!("Served {} passes", reported);
    Ok(reported)
}

fn write_json_line<W: Write>(out: &mut W, result: &CheckResult) -> Result<()> {
    serde_json::to_writer(&mut *out, result)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
