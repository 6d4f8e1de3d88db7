use std::{
    collections::{BTreeMap, BTreeSet},
    env,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};

use crate::{
    config::Config,
    types::{CheckResult, Finding, FixSummary, SkippedFile},
};

/// Relativize a path to the current working directory for clickable links
fn relativize_to_cwd(root: &Path, relative_to_root: &str) -> String {
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => {
            debug!("Failed to get current directory");
            return relative_to_root.to_string();
        }
    };
    trace!("Relativizing '{}' from root {:?} to cwd {:?}", relative_to_root, root, cwd);

    match make_relative(&root.join(relative_to_root), &cwd) {
        Some(rel_path) => rel_path.to_string_lossy().to_string(),
        None => {
            trace!("Could not relativize '{}', using original", relative_to_root);
            relative_to_root.to_string()
        }
    }
}

/// Create a relative path from `base` to `target`
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = target_parts.iter().zip(&base_parts).take_while(|(t, b)| t == b).count();
    if common == 0 {
        // Different roots or prefixes, nothing to walk up from
        return None;
    }

    let mut result = PathBuf::new();
    for _ in &base_parts[common..] {
        result.push("..");
    }
    for component in &target_parts[common..] {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

fn display_path(cfg: &Config, file: &str) -> String {
    match &cfg.root {
        Some(root) => relativize_to_cwd(root, file),
        None => file.to_string(),
    }
}

pub fn print_no_unused_message<W: Write>(writer: &mut W, stylesheets: usize) -> io::Result<()> {
    debug!("No unused selectors");
    writeln!(
        writer,
        "{} No unused selectors in {} stylesheets.",
        "✓".green().bold(),
        stylesheets
    )?;
    writer.flush()?;
    Ok(())
}

pub fn print_findings_tree<W: Write>(
    writer: &mut W,
    findings: &[Finding],
    cfg: &Config,
) -> io::Result<()> {
    debug!("Printing findings tree for {} findings", findings.len());
    let mut by_file: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
    for f in findings {
        by_file.entry(f.file.as_str()).or_default().push(f);
    }
    debug!("Grouped findings into {} files", by_file.len());

    writeln!(writer, "{} Unused selectors detected\n", "⚠".yellow().bold())?;

    for (file, file_findings) in &by_file {
        trace!("Processing file: {} with {} findings", file, file_findings.len());
        let path = display_path(cfg, file);
        writeln!(
            writer,
            "{} ({} unused)",
            path.bright_white().bold(),
            file_findings.len().to_string().red()
        )?;

        for (idx, finding) in file_findings.iter().enumerate() {
            let is_last = idx == file_findings.len() - 1;
            let prefix = if is_last { "└──" } else { "├──" };
            writeln!(
                writer,
                "{}  {} {}",
                prefix.dimmed(),
                finding.selector.yellow(),
                format!("{}:{}:{}", path, finding.line, finding.column).dimmed()
            )?;
        }

        writeln!(writer)?;
    }

    print_summary(writer, findings, by_file.len())?;

    writer.flush()?;
    Ok(())
}

fn print_summary<W: Write>(writer: &mut W, findings: &[Finding], files: usize) -> io::Result<()> {
    if findings.is_empty() {
        return Ok(());
    }
    let selectors: BTreeSet<&str> = findings.iter().map(|f| f.selector.as_str()).collect();

    writeln!(writer, "{}", "─".repeat(60).dimmed())?;
    writeln!(writer, "{}", "Summary".bold())?;
    writeln!(writer, "  Unused selectors: {}", selectors.len().to_string().yellow().bold())?;
    writeln!(writer, "  Occurrences: {}", findings.len().to_string().yellow())?;
    writeln!(writer, "  Stylesheets affected: {}", files.to_string().yellow())?;
    writeln!(writer, "  Run with {} to remove them.", "--fix".cyan())?;
    Ok(())
}

pub fn print_skipped<W: Write>(
    writer: &mut W,
    skipped: &[SkippedFile],
    cfg: &Config,
) -> io::Result<()> {
    if skipped.is_empty() {
        return Ok(());
    }
    writeln!(
        writer,
        "{} Skipped {} stylesheets that do not parse:",
        "✗".red().bold(),
        skipped.len()
    )?;
    for s in skipped {
        writeln!(writer, "  {} {}", display_path(cfg, &s.file).blue(), s.reason.dimmed())?;
    }
    writeln!(writer)?;
    Ok(())
}

pub fn print_fix_summary<W: Write>(
    writer: &mut W,
    fixes: &[FixSummary],
    cfg: &Config,
) -> io::Result<()> {
    if fixes.is_empty() {
        writeln!(writer, "{} Nothing to remove.", "●".bright_blue())?;
        return Ok(());
    }

    let verb = if cfg.dry_run { "Would remove" } else { "Removed" };
    for fix in fixes {
        writeln!(
            writer,
            "{} {} {} from {} ({} edits)",
            "✓".green().bold(),
            verb,
            fix.removed.join(", ").yellow(),
            display_path(cfg, &fix.file).blue(),
            fix.edits
        )?;
    }
    if cfg.dry_run {
        writeln!(writer, "{} Dry run, no files were written.", "●".bright_blue())?;
    }
    writeln!(writer)?;
    Ok(())
}

pub fn print_json<W: Write>(writer: &mut W, result: &CheckResult) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, result)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
