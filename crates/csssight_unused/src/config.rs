use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use log::{debug, info, trace};
use std::{
    env,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored tree grouped by stylesheet
    #[default]
    Text,
    /// Machine-readable report
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "unused")]
#[command(about = "Find CSS selectors that no markup or script uses")]
pub struct Config {
    /// Root directory of the project (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Extra glob to exclude from the scan (node_modules is always excluded)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Only report and fix selectors declared in this stylesheet
    #[arg(long)]
    pub stylesheet: Option<PathBuf>,

    /// Only fix these selectors, e.g. `--selector .btn --selector #hero`
    #[arg(long)]
    pub selector: Vec<String>,

    /// Remove the rules of unused selectors from their stylesheets
    #[arg(long)]
    pub fix: bool,

    /// With --fix, compute the edits without writing them
    #[arg(long, requires = "fix")]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Rescan whenever a line arrives on stdin, printing one JSON result per pass
    #[arg(long, conflicts_with = "fix")]
    pub listen: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            exclude: Vec::new(),
            stylesheet: None,
            selector: Vec::new(),
            fix: false,
            dry_run: false,
            format: OutputFormat::Text,
            listen: false,
        }
    }
}

impl Config {
    /// Resolve the root directory and make `--stylesheet` absolute
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for git root");
            find_git_root()?
        };
        info!("Using root directory: {}", root.display());

        if let Some(sheet) = self.stylesheet.take() {
            let sheet = if sheet.is_absolute() { sheet } else { root.join(sheet) };
            let sheet = sheet.canonicalize().unwrap_or(sheet);
            debug!("Restricting to stylesheet: {}", sheet.display());
            self.stylesheet = Some(sheet);
        }

        self.root = Some(root);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    /// Whether `path` is in scope for findings and fixes.
    pub fn includes_stylesheet(&self, path: &Path) -> bool {
        match &self.stylesheet {
            Some(only) => only == path,
            None => true,
        }
    }

    /// Whether `selector` may be removed by a fix.
    pub fn includes_selector(&self, selector: &str) -> bool {
        self.selector.is_empty() || self.selector.iter().any(|s| s == selector)
    }
}

pub fn find_git_root() -> Result<PathBuf> {
    debug!("Searching for git root");
    let mut current_dir = env::current_dir()?;
    trace!("Starting search from: {:?}", current_dir);

    loop {
        let git_dir = current_dir.join(".git");
        trace!("Checking for .git at: {:?}", git_dir);
        if git_dir.exists() {
            debug!("Found git root at: {:?}", current_dir);
            return Ok(current_dir);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                debug!("Could not find .git directory in any parent folder");
                return Err(anyhow!("Could not find .git directory in any parent folder"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_git_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();

        let subdir = root.join("src").join("styles");
        fs::create_dir_all(&subdir).unwrap();

        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(&subdir).unwrap();

        let git_root = find_git_root().unwrap();
        // canonicalize can add a /private prefix on macOS
        assert_eq!(git_root.canonicalize().unwrap(), root.canonicalize().unwrap());

        env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    fn test_initialize_with_root_and_relative_stylesheet() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("css")).unwrap();
        fs::write(root.join("css/site.css"), ".a {}").unwrap();

        let mut cfg = Config {
            root: Some(root.to_path_buf()),
            stylesheet: Some(PathBuf::from("css/site.css")),
            ..Default::default()
        };
        cfg.initialize().unwrap();

        let resolved = cfg.root().unwrap().clone();
        assert_eq!(resolved, root.canonicalize().unwrap());
        assert!(cfg.includes_stylesheet(&resolved.join("css/site.css")));
        assert!(!cfg.includes_stylesheet(&resolved.join("css/other.css")));
    }

    #[test]
    fn test_root_before_initialize() {
        let cfg = Config::default();
        assert!(cfg.root().is_err());
    }

    #[test]
    fn test_selector_filter() {
        let mut cfg = Config::default();
        assert!(cfg.includes_selector(".anything"));

        cfg.selector = vec![".btn".to_string()];
        assert!(cfg.includes_selector(".btn"));
        assert!(!cfg.includes_selector(".card"));
    }

    #[test]
    fn test_parse_flags() {
        let cfg = Config::parse_from([
            "unused",
            "--exclude",
            "dist/**",
            "--exclude",
            "vendor/**",
            "--selector",
            ".btn",
            "--fix",
            "--dry-run",
            "--format",
            "json",
        ]);
        assert_eq!(cfg.exclude, vec!["dist/**", "vendor/**"]);
        assert_eq!(cfg.selector, vec![".btn"]);
        assert!(cfg.fix);
        assert!(cfg.dry_run);
        assert_eq!(cfg.format, OutputFormat::Json);
    }

    #[test]
    fn test_dry_run_requires_fix() {
        assert!(Config::try_parse_from(["unused", "--dry-run"]).is_err());
    }

    #[test]
    fn test_listen_excludes_fix() {
        assert!(Config::parse_from(["unused", "--listen"]).listen);
        assert!(Config::try_parse_from(["unused", "--listen", "--fix"]).is_err());
    }
}
