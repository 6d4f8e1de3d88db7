use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use csssight_unused::{Config, OutputFormat};
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "csssight")]
#[command(about = "Find and remove CSS selectors nothing uses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Report selectors declared in stylesheets but never used by markup or scripts
    Unused(Config),
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Unused(cfg) if cfg.listen => {
            info!("Listening for rescan requests on stdin");
            let passes = csssight_unused::serve_passes(cfg, std::io::stdin().lock(), &mut stdout)?;
            debug!("Stdin closed after {} passes", passes);
            Ok(())
        }
        Commands::Unused(mut cfg) => {
            let num_threads = rayon::current_num_threads();
            info!("Running unused selector check (using {} threads)", num_threads);
            debug!(
                "Config: root={:?}, exclude={:?}, stylesheet={:?}, fix={}, dry_run={}",
                cfg.root, cfg.exclude, cfg.stylesheet, cfg.fix, cfg.dry_run
            );

            let result = csssight_unused::run_unused_check(cfg.clone())?;
            debug!("Found {} findings", result.findings.len());
            // Resolve the root the same way the check did, for display paths.
            cfg.initialize()?;

            let elapsed_ms = start.elapsed().as_millis();

            match cfg.format {
                OutputFormat::Json => csssight_unused::print_json(&mut stdout, &result)?,
                OutputFormat::Text => {
                    csssight_unused::print_skipped(&mut stdout, &result.skipped, &cfg)?;
                    if cfg.fix {
                        csssight_unused::print_fix_summary(&mut stdout, &result.fixes, &cfg)?;
                    }
                    if result.findings.is_empty() {
                        info!("No unused selectors");
                        csssight_unused::print_no_unused_message(
                            &mut stdout,
                            result.stylesheets_analyzed,
                        )?;
                    } else {
                        csssight_unused::print_findings_tree(&mut stdout, &result.findings, &cfg)?;
                    }
                    writeln!(
                        stdout,
                        "\n{} Finished in {}ms on {} files (using {} threads).",
                        "●".bright_blue(),
                        elapsed_ms.to_string().cyan(),
                        result.files_analyzed.to_string().cyan(),
                        num_threads.to_string().cyan()
                    )?;
                }
            }
            stdout.flush()?;

            if !result.findings.is_empty() {
                // Non-zero exit to fail CI
                std::process::exit(1);
            }

            Ok(())
        }
    }
}
