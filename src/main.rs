//! Command line front end for generating JavaFoil macro sweeps and the
//! polar dataset built from them.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use foil_sweep::javafoil::MacroScript;
use foil_sweep::logging::init_logging;
use foil_sweep::sweep::{SweepConfig, SweepRunner};

#[derive(Parser)]
#[command(name = "foil_sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "NACA 4-digit polar sweeps driven through JavaFoil macros", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); falls back to RUST_LOG
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default sweep configuration
    Generate { output: PathBuf },
    /// List all cases of a sweep
    List { config: PathBuf },
    /// Write every case's macro without running JavaFoil
    Macros { config: PathBuf },
    /// Run one case by ID
    Run { config: PathBuf, case_id: String },
    /// Run the whole sweep and build the dataset
    RunAll { config: PathBuf },
    /// Check macro files against the fixed template
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Generate { output } => generate_config(output),
        Commands::List { config } => runner(&config)?.list_cases().map_err(Into::into),
        Commands::Macros { config } => {
            let count = runner(&config)?.generate_macros()?;
            println!("✅ Wrote {} macros", count);
            Ok(())
        }
        Commands::Run { config, case_id } => {
            let rows = runner(&config)?
                .run_case(&case_id)
                .with_context(|| format!("running case '{}'", case_id))?;
            println!("\n✅ Case '{}' completed: {} rows\n", case_id, rows.len());
            Ok(())
        }
        Commands::RunAll { config } => run_all(&config),
        Commands::Check { files } => check_macros(&files),
    }
}

fn runner(path: &Path) -> anyhow::Result<SweepRunner> {
    let config = SweepConfig::from_file(path)
        .with_context(|| format!("loading sweep configuration {}", path.display()))?;
    Ok(SweepRunner::new(config))
}

fn generate_config(output: PathBuf) -> anyhow::Result<()> {
    let config = SweepConfig::default();
    config
        .to_file(&output)
        .with_context(|| format!("writing {}", output.display()))?;

    println!("✅ Sweep configuration generated: {}", output.display());
    println!("📊 Total cases: {}", config.case_count());
    Ok(())
}

fn run_all(path: &Path) -> anyhow::Result<()> {
    let runner = runner(path)?;
    let summary = runner.run_all()?;

    println!("\n{}", "=".repeat(50));
    println!("Dataset generation complete!");
    println!(
        "Cases: {} completed, {} failed, {} total",
        summary.completed_cases,
        summary.failed(),
        summary.total_cases
    );
    println!("Master dataset saved to: {}", summary.dataset_path.display());
    println!("Run summary saved to: {}", runner.config().summary_path().display());
    println!("{}", "=".repeat(50));
    Ok(())
}

fn check_macros(files: &[PathBuf]) -> anyhow::Result<()> {
    let mut nonconforming = 0;

    for file in files {
        let issues = match MacroScript::from_file(file) {
            Ok(script) => script.template_issues(),
            Err(e) => vec![e.to_string()],
        };

        if issues.is_empty() {
            println!("✓ {}", file.display());
        } else {
            nonconforming += 1;
            println!("✗ {}", file.display());
            for issue in issues {
                println!("    - {}", issue);
            }
        }
    }

    if nonconforming > 0 {
        anyhow::bail!("{} of {} macros do not follow the template", nonconforming, files.len());
    }
    Ok(())
}
