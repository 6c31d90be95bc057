use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};

use dbtlens_core::{Config, Report, ReportMetadata, RuleConfig};
use dbtlens_dbt::DbtProject;
use dbtlens_engine::{generate_recommendations, run_all_rules};

mod markdown;

/// dbtlens - dependency-graph analysis for dbt projects
#[derive(Parser)]
#[command(name = "dbtlens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: dbtlens.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a dbt project for performance and maintainability issues
    Analyze {
        /// Path to the dbt project directory
        project_path: PathBuf,

        /// Path to manifest.json (default: <project>/manifest.json)
        #[arg(long)]
        manifest_path: Option<PathBuf>,

        /// Path to run_results.json (optional, for performance data)
        #[arg(long)]
        run_results_path: Option<PathBuf>,

        /// Directory to write reports
        #[arg(long, default_value = "./dbtlens_reports")]
        output_path: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "both")]
        format: ReportFormat,

        /// Maximum dependency depth before flagging
        #[arg(long)]
        max_depth: Option<usize>,

        /// Minimum execution time (seconds) to flag heavy models
        #[arg(long)]
        min_execution_time: Option<f64>,

        /// Minimum rows to consider a model heavy
        #[arg(long)]
        min_rows: Option<u64>,

        /// Minimum direct dependents for fan-out detection
        #[arg(long)]
        min_downstream: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
    Both,
}

impl ReportFormat {
    fn wants_markdown(self) -> bool {
        matches!(self, Self::Markdown | Self::Both)
    }

    fn wants_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("dbtlens.toml").exists() {
        Config::from_file(Path::new("dbtlens.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    match cli.command {
        Commands::Analyze {
            project_path,
            manifest_path,
            run_results_path,
            output_path,
            format,
            max_depth,
            min_execution_time,
            min_rows,
            min_downstream,
        } => {
            let mut rules = config.rules.clone();
            if let Some(value) = max_depth {
                rules.max_dependency_depth = value;
            }
            if let Some(value) = min_execution_time {
                rules.min_execution_time_seconds = value;
            }
            if let Some(value) = min_rows {
                rules.min_rows_for_heavy = value;
            }
            if let Some(value) = min_downstream {
                rules.min_downstream_count = value;
            }

            analyze_command(
                &project_path,
                manifest_path,
                run_results_path,
                &output_path,
                format,
                &rules,
                cli.verbose,
            )
        }
    }
}

/// Analyze command - load, scan, aggregate, render
fn analyze_command(
    project_path: &Path,
    manifest_path: Option<PathBuf>,
    run_results_path: Option<PathBuf>,
    output_path: &Path,
    format: ReportFormat,
    rules: &RuleConfig,
    verbose: bool,
) -> Result<()> {
    println!();
    println!("{}", "dbt Pipeline Analyzer".bold().bright_blue());
    println!("Analyzing project: {}", project_path.display().to_string().cyan());
    println!();

    if verbose {
        eprintln!("{}", "Loading dbt project...".cyan());
    }

    let project = DbtProject::load(project_path, manifest_path, run_results_path)?;

    println!("{} Loaded {} models", "✓".green(), project.dag().len());

    if verbose {
        eprintln!("{}", "Running analysis rules...".cyan());
    }

    let findings = run_all_rules(project.dag(), rules);
    println!("{} Found {} issues", "✓".green(), findings.len());

    if verbose {
        eprintln!("{}", "Generating recommendations...".cyan());
    }

    let recommendations = generate_recommendations(&findings);
    println!("{} Generated {} recommendations", "✓".green(), recommendations.len());

    let metadata = ReportMetadata {
        project_path: project.project_path.display().to_string(),
        manifest_path: project.manifest_path.display().to_string(),
    };
    let report = Report::from_analysis(metadata, project.dag().len(), findings, recommendations);

    print_analysis_summary(&report);

    std::fs::create_dir_all(output_path)?;

    if format.wants_markdown() {
        let md_path = output_path.join("analysis_report.md");
        let content = markdown::generate_markdown_report(project.dag(), &report);
        std::fs::write(&md_path, content)?;
        println!("{} Markdown report: {}", "✓".green(), md_path.display().to_string().cyan());
    }

    if format.wants_json() {
        let json_path = output_path.join("analysis_report.json");
        report.save_to_file(&json_path)?;
        println!("{} JSON report: {}", "✓".green(), json_path.display().to_string().cyan());
    }

    println!();
    println!("{}", "✓ Analysis complete!".green().bold());

    Ok(())
}

/// Print analysis summary to stdout
fn print_analysis_summary(report: &Report) {
    println!();
    println!("{}", "=".repeat(60).bright_blue());
    println!("{}", "Analysis Summary".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Models analyzed: {}", report.summary.total_models);
    println!();

    let severity = &report.summary.findings_by_severity;

    println!("{}", "Findings:".bold());
    if severity.error > 0 {
        println!("  Errors:   {}", severity.error.to_string().red().bold());
    } else {
        println!("  Errors:   {}", severity.error.to_string().green());
    }

    if severity.warn > 0 {
        println!("  Warnings: {}", severity.warn.to_string().yellow());
    } else {
        println!("  Warnings: {}", severity.warn.to_string().green());
    }

    println!("  Info:     {}", severity.info);
    println!();

    println!(
        "{} {}",
        "Recommendations:".bold(),
        report.summary.total_recommendations
    );

    for rec in &report.recommendations {
        println!(
            "  [{}] {}",
            format!("P{}", rec.priority).bold(),
            rec.title.yellow()
        );
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
