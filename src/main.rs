//! AuditLens - agent-framework audit analyzer
//!
//! A CLI tool that parses audit-cycle issues, computes compliance metrics
//! for every agent of the framework, grades the cycle and writes a
//! markdown report, an SVG badge and a rolling history.
//!
//! Exit codes:
//!   0 - Success (grade at or above --fail-below, or no gate set)
//!   1 - Runtime error (config, issue source, missing issue, etc.)
//!   2 - Grade below the --fail-below threshold

mod analysis;
mod cli;
mod config;
mod error;
mod history;
mod models;
mod parser;
mod report;
mod source;

use analysis::{aggregate, assemble_audit, AuditAnalysis, Grader};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use error::AuditError;
use history::{AuditHistory, HistoryEntry, HISTORY_FILE_NAME};
use models::{AuditRecord, IssueRecord};
use report::Badge;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// File names written into the reports directory.
const ANALYSIS_FILE_NAME: &str = "latest-analysis.json";
const REPORT_FILE_NAME: &str = "latest-report.md";
const BADGE_FILE_PATH: &str = "badges/quality-badge.svg";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("AuditLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .auditlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!(
        "✅ Created {} with default settings.",
        config::CONFIG_FILE_NAME
    );
    println!("   Edit it to customize the agent roster, grade tiers and output paths.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the complete analysis. Returns exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;
    let grader = Grader::new(&config.grades)?;

    // Resolve the --fail-below gate before doing any work
    let fail_rank = match args.fail_below {
        Some(ref grade) => Some(grader.rank_of(grade).ok_or_else(|| {
            AuditError::InvalidConfig(format!("unknown grade '{}' for --fail-below", grade))
        })?),
        None => None,
    };

    // Step 1: Fetch issues
    let issue_source = args.issue_source(&config.github.owner, &config.github.repo);
    if !args.quiet {
        println!("📥 Loading audit issues from {}", issue_source.describe());
    }
    let issues = issue_source.fetch(&config, !args.quiet).await?;
    let issues = source::select_issues(issues, args.issue, args.latest)?;

    if args.inspect {
        return handle_inspect(&issues);
    }

    // Step 2: Parse every document
    let audits: Vec<AuditRecord> = issues
        .iter()
        .map(|issue| assemble_audit(issue, &config))
        .collect();
    info!("Parsed {} audit(s)", audits.len());

    // Step 3: Aggregate and grade
    let result = aggregate(&audits, &config).ok_or(AuditError::NoAudits)?;
    let analysis = AuditAnalysis::new(result, &grader);

    // Step 4: Write outputs
    let reports_dir = Path::new(&config.output.reports_dir);
    write_outputs(&analysis, &config, reports_dir, args.no_history)?;

    if let Some(format) = args.print {
        let output = match format {
            OutputFormat::Json => report::generate_json_report(&analysis)?,
            OutputFormat::Markdown => {
                report::generate_markdown_report(&analysis, &config, Utc::now())
            }
        };
        println!("{}", output);
    }

    // Print summary
    let metadata = &analysis.result.metadata;
    if !args.quiet {
        println!("\n📊 Audit Summary:");
        println!("   Audit: {} ({})", metadata.audit_id, metadata.date);
        println!(
            "   Environment: {}",
            config.environment_name(metadata.environment)
        );
        println!(
            "   Uses: {} | Violations: {}",
            metadata.total_uses, metadata.total_violations
        );
        println!(
            "   Success rate: {}%",
            analysis.result.global.success_rate_pct
        );
        println!(
            "   Grade: {} ({})",
            analysis.grade.grade, analysis.grade.description
        );
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!(
            "\n✅ Analysis complete! Reports saved to: {}",
            reports_dir.display()
        );
    }

    // Check --fail-below gate
    if let (Some(threshold), Some(grade)) = (fail_rank, grader.rank_of(&analysis.grade.grade)) {
        if grade > threshold {
            eprintln!(
                "\n⛔ Grade {} is below {}. Failing (exit code 2).",
                analysis.grade.grade,
                args.fail_below.as_deref().unwrap_or_default()
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Write the analysis JSON, markdown report, badge and history.
fn write_outputs(
    analysis: &AuditAnalysis,
    config: &Config,
    reports_dir: &Path,
    skip_history: bool,
) -> Result<()> {
    let badge_path = reports_dir.join(BADGE_FILE_PATH);
    if let Some(parent) = badge_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let analysis_path = reports_dir.join(ANALYSIS_FILE_NAME);
    let json = report::generate_json_report(analysis)?;
    std::fs::write(&analysis_path, json)
        .with_context(|| format!("Failed to write {}", analysis_path.display()))?;
    info!("Analysis saved to {}", analysis_path.display());

    let report_path = reports_dir.join(REPORT_FILE_NAME);
    let markdown = report::generate_markdown_report(analysis, config, Utc::now());
    std::fs::write(&report_path, markdown)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;
    info!("Report saved to {}", report_path.display());

    let badge = Badge::quality(&analysis.grade, analysis.result.global.success_rate_pct);
    std::fs::write(&badge_path, badge.to_svg())
        .with_context(|| format!("Failed to write {}", badge_path.display()))?;
    info!("Badge saved to {}", badge_path.display());

    if skip_history {
        debug!("History update skipped");
        return Ok(());
    }

    let history_path = reports_dir.join(HISTORY_FILE_NAME);
    let history = AuditHistory::update_file(
        &history_path,
        HistoryEntry::from_analysis(analysis),
        config.output.history_cap,
        Utc::now(),
    )?;
    info!(
        "History updated: {} audit(s), average {}%",
        history.summary.total_audits, history.summary.average_success_rate
    );

    Ok(())
}

/// Handle --inspect: print the tables of every selected issue, write nothing.
fn handle_inspect(issues: &[IssueRecord]) -> Result<i32> {
    println!("\n🔍 Inspecting {} issue(s)...\n", issues.len());

    for issue in issues {
        println!("#{} {}", issue.number, issue.title);

        let tables: Vec<parser::Table> = parser::extract_tables(issue.body_text()).collect();
        if tables.is_empty() {
            println!("   No markdown tables found.\n");
            continue;
        }

        for (i, table) in tables.iter().enumerate() {
            println!(
                "   Table {} ({} rows): {}",
                i + 1,
                table.rows.len(),
                table.header.join(" | ")
            );
            for row in &table.rows {
                println!("     {}", row.join(" | "));
            }
        }
        println!();
    }

    println!("✅ Inspection complete. No files were written.");
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
