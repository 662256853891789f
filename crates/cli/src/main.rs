use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use siteiq_analyzer::ContentAnalyzer;
use siteiq_conflicts::{CannibalizationReport, ConflictDetector, ConsolidationOutcome};
use siteiq_linker::LinkEngine;
use std::path::PathBuf;

mod pages;

#[derive(Parser)]
#[command(name = "siteiq")]
#[command(about = "Content intelligence for keyword-driven sites", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a content file against target keywords
    Analyze(AnalyzeArgs),

    /// Detect keyword cannibalization across a page export
    Conflicts(ConflictsArgs),

    /// Suggest contextual internal links for one page
    Links(LinksArgs),

    /// Audit the internal link graph of a page export
    Audit(AuditArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Text file to analyze
    #[arg(long)]
    file: PathBuf,

    /// Target keywords (comma-separated)
    #[arg(long, value_delimiter = ',')]
    keywords: Vec<String>,
}

#[derive(Args)]
struct ConflictsArgs {
    /// Page export: JSON array of pages
    #[arg(long)]
    pages: PathBuf,

    /// Apply the top N consolidation recommendations to the loaded pages
    #[arg(long, value_name = "N")]
    consolidate: Option<usize>,
}

#[derive(Args)]
struct LinksArgs {
    /// Page export: JSON array of pages
    #[arg(long)]
    pages: PathBuf,

    /// URL path of the page to suggest links for
    #[arg(long)]
    page: String,
}

#[derive(Args)]
struct AuditArgs {
    /// Page export: JSON array of pages
    #[arg(long)]
    pages: PathBuf,
}

/// Conflict report together with the consolidation actions taken on it.
#[derive(Serialize)]
struct ConflictsOutput {
    report: CannibalizationReport,
    consolidation: ConsolidationOutcome,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Analyze(args) => run_analyze(args).await,
        Commands::Conflicts(args) => run_conflicts(args).await,
        Commands::Links(args) => run_links(args).await,
        Commands::Audit(args) => run_audit(args).await,
    }
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let analyzer = ContentAnalyzer::new();
    let analysis = analyzer.analyze(&content, &args.keywords);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

async fn run_conflicts(args: ConflictsArgs) -> Result<()> {
    let mut catalogue = pages::load_catalogue(&args.pages).await?;
    let mut detector = ConflictDetector::new();
    let report = detector.detect_cannibalization(&catalogue);

    if let Some(top_n) = args.consolidate {
        let consolidation = detector.auto_consolidate(&mut catalogue, Some(top_n));
        let output = ConflictsOutput {
            report,
            consolidation,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

async fn run_links(args: LinksArgs) -> Result<()> {
    let catalogue = pages::load_catalogue(&args.pages).await?;
    let page = catalogue
        .page(&args.page)
        .with_context(|| format!("Page {} not found in the export", args.page))?;

    let mut engine = LinkEngine::new();
    let suggestions =
        engine.generate_link_suggestions(&page.body, &page.url, &page.keywords, &catalogue);
    println!("{}", serde_json::to_string_pretty(&suggestions)?);
    Ok(())
}

async fn run_audit(args: AuditArgs) -> Result<()> {
    let catalogue = pages::load_catalogue(&args.pages).await?;
    let mut engine = LinkEngine::new();
    let audit = engine.link_audit(&catalogue);
    println!("{}", serde_json::to_string_pretty(&audit)?);
    Ok(())
}
