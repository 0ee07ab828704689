use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use seopipe_core::{AllocationRequest, ArticleDocument, Section};
use seopipe_engine::{allocate, density, extract, schema, textprep};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "seopipe")]
#[command(about = "Keyword density/placement engine and LLM output extractor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute keyword densities over content (json or text output).
    Density(DensityCmd),
    /// Compute a tiered keyword-mention budget for a document outline.
    Allocate(AllocateCmd),
    /// Recover a JSON object from free-form LLM output.
    Extract(ExtractCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct DensityCmd {
    /// Plain-text content file ("-" reads stdin).
    #[arg(long, conflicts_with = "document")]
    content: Option<PathBuf>,
    /// Article document (json: meta/intro/sections/faq); densities are
    /// computed over its canonical concatenation.
    #[arg(long)]
    document: Option<PathBuf>,
    /// Keyword (repeatable).
    #[arg(long)]
    keyword: Vec<String>,
    /// File containing keywords (one per line; blank lines and #comments ignored).
    #[arg(long)]
    keywords_file: Vec<PathBuf>,
    /// Output format. Allowed: json, text
    #[arg(long, default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct AllocateCmd {
    /// Full allocation request (json: total_words/sections/keyword/target_density;
    /// "-" reads stdin). Overrides the individual flags below.
    #[arg(long)]
    request: Option<PathBuf>,
    /// Outline file (json array of sections).
    #[arg(long)]
    outline: Option<PathBuf>,
    /// Total document word count.
    #[arg(long)]
    total_words: Option<u64>,
    /// The keyword to budget.
    #[arg(long)]
    keyword: Option<String>,
    /// Target density in percent (e.g. 1.5).
    #[arg(long, allow_hyphen_values = true)]
    target_density: Option<f64>,
    /// Output format. Allowed: json, text
    #[arg(long, default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct ExtractCmd {
    /// Raw LLM output file ("-" reads stdin).
    #[arg(long)]
    raw: PathBuf,
    /// Normalize known score-field aliases (overall_score -> total_score, ...).
    #[arg(long, action = clap::ArgAction::Set, default_value_t = false)]
    normalize_scores: bool,
    /// Output format. Allowed: json, text
    #[arg(long, default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format. Allowed: json, text
    #[arg(long, default_value = "json")]
    output: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Density(cmd) => run_density(cmd),
        Commands::Allocate(cmd) => run_allocate(cmd),
        Commands::Extract(cmd) => run_extract(cmd),
        Commands::Version(cmd) => run_version(cmd),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut s = String::new();
        std::io::stdin()
            .read_to_string(&mut s)
            .context("read stdin")?;
        return Ok(s);
    }
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn read_lines_file(path: &Path) -> Result<Vec<String>> {
    let body = read_input(path)?;
    Ok(body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn parse_output_mode(s: &str) -> Result<bool> {
    match s {
        "json" => Ok(true),
        "text" => Ok(false),
        other => bail!("unknown output format {other:?} (allowed: json, text)"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct DensityReport {
    ok: bool,
    total_words: usize,
    densities: std::collections::BTreeMap<String, seopipe_core::KeywordDensity>,
}

fn run_density(cmd: DensityCmd) -> Result<()> {
    let json_out = parse_output_mode(&cmd.output)?;

    let content = match (&cmd.content, &cmd.document) {
        (Some(path), None) => read_input(path)?,
        (None, Some(path)) => {
            let doc: ArticleDocument =
                serde_json::from_str(&read_input(path)?).context("parse document json")?;
            doc.concatenated_text()
        }
        (None, None) => bail!("pass --content or --document"),
        (Some(_), Some(_)) => unreachable!("clap conflicts_with"),
    };

    let mut keywords = cmd.keyword.clone();
    for f in &cmd.keywords_file {
        keywords.extend(read_lines_file(f)?);
    }
    if keywords.is_empty() {
        bail!("no keywords given (use --keyword or --keywords-file)");
    }

    let densities = density::keyword_density(&content, &keywords)?;
    let report = DensityReport {
        ok: true,
        total_words: textprep::word_count(&content),
        densities,
    };

    if json_out {
        print_json(&report)?;
    } else {
        println!("total_words: {}", report.total_words);
        for (kw, d) in &report.densities {
            println!("{kw}: count={} density={}%", d.count, d.density);
        }
    }
    Ok(())
}

fn run_allocate(cmd: AllocateCmd) -> Result<()> {
    let json_out = parse_output_mode(&cmd.output)?;

    let req = if let Some(path) = &cmd.request {
        serde_json::from_str(&read_input(path)?).context("parse allocation request json")?
    } else {
        let outline = cmd
            .outline
            .as_ref()
            .context("pass --request, or --outline with the individual flags")?;
        let sections: Vec<Section> =
            serde_json::from_str(&read_input(outline)?).context("parse outline json")?;
        AllocationRequest {
            total_words: cmd.total_words.context("pass --total-words")?,
            sections,
            keyword: cmd.keyword.clone().context("pass --keyword")?,
            target_density: cmd.target_density.context("pass --target-density")?,
        }
    };

    let allocation = allocate::allocate(&req)?;

    if json_out {
        print_json(&allocation)?;
    } else {
        println!(
            "keyword: {} target: {} allocated: {}",
            allocation.keyword, allocation.total_target, allocation.total_allocated
        );
        for tier in &allocation.tiers {
            println!("[{}] total={}", tier.tier.as_str(), tier.total);
            for item in &tier.items {
                println!("  {} x{}", item.slot, item.count);
            }
        }
        for w in &allocation.warnings {
            println!("warning: {w}");
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ExtractReport {
    ok: bool,
    strategy: &'static str,
    value: serde_json::Value,
}

fn run_extract(cmd: ExtractCmd) -> Result<()> {
    let json_out = parse_output_mode(&cmd.output)?;
    let raw = read_input(&cmd.raw)?;

    let (mut value, strategy) = extract::extract_structured_with_trace(&raw)?;
    if cmd.normalize_scores {
        schema::normalize_aliases(&mut value, schema::SCORE_ALIASES);
    }

    if json_out {
        print_json(&ExtractReport {
            ok: true,
            strategy,
            value,
        })?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

fn run_version(cmd: VersionCmd) -> Result<()> {
    let json_out = parse_output_mode(&cmd.output)?;
    let version = env!("CARGO_PKG_VERSION");
    if json_out {
        print_json(&serde_json::json!({ "name": "seopipe", "version": version }))?;
    } else {
        println!("seopipe {version}");
    }
    Ok(())
}
