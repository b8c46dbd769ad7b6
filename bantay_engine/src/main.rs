#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** bantay **
//! Link, snapshot and ranking tooling for the procurement transparency site.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use bantay_data::{EntityKind, validate_aggregate};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::info;

use bantay_engine::aggregate::build_aggregate_file;
use bantay_engine::config::{BantayConfig, load_config};
use bantay_engine::data_paths::config_path;
use bantay_engine::entity_search::{MemoryIndex, resolve_entity};
use bantay_engine::legacy_slug::{audit, find_collisions};
use bantay_engine::loader::{load_aggregate_file, read_contracts, write_aggregate_file};
use bantay_engine::query::{IndexSettings, SearchQuery};
use bantay_engine::rank::{BucketKey, RecordField, group_and_rank};
use bantay_engine::route::EntityRoute;
use bantay_engine::slug;
use bantay_engine::split::split_csv;

#[derive(Parser)]
#[command(author, version, about = "Slug, snapshot and ranking tools for procurement transparency data.")]
struct Cli {
    /// Configuration file (defaults to the first bantay.toml found).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the URL slug for an entity name.
    Encode { name: String },
    /// Print the entity name a URL slug stands for.
    Decode { segment: String },
    /// Print the detail page path for an entity.
    Route { kind: EntityKind, name: String },
    /// Print the kind and lookup name of a detail page path.
    ParseRoute { path: String },
    /// Check names (one per line) against the legacy lossy slug format.
    Audit { names: PathBuf },
    /// Build an aggregate snapshot from a contract CSV export.
    Aggregate(AggregateArgs),
    /// Print an aggregate snapshot grouped and ranked.
    Rank(RankArgs),
    /// Split a contract CSV export into batches for import.
    Split(SplitArgs),
    /// Resolve a detail page path against an aggregate snapshot.
    Resolve {
        /// Aggregate snapshot for the route's entity kind.
        #[arg(long, value_name = "FILE")]
        aggregate: PathBuf,
        path: String,
    },
    /// Check an aggregate snapshot for consistency.
    Validate { file: PathBuf },
    /// Print the settings body for the contracts index, or for the aggregate indices.
    IndexSettings {
        #[arg(long)]
        entities: bool,
    },
}

#[derive(Args)]
struct AggregateArgs {
    /// Contract CSV export.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    /// Entity kind to aggregate by.
    #[arg(long)]
    kind: EntityKind,
    /// Where to write the JSON snapshot.
    #[arg(long, value_name = "FILE")]
    out: PathBuf,
    /// Data source named in the snapshot title.
    #[arg(long, default_value = "PhilGEPS")]
    source: String,
}

#[derive(Args)]
struct RankArgs {
    /// Aggregate snapshot to rank.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    #[arg(long, value_enum)]
    bucket_key: Option<BucketKey>,
    #[arg(long, value_enum)]
    rank_key: Option<RecordField>,
    #[arg(long, value_enum)]
    tie_break_key: Option<RecordField>,
    /// Records to keep per bucket.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct SplitArgs {
    /// Contract CSV export.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    /// Directory for the batch files.
    #[arg(long, value_name = "DIR", default_value = "csv_batches")]
    out_dir: PathBuf,
    /// Records per batch (defaults to the configured size).
    #[arg(long)]
    batch_size: Option<usize>,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();
    let config_file = cli.config.clone().unwrap_or_else(config_path);
    let config = load_config(&config_file);
    run(cli.command, &config)
}

fn run(command: Commands, config: &BantayConfig) -> Result<ExitCode> {
    match command {
        Commands::Encode { name } => println!("{}", slug::encode(&name)),
        Commands::Decode { segment } => println!("{}", slug::decode(&segment)),
        Commands::Route { kind, name } => {
            let route = EntityRoute::new(kind, name);
            if !route.has_page() {
                bail!("an empty name has no detail page");
            }
            println!("{route}");
        },
        Commands::ParseRoute { path } => {
            let route = EntityRoute::parse(&path)?;
            println!("kind: {}\nname: {}", route.kind, route.name);
        },
        Commands::Audit { names } => return run_audit(&names),
        Commands::Aggregate(args) => {
            let rows = read_contracts(&args.input)?;
            let file = build_aggregate_file(&rows, args.kind, &args.source)?;
            write_aggregate_file(&args.out, &file)?;
        },
        Commands::Rank(args) => run_rank(args, config)?,
        Commands::Split(args) => {
            let batch_size = args.batch_size.unwrap_or(config.split.batch_size);
            let written = split_csv(&args.input, &args.out_dir, batch_size)?;
            println!("Split into {} files in {}", written.len(), args.out_dir.display());
        },
        Commands::Resolve { aggregate, path } => {
            let route = EntityRoute::parse(&path)?;
            let index = config.search.indices.index_for(route.kind);
            let memory = MemoryIndex::from_aggregate(index, load_aggregate_file(&aggregate)?);
            info!("{} records indexed as '{index}'", memory.len(index).unwrap_or(0));

            let record = resolve_entity(&memory, &config.search.indices, &route)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            let contracts = SearchQuery::contracts_of(&route);
            println!("contracts query on '{}': {}", config.search.contracts_index, contracts.to_body()?);
        },
        Commands::IndexSettings { entities } => {
            let (index, settings) = if entities {
                ("aggregate indices", IndexSettings::entities())
            } else {
                (config.search.contracts_index.as_str(), IndexSettings::contracts())
            };
            info!("settings for {index} at {}", config.search.host);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        },
        Commands::Validate { file } => {
            let snapshot = load_aggregate_file(&file)?;
            let errors = validate_aggregate(&snapshot);
            if !errors.is_empty() {
                for err in &errors {
                    println!("{} {err}", "-".red());
                }
                println!("{} problems in {}", errors.len().to_string().bold().red(), file.display());
                return Ok(ExitCode::FAILURE);
            }
            println!("{}: {} records {}", file.display(), snapshot.data.len(), "OK".green());
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn run_audit(names_path: &Path) -> Result<ExitCode> {
    let text = fs::read_to_string(names_path).with_context(|| format!("reading names from '{}'", names_path.display()))?;
    let names: Vec<&str> = text.lines().map(str::trim).filter(|line| !line.is_empty()).collect();

    let mut lossy = 0usize;
    for name in &names {
        if let Err(loss) = audit(name) {
            lossy += 1;
            println!("{} {loss}", "lossy:".yellow());
        }
    }
    let collisions = find_collisions(names.iter().copied());
    for collision in &collisions {
        println!("{} '{}': {}", "collision on".bold().red(), collision.slug, collision.names.join(" | "));
    }

    println!(
        "{} names checked, {lossy} lossy, {} collisions",
        names.len(),
        collisions.len()
    );
    if lossy > 0 || !collisions.is_empty() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn run_rank(args: RankArgs, config: &BantayConfig) -> Result<()> {
    let snapshot = load_aggregate_file(&args.input)?;
    let mut rank = config.rank.clone();
    if let Some(bucket_key) = args.bucket_key {
        rank.bucket_key = bucket_key;
    }
    if let Some(rank_key) = args.rank_key {
        rank.rank_key = rank_key;
    }
    if let Some(tie_break_key) = args.tie_break_key {
        rank.tie_break_key = tie_break_key;
    }
    if args.limit.is_some() {
        rank.limit = args.limit;
    }

    for bucket in group_and_rank(&snapshot.data, &rank) {
        println!("[{}] {} of {}", bucket.label.bold(), bucket.records.len(), bucket.total_records);
        for record in &bucket.records {
            println!(
                "  {:<60} {:>8} {:>18.2}",
                record.name, record.contract_count, record.total_amount
            );
        }
    }
    Ok(())
}
