use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use scout_rank::config::ScoutConfig;
use scout_rank::export::export_ranking;
use scout_rank::ranking::{PercentilePopulation, RankingRequest, RankingResult};
use scout_rank::{ProfileReport, Scout};

#[derive(Debug, Parser)]
#[command(name = "scout_rank", about = "Rank football players by per-90 percentile scores")]
struct Cli {
    /// Season CSV; falls back to SCOUT_DATA_PATH.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the ranked table.
    Rank(RankArgs),
    /// Print one player's percentile profile.
    Profile(ProfileArgs),
    /// List players whose name contains QUERY.
    Search { query: String },
}

#[derive(Debug, Args)]
struct RankArgs {
    /// Stat to rank by (repeatable).
    #[arg(long = "stat")]
    stats: Vec<String>,
    /// Position token to keep, e.g. FW (repeatable).
    #[arg(long = "position")]
    positions: Vec<String>,
    /// Weight as stat=value (repeatable).
    #[arg(long = "weight", value_parser = parse_weight)]
    weights: Vec<(String, f64)>,
    #[arg(long)]
    max_age: Option<u32>,
    /// filtered | global
    #[arg(long, value_parser = parse_population)]
    population: Option<PercentilePopulation>,
    #[arg(long)]
    top: Option<usize>,
    /// Also write the ranking to an .xlsx workbook.
    #[arg(long)]
    xlsx: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ProfileArgs {
    #[arg(long)]
    player: String,
    #[arg(long = "stat")]
    stats: Vec<String>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = ScoutConfig::from_env();
    let data = cli
        .data
        .clone()
        .or_else(|| config.data_path.clone())
        .context("no dataset given; pass --data or set SCOUT_DATA_PATH")?;

    let scout = Scout::load(&data, config.pipeline_options())
        .with_context(|| format!("load dataset {}", data.display()))?;

    match cli.command {
        Command::Rank(args) => run_rank(&scout, &config, args),
        Command::Profile(args) => run_profile(&scout, args),
        Command::Search { query } => {
            let hits = scout.search(&query);
            if hits.is_empty() {
                println!("No players match '{query}'");
            }
            for r in hits {
                println!(
                    "{:<28} {:<22} {:<8} {:>5}",
                    r.player,
                    r.team,
                    r.position,
                    r.minutes_in(&scout.options().minutes_column)
                );
            }
            Ok(())
        }
    }
}

fn run_rank(scout: &Scout, config: &ScoutConfig, args: RankArgs) -> Result<()> {
    let stats = if args.stats.is_empty() {
        ScoutConfig::default_stats()
    } else {
        args.stats
    };
    let mut request = RankingRequest::new(stats)
        .positions(args.positions)
        .population(args.population.unwrap_or(config.population));
    for (stat, weight) in args.weights {
        request = request.weight(stat, weight);
    }
    if let Some(age) = args.max_age {
        request = request.max_age(age);
    }

    let result = scout.rank(&request).context("ranking failed")?;
    print_ranking(&result, args.top.unwrap_or(config.top_n));

    if let Some(path) = args.xlsx {
        let top_profiles: Vec<ProfileReport> = result
            .top(5)
            .iter()
            .filter_map(|e| scout.profile_in(&e.record.player, &request).ok())
            .collect();
        let report = export_ranking(&path, scout.fingerprint(), scout.options(), &request, &result, &top_profiles)
            .with_context(|| format!("export {}", path.display()))?;
        println!("Wrote {} rows to {}", report.ranked_rows, path.display());
    }
    Ok(())
}

fn run_profile(scout: &Scout, args: ProfileArgs) -> Result<()> {
    let stats = if args.stats.is_empty() {
        ScoutConfig::default_stats()
    } else {
        args.stats
    };
    let report = scout.profile(&args.player, &stats).context("profile failed")?;
    let p = &report.profile;

    println!("{} ({}, {})", p.player, p.team, p.position);
    if let Some(age) = p.age_years {
        println!("Age: {age}");
    }
    println!("Minutes: {}", p.minutes);
    println!("{:<28} {:>10} {:>10} {:>10}", "Stat", "Total", "Per 90", "Pct");
    for axis in &p.axes {
        println!(
            "{:<28} {:>10} {:>10} {:>10}",
            axis.stat,
            fmt_opt(axis.raw, 0),
            fmt_opt(axis.per90, 2),
            fmt_opt(axis.percentile, 1)
        );
    }
    for w in &report.warnings {
        eprintln!("{w}");
    }
    Ok(())
}

fn print_ranking(result: &RankingResult, top: usize) {
    println!(
        "{:>4} {:<28} {:<22} {:<8} {:>4} {:>7}",
        "#", "Player", "Team", "Pos", "Age", "Score"
    );
    for (idx, entry) in result.top(top).iter().enumerate() {
        let r = &entry.record;
        println!(
            "{:>4} {:<28} {:<22} {:<8} {:>4} {:>7.1}",
            idx + 1,
            r.player,
            r.team,
            r.position,
            r.age_years.map(|a| a.to_string()).unwrap_or_default(),
            entry.ranking_score
        );
    }
    if !result.warnings.is_empty() {
        eprintln!("Warnings: {}", result.warnings.len());
        for w in result.warnings.iter().take(8) {
            eprintln!(" - {w}");
        }
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn parse_weight(raw: &str) -> Result<(String, f64)> {
    let (stat, weight) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected stat=weight, got '{raw}'"))?;
    let weight = weight
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid weight in '{raw}'"))?;
    Ok((stat.trim().to_string(), weight))
}

fn parse_population(raw: &str) -> Result<PercentilePopulation> {
    PercentilePopulation::parse(raw).ok_or_else(|| anyhow!("expected filtered or global, got '{raw}'"))
}
