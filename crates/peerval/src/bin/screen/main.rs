//! Valuation screening CLI.
//!
//! Screens a fundamentals snapshot against dynamic peer-group benchmarks.
//!
//! Usage: `cargo run --bin screen -- SNAPSHOT.csv [--preset NAME | --group NAME] [OPTIONS]`
//! Example: `cargo run --bin screen -- nse.csv --preset small-cap-gems --live --suffix .NS`

mod snapshot;
mod yahoo;

use std::{env, fs::File, path::PathBuf, sync::Arc};

use peerval::{
    model::{
        BenchmarkAggregator, CancellationToken, FairValueEstimator, ScreenCriteria, ScreenReport, Screener,
        Strategy, preset, presets,
    },
    peers::PeerGroupRegistry,
    traits::FundamentalsSource,
    utils::ResilientSource,
};
use polars::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::{snapshot::Snapshot, yahoo::YahooOverlay};

/// Rows returned when no limit is given.
const DEFAULT_LIMIT: usize = 25;

const USAGE: &str = "\
Usage: screen SNAPSHOT.csv [--preset NAME | --group NAME] [OPTIONS]
       screen --list-presets

Options:
  --strategy S       undervalued | overvalued | any (default: undervalued)
  --upside-min PCT   minimum upside
  --upside-max PCT   maximum upside
  --pe-max X         maximum P/E
  --roe-min PCT      minimum return on equity
  --pb-max X         maximum price/book
  --limit N          rows to return, 0 for all (default: 25)
  --live             refresh price and 52-week range from Yahoo Finance
  --suffix S         suffix appended to tickers for Yahoo (e.g. .NS)
  --out FILE         write the result table as CSV";

#[derive(Debug, Default)]
struct Args {
    snapshot: Option<PathBuf>,
    preset: Option<String>,
    group: Option<String>,
    strategy: Option<Strategy>,
    upside_min: Option<f64>,
    upside_max: Option<f64>,
    pe_max: Option<f64>,
    roe_min: Option<f64>,
    pb_max: Option<f64>,
    limit: Option<usize>,
    live: bool,
    suffix: String,
    out: Option<PathBuf>,
    list_presets: bool,
}

impl Args {
    fn criteria(&self) -> ScreenCriteria {
        let mut criteria = ScreenCriteria::new(self.strategy.unwrap_or(Strategy::Undervalued));
        criteria.upside_min = self.upside_min;
        criteria.upside_max = self.upside_max;
        criteria.pe_max = self.pe_max;
        criteria.roe_min = self.roe_min;
        criteria.pb_max = self.pb_max;
        criteria
    }
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = || iter.next().cloned().ok_or_else(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--preset" => parsed.preset = Some(value()?),
            "--group" => parsed.group = Some(value()?),
            "--strategy" => parsed.strategy = Some(parse_strategy(&value()?)?),
            "--upside-min" => parsed.upside_min = Some(parse_number(arg, &value()?)?),
            "--upside-max" => parsed.upside_max = Some(parse_number(arg, &value()?)?),
            "--pe-max" => parsed.pe_max = Some(parse_number(arg, &value()?)?),
            "--roe-min" => parsed.roe_min = Some(parse_number(arg, &value()?)?),
            "--pb-max" => parsed.pb_max = Some(parse_number(arg, &value()?)?),
            "--limit" => parsed.limit = Some(parse_number(arg, &value()?)?),
            "--suffix" => parsed.suffix = value()?,
            "--out" => parsed.out = Some(PathBuf::from(value()?)),
            "--live" => parsed.live = true,
            "--list-presets" => parsed.list_presets = true,
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            path if parsed.snapshot.is_none() => parsed.snapshot = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument {extra}")),
        }
    }

    if parsed.preset.is_some() && parsed.group.is_some() {
        return Err("--preset and --group are exclusive".to_string());
    }
    if parsed.snapshot.is_none() && !parsed.list_presets {
        return Err("missing snapshot file".to_string());
    }
    Ok(parsed)
}

fn parse_number<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<T, String> {
    raw.parse().map_err(|_| format!("{flag}: invalid number {raw}"))
}

fn parse_strategy(raw: &str) -> Result<Strategy, String> {
    match raw.to_ascii_lowercase().as_str() {
        "undervalued" => Ok(Strategy::Undervalued),
        "overvalued" => Ok(Strategy::Overvalued),
        "any" => Ok(Strategy::Any),
        other => Err(format!("unknown strategy {other}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    if args.list_presets {
        for p in presets() {
            println!("{:<32} {}", p.slug(), p.name);
        }
        return Ok(());
    }

    match run(&args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.snapshot.as_ref().ok_or("missing snapshot file")?;
    let snapshot = Snapshot::load(path)?;
    tracing::info!(path = %path.display(), listings = snapshot.listings.len(), "snapshot loaded");

    let registry = Arc::new(PeerGroupRegistry::builtin().with_listings(snapshot.listings)?);
    let source: Arc<dyn FundamentalsSource> = if args.live {
        Arc::new(ResilientSource::new(YahooOverlay::new(snapshot.source, args.suffix.clone())?))
    } else {
        Arc::new(snapshot.source)
    };

    let aggregator = Arc::new(BenchmarkAggregator::new(registry, source));
    let screener = Screener::new(aggregator, Arc::new(FairValueEstimator::new()));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing with partial results");
            on_interrupt.cancel();
        }
    });

    let report = screen(&screener, args, &cancel).await?;
    println!("{}", report.summary.describe());

    let mut df = report.to_dataframe(Some(screener.config().ladder.unit))?;
    match &args.out {
        Some(out) => {
            CsvWriter::new(File::create(out)?).include_header(true).finish(&mut df)?;
            println!("wrote {} rows to {}", df.height(), out.display());
        }
        None => println!("{df}"),
    }
    Ok(())
}

async fn screen(
    screener: &Screener,
    args: &Args,
    cancel: &CancellationToken,
) -> Result<ScreenReport, Box<dyn std::error::Error>> {
    let limit = args.limit.unwrap_or(DEFAULT_LIMIT);

    if let Some(name) = &args.preset {
        let mut chosen = preset(name)?;
        if let Some(limit) = args.limit {
            chosen.result_limit = limit;
        }
        tracing::info!(preset = %chosen.name, "running preset");
        return Ok(screener.screen_preset(&chosen, cancel).await?);
    }

    let criteria = args.criteria();

    if let Some(group) = &args.group {
        let members =
            screener.aggregator().registry().members(group).ok_or_else(|| format!("unknown peer group {group}"))?;
        return Ok(screener.screen_with_cancel(members, group, &criteria, limit, cancel).await?);
    }

    let candidates = screener.aggregator().registry().symbols().to_vec();
    Ok(screener.screen_listed(&candidates, &criteria, limit, cancel).await?)
}
