//! Example: Sector Screen Against a Dynamic Benchmark
//!
//! Walks through a complete peerval pass on a synthetic universe:
//! 1. Generating fundamentals for three sectors (with a few data errors)
//! 2. Computing each sector's benchmark from its peers
//! 3. Valuing one security in detail
//! 4. Screening a sector and rendering the result table
//!
//! Run with: `cargo run -p peerval --example sector_screen`

use std::{sync::Arc, time::Duration};

use peerval::{
    model::{BenchmarkAggregator, FairValueEstimator, ScreenCriteria, Screener, Strategy},
    peers::PeerGroupRegistry,
    primitives::{RawFundamentals, Security, Symbol},
    utils::{FetchConfig, InMemorySource, ResilientSource},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, LogNormal};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Securities generated per sector.
const PER_SECTOR: usize = 40;

/// (category, median P/E) per sector.
const SECTORS: &[(&str, f64)] = &[
    ("Business Software & Services", 28.0),
    ("Money Center Banks", 12.0),
    ("Drugs - Generic", 30.0),
];

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("peerval_model=info").init();

    let (listings, source) = synthetic_universe(7)?;
    let registry = Arc::new(PeerGroupRegistry::builtin().with_listings(listings)?);

    // No pacing or caching needed for an in-memory source.
    let config = FetchConfig { min_interval: Duration::ZERO, cache_ttl: None, ..FetchConfig::default() };
    let source = Arc::new(ResilientSource::with_config(source, config));

    let aggregator = Arc::new(BenchmarkAggregator::new(Arc::clone(&registry), Arc::clone(&source) as Arc<dyn peerval::traits::FundamentalsSource>));
    let estimator = Arc::new(FairValueEstimator::new());

    print_benchmarks(&aggregator, &registry).await;
    print_single_valuation(&aggregator, &estimator, &source).await?;

    let screener = Screener::new(aggregator, estimator);
    let criteria = ScreenCriteria::new(Strategy::Undervalued).with_upside_min(15.0).with_pe_max(30.0);
    let report = screener.screen_peer_group("Technology", &criteria, 10, 0).await?;

    println!("\nTechnology screen: {}", report.summary.describe());
    println!("{}", report.to_dataframe(Some(1e7))?);

    Ok(())
}

// ============================================================================
// SYNTHETIC DATA
// ============================================================================

fn synthetic_universe(seed: u64) -> Result<(Vec<Security>, InMemorySource), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut listings = Vec::new();
    let mut source = InMemorySource::new();

    for (s, (category, median_pe)) in SECTORS.iter().enumerate() {
        let pe_dist = LogNormal::new(median_pe.ln(), 0.35)?;

        for i in 0..PER_SECTOR {
            let ticker = format!("S{s}N{i:02}");
            let price: f64 = rng.gen_range(100.0..3_000.0);
            let shares: f64 = rng.gen_range(5e7..2e9);

            // Every tenth security carries a vendor data error.
            let pe = if i % 10 == 9 { median_pe * 12.0 } else { pe_dist.sample(&mut rng) };
            let market_cap = price * shares;

            listings.push(Security::from_listing(&ticker, &format!("Synthetic {ticker}"), Some(category)));
            source.insert(
                Symbol::new(ticker),
                RawFundamentals {
                    price: Some(price),
                    trailing_pe: Some(pe),
                    trailing_eps: Some(price / pe),
                    market_cap: Some(market_cap),
                    shares_outstanding: Some(shares),
                    book_value: Some(price / rng.gen_range(1.0..6.0)),
                    ebitda: Some(market_cap / rng.gen_range(8.0..22.0)),
                    enterprise_value: Some(market_cap * rng.gen_range(0.95..1.25)),
                    total_debt: Some(market_cap * rng.gen_range(0.0..0.3)),
                    total_cash: Some(market_cap * rng.gen_range(0.0..0.08)),
                    return_on_equity: Some(rng.gen_range(0.02..0.35)),
                    profit_margin: Some(rng.gen_range(0.03..0.25)),
                    fifty_two_week_high: Some(price * rng.gen_range(1.0..1.4)),
                    fifty_two_week_low: Some(price * rng.gen_range(0.6..1.0)),
                    ..RawFundamentals::default()
                },
            );
        }
    }

    Ok((listings, source))
}

// ============================================================================
// OUTPUT
// ============================================================================

async fn print_benchmarks(aggregator: &BenchmarkAggregator, registry: &PeerGroupRegistry) {
    println!("\n{:<28} {:>8} {:>8} {:>10} {:>8}", "Peer group", "P/E", "P/B", "EV/EBITDA", "ROE %");
    println!("{}", "-".repeat(66));
    for group in registry.groups() {
        let b = aggregator.compute(&group.name).await;
        let marker = if b.is_fully_static() { " (static)" } else { "" };
        println!("{:<28} {:>8.2} {:>8.2} {:>10.2} {:>8.2}{marker}", group.name, b.pe, b.pb, b.ev_ebitda, b.roe);
    }
}

async fn print_single_valuation<S: peerval::traits::FundamentalsSource>(
    aggregator: &BenchmarkAggregator,
    estimator: &FairValueEstimator,
    source: &S,
) -> Result<(), Box<dyn std::error::Error>> {
    let symbol = Symbol::new("S0N00");
    let fundamentals = source.fetch(&symbol).await?;
    let benchmark = aggregator.compute("Technology").await;
    let result = estimator.estimate(&fundamentals, &benchmark);

    println!("\nValuation of {symbol} (price {:.2}):", fundamentals.price.unwrap_or_default());
    for (method, estimate) in &result.methods {
        match estimate {
            Some(e) => println!("  {:<20} fair value {:>10.2}", method.to_string(), e.fair_value),
            None => println!("  {:<20} n/a", method.to_string()),
        }
    }
    if let (Some(fv), Some(up)) = (result.blended_fair_value, result.upside_pct) {
        println!("  {:<20} fair value {fv:>10.2}  upside {up:+.1}%", "blended");
    }
    Ok(())
}
