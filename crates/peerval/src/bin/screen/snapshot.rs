//! Fundamentals snapshot loaded from CSV.

use std::path::Path;

use peerval::{
    primitives::{RawFundamentals, Security, Symbol},
    utils::InMemorySource,
};
use polars::prelude::*;

/// Listings and fundamentals read from one snapshot file.
#[derive(Debug)]
pub(crate) struct Snapshot {
    pub(crate) listings: Vec<Security>,
    pub(crate) source: InMemorySource,
}

impl Snapshot {
    /// Read a snapshot CSV. `ticker` is required; `name`, `category` and every
    /// fundamentals column are optional.
    pub(crate) fn load(path: &Path) -> PolarsResult<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Self::from_frame(&df)
    }

    pub(crate) fn from_frame(df: &DataFrame) -> PolarsResult<Self> {
        let tickers = text_column(df, "ticker")?;
        let names = text_column(df, "name").unwrap_or_else(|_| vec![None; df.height()]);
        let categories = text_column(df, "category").unwrap_or_else(|_| vec![None; df.height()]);

        let f = |name: &str| float_column(df, name);
        let price = f("price")?;
        let trailing_pe = f("trailing_pe")?;
        let forward_pe = f("forward_pe")?;
        let trailing_eps = f("trailing_eps")?;
        let enterprise_value = f("enterprise_value")?;
        let ebitda = f("ebitda")?;
        let market_cap = f("market_cap")?;
        let shares_outstanding = f("shares_outstanding")?;
        let book_value = f("book_value")?;
        let total_debt = f("total_debt")?;
        let total_cash = f("total_cash")?;
        let total_revenue = f("total_revenue")?;
        let return_on_equity = f("return_on_equity")?;
        let profit_margin = f("profit_margin")?;
        let high = f("fifty_two_week_high")?;
        let low = f("fifty_two_week_low")?;
        let dividend_yield = f("dividend_yield")?;
        let beta = f("beta")?;

        let mut listings = Vec::with_capacity(df.height());
        let mut source = InMemorySource::new();

        for (i, ticker) in tickers.iter().enumerate() {
            let Some(ticker) = ticker.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
                tracing::warn!(row = i, "snapshot row without ticker, skipping");
                continue;
            };
            let symbol = Symbol::normalized(ticker);
            if source.contains(&symbol) {
                tracing::warn!(%symbol, "duplicate snapshot row, keeping the first");
                continue;
            }

            let name = names[i].as_deref().unwrap_or(ticker);
            listings.push(Security::from_listing(symbol.as_str(), name, categories[i].as_deref()));
            source.insert(
                symbol,
                RawFundamentals {
                    price: price[i],
                    trailing_pe: trailing_pe[i],
                    forward_pe: forward_pe[i],
                    trailing_eps: trailing_eps[i],
                    enterprise_value: enterprise_value[i],
                    ebitda: ebitda[i],
                    market_cap: market_cap[i],
                    shares_outstanding: shares_outstanding[i],
                    book_value: book_value[i],
                    total_debt: total_debt[i],
                    total_cash: total_cash[i],
                    total_revenue: total_revenue[i],
                    return_on_equity: return_on_equity[i],
                    profit_margin: profit_margin[i],
                    fifty_two_week_high: high[i],
                    fifty_two_week_low: low[i],
                    dividend_yield: dividend_yield[i],
                    beta: beta[i],
                },
            );
        }

        Ok(Self { listings, source })
    }
}

fn text_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column.str()?.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Missing columns read as all-null.
fn float_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let column = column.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}
