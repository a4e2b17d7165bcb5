//! Tabular rendering of screening results.

use polars::prelude::*;

use crate::{ModelError, ScreenReport};

impl ScreenReport {
    /// Render the rows as a polars `DataFrame`, one row per security, in
    /// report order. Market cap is expressed in ladder units (crores by
    /// default) when `unit` is given.
    ///
    /// # Errors
    /// Returns `ModelError::Polars` if the frame cannot be assembled.
    pub fn to_dataframe(&self, unit: Option<f64>) -> Result<DataFrame, ModelError> {
        let rows = &self.rows;
        let unit = unit.filter(|u| *u > 0.0).unwrap_or(1.0);

        let ticker: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
        let name: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        let category: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        let peer_group: Vec<&str> = rows.iter().map(|r| r.peer_group.as_str()).collect();
        let price: Vec<f64> = rows.iter().map(|r| r.price).collect();
        let fair_value: Vec<f64> = rows.iter().map(|r| r.fair_value).collect();
        let upside: Vec<f64> = rows.iter().map(|r| r.upside_pct).collect();
        let pe: Vec<Option<f64>> = rows.iter().map(|r| r.pe).collect();
        let pe_vs_benchmark: Vec<Option<f64>> = rows.iter().map(|r| r.pe_vs_benchmark).collect();
        let roe: Vec<Option<f64>> = rows.iter().map(|r| r.roe_pct).collect();
        let pb: Vec<Option<f64>> = rows.iter().map(|r| r.pb).collect();
        let margin: Vec<Option<f64>> = rows.iter().map(|r| r.profit_margin_pct).collect();
        let market_cap: Vec<Option<f64>> = rows.iter().map(|r| r.market_cap.map(|m| m / unit)).collect();
        let bucket: Vec<Option<&str>> = rows.iter().map(|r| r.market_cap_bucket.map(|b| b.label())).collect();
        let from_high: Vec<Option<f64>> = rows.iter().map(|r| r.pct_from_high).collect();
        let from_low: Vec<Option<f64>> = rows.iter().map(|r| r.pct_from_low).collect();
        let recommendation: Vec<&str> = rows.iter().map(|r| r.recommendation.label()).collect();

        let df = DataFrame::new(vec![
            Column::new("ticker".into(), ticker),
            Column::new("name".into(), name),
            Column::new("category".into(), category),
            Column::new("peer_group".into(), peer_group),
            Column::new("price".into(), price),
            Column::new("fair_value".into(), fair_value),
            Column::new("upside_pct".into(), upside),
            Column::new("pe".into(), pe),
            Column::new("pe_vs_benchmark".into(), pe_vs_benchmark),
            Column::new("roe_pct".into(), roe),
            Column::new("pb".into(), pb),
            Column::new("profit_margin_pct".into(), margin),
            Column::new("market_cap".into(), market_cap),
            Column::new("market_cap_bucket".into(), bucket),
            Column::new("pct_from_high".into(), from_high),
            Column::new("pct_from_low".into(), from_low),
            Column::new("recommendation".into(), recommendation),
        ])?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use peerval_primitives::{
        BenchmarkRecord, MarketCapBucket, Recommendation, StaticBenchmark, Symbol, ValuationResult,
    };

    use super::*;
    use crate::{ScreenRow, ScreenSummary, Strategy};

    fn row(ticker: &str, upside: f64) -> ScreenRow {
        let benchmark =
            Arc::new(BenchmarkRecord::from_static("Technology", StaticBenchmark::new(25.0, 3.5, 15.0, 20.0)));
        ScreenRow {
            ticker: Symbol::new(ticker),
            name: format!("{ticker} Ltd"),
            category: "Business Software & Services".to_string(),
            peer_group: "Technology".to_string(),
            price: 100.0,
            fair_value: 100.0 + upside,
            upside_pct: upside,
            pe: Some(20.0),
            pe_vs_benchmark: Some(0.8),
            roe_pct: None,
            pb: Some(2.0),
            profit_margin_pct: None,
            market_cap: Some(3e11),
            market_cap_bucket: Some(MarketCapBucket::Mid),
            pct_from_high: None,
            pct_from_low: Some(25.0),
            recommendation: Recommendation::from_upside(upside),
            valuation: ValuationResult {
                methods: BTreeMap::new(),
                blended_fair_value: Some(100.0 + upside),
                upside_pct: Some(upside),
                benchmark,
            },
        }
    }

    #[test]
    fn dataframe_has_one_row_per_result() {
        let report = ScreenReport {
            rows: vec![row("AAA", 30.0), row("BBB", 12.0)],
            summary: ScreenSummary::default(),
            strategy: Strategy::Undervalued,
        };

        let df = report.to_dataframe(Some(1e7)).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 17);

        let upside: Vec<Option<f64>> = df.column("upside_pct").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(upside, vec![Some(30.0), Some(12.0)]);

        let cap: Vec<Option<f64>> = df.column("market_cap").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(cap, vec![Some(30_000.0), Some(30_000.0)]);

        let roe = df.column("roe_pct").unwrap();
        assert_eq!(roe.null_count(), 2);

        let rec: Vec<Option<&str>> = df.column("recommendation").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(rec, vec![Some("Strong Buy"), Some("Hold")]);
    }

    #[test]
    fn empty_report_gives_empty_frame() {
        let report =
            ScreenReport { rows: Vec::new(), summary: ScreenSummary::default(), strategy: Strategy::Any };
        let df = report.to_dataframe(None).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 17);
    }
}
