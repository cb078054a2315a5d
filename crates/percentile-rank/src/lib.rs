//! Percentile scoring engine: locates each fundamental metric inside a
//! sector-aware reference band and maps it to a 0–100 score with a fixed
//! seven-band color scale. Pure functions throughout: identical inputs
//! always produce identical output.

use market_core::CompanyOverview;
use serde::{Deserialize, Serialize};

pub mod ranges;

pub use ranges::{range_for, FundamentalMetric, MetricRange};

/// Seven-band classification of a percentile, plus the marker for metrics
/// whose raw value is unavailable. Cut points: 85 / 70 / 60 / 40 / 25 / 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    Exceptional,
    Strong,
    AboveAverage,
    Average,
    BelowAverage,
    Weak,
    Poor,
    Unknown,
}

impl ScoreBand {
    pub fn from_percentile(percentile: f64) -> Self {
        match percentile {
            p if p >= 85.0 => ScoreBand::Exceptional,
            p if p >= 70.0 => ScoreBand::Strong,
            p if p >= 60.0 => ScoreBand::AboveAverage,
            p if p >= 40.0 => ScoreBand::Average,
            p if p >= 25.0 => ScoreBand::BelowAverage,
            p if p >= 10.0 => ScoreBand::Weak,
            _ => ScoreBand::Poor,
        }
    }

    pub fn hex_color(&self) -> &'static str {
        match self {
            ScoreBand::Exceptional => "#1565c0",
            ScoreBand::Strong => "#2e7d32",
            ScoreBand::AboveAverage => "#66bb6a",
            ScoreBand::Average => "#ffb300",
            ScoreBand::BelowAverage => "#fb8c00",
            ScoreBand::Weak => "#f4511e",
            ScoreBand::Poor => "#c62828",
            ScoreBand::Unknown => "#9e9e9e",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Exceptional => "Exceptional",
            ScoreBand::Strong => "Strong",
            ScoreBand::AboveAverage => "Above Average",
            ScoreBand::Average => "Average",
            ScoreBand::BelowAverage => "Below Average",
            ScoreBand::Weak => "Weak",
            ScoreBand::Poor => "Poor",
            ScoreBand::Unknown => "Unknown",
        }
    }
}

/// One display-ready scored metric. Recomputed on every overview fetch,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMetric {
    pub metric: FundamentalMetric,
    pub formatted_value: String,
    pub percentile: f64,
    pub band: ScoreBand,
}

/// Score a single metric against the sector's reference band.
pub fn rank_metric(metric: FundamentalMetric, raw: Option<f64>, sector: &str) -> RankedMetric {
    let value = match raw.filter(|v| v.is_finite()) {
        Some(value) => value,
        None => {
            return RankedMetric {
                metric,
                formatted_value: "N/A".to_string(),
                percentile: 0.0,
                band: ScoreBand::Unknown,
            }
        }
    };

    let range = range_for(sector, metric);
    let clamped = value.clamp(range.min, range.max);
    let mut percentile = (clamped - range.min) / (range.max - range.min) * 100.0;
    if range.lower_is_better {
        percentile = 100.0 - percentile;
    }

    RankedMetric {
        metric,
        // The display value is the raw figure, not the clamped one.
        formatted_value: format_value(metric, value),
        percentile,
        band: ScoreBand::from_percentile(percentile),
    }
}

/// Score the full fixed metric list for one overview record.
pub fn rank_overview(overview: &CompanyOverview) -> Vec<RankedMetric> {
    let sector = overview.sector.as_deref().unwrap_or("");
    FundamentalMetric::ALL
        .into_iter()
        .map(|metric| rank_metric(metric, metric_value(overview, metric), sector))
        .collect()
}

fn metric_value(overview: &CompanyOverview, metric: FundamentalMetric) -> Option<f64> {
    match metric {
        FundamentalMetric::PeRatio => overview.pe_ratio,
        FundamentalMetric::Eps => overview.eps,
        FundamentalMetric::RevenueTtm => overview.revenue_ttm,
        FundamentalMetric::RevenueGrowth => overview.revenue_growth,
        FundamentalMetric::PriceToBook => overview.price_to_book,
        FundamentalMetric::MarketCap => overview.market_cap,
        FundamentalMetric::Cash => overview.cash,
        FundamentalMetric::DebtToEquity => overview.debt_to_equity,
    }
}

fn format_value(metric: FundamentalMetric, value: f64) -> String {
    match metric {
        FundamentalMetric::MarketCap | FundamentalMetric::Cash | FundamentalMetric::RevenueTtm => {
            format_currency(value)
        }
        FundamentalMetric::RevenueGrowth => format!("{:.1}%", value),
        _ => format!("{:.2}", value),
    }
}

/// Currency with a magnitude suffix: $2.9T, $61.6B, $450.0M.
fn format_currency(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1.0e12 {
        format!("${:.1}T", value / 1.0e12)
    } else if magnitude >= 1.0e9 {
        format!("${:.1}B", value / 1.0e9)
    } else if magnitude >= 1.0e6 {
        format!("${:.1}M", value / 1.0e6)
    } else {
        format!("${:.0}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::DataSource;

    fn tech_overview() -> CompanyOverview {
        CompanyOverview {
            symbol: "AAPL".to_string(),
            name: Some("Apple Inc.".to_string()),
            description: None,
            exchange: Some("NASDAQ".to_string()),
            industry: Some("Consumer Electronics".to_string()),
            sector: Some("Technology".to_string()),
            market_cap: Some(2_950_000_000_000.0),
            pe_ratio: Some(32.6),
            peg_ratio: Some(2.5),
            price_to_book: Some(36.8),
            price_to_sales: Some(7.5),
            return_on_equity: Some(75.1),
            return_on_assets: Some(28.0),
            operating_margin: Some(30.2),
            quick_ratio: Some(1.2),
            eps: Some(5.81),
            revenue_ttm: Some(394_328_000_000.0),
            gross_profit_ttm: Some(170_782_000_000.0),
            profit_margin: Some(24.6),
            revenue_growth: Some(7.8),
            debt_to_equity: Some(195.2),
            cash: Some(61_630_000_000.0),
            source: DataSource::MockData,
        }
    }

    #[test]
    fn worked_example_pe_22_in_technology() {
        let ranked = rank_metric(FundamentalMetric::PeRatio, Some(22.0), "Technology");

        // (22 − 15) / 45 × 100 = 15.56, inverted to 84.44.
        assert!((ranked.percentile - 84.444444444).abs() < 1e-6);
        assert_eq!(ranked.band, ScoreBand::Strong);
        assert_eq!(ranked.formatted_value, "22.00");
    }

    #[test]
    fn percentile_is_always_in_bounds() {
        let extremes = [
            -1.0e15, -100.0, 0.0, 0.5, 9.99, 100.0, 1.0e6, 1.0e15, f64::MAX,
        ];
        for metric in FundamentalMetric::ALL {
            for raw in extremes {
                let ranked = rank_metric(metric, Some(raw), "Technology");
                assert!(
                    (0.0..=100.0).contains(&ranked.percentile),
                    "{:?} raw={} gave {}",
                    metric,
                    raw,
                    ranked.percentile
                );
                assert_ne!(ranked.band, ScoreBand::Unknown);
            }
        }
    }

    #[test]
    fn non_finite_values_are_unknown() {
        for raw in [None, Some(f64::NAN), Some(f64::INFINITY), Some(f64::NEG_INFINITY)] {
            let ranked = rank_metric(FundamentalMetric::Eps, raw, "Technology");
            assert_eq!(ranked.percentile, 0.0);
            assert_eq!(ranked.band, ScoreBand::Unknown);
            assert_eq!(ranked.formatted_value, "N/A");
        }
    }

    #[test]
    fn scoring_is_idempotent() {
        let overview = tech_overview();
        let first = rank_overview(&overview);
        let second = rank_overview(&overview);
        assert_eq!(first, second);
    }

    #[test]
    fn higher_is_better_metrics_are_monotone() {
        let mut last = f64::NEG_INFINITY;
        for raw in (0..200).map(|i| i as f64 * 1.0e9) {
            let ranked = rank_metric(FundamentalMetric::RevenueTtm, Some(raw), "Technology");
            assert!(ranked.percentile >= last);
            last = ranked.percentile;
        }
    }

    #[test]
    fn lower_is_better_metrics_are_antitone() {
        let mut last = f64::INFINITY;
        for raw in (0..100).map(|i| i as f64) {
            let ranked = rank_metric(FundamentalMetric::PeRatio, Some(raw), "Technology");
            assert!(ranked.percentile <= last);
            last = ranked.percentile;
        }
    }

    #[test]
    fn band_cut_points_are_exact() {
        assert_eq!(ScoreBand::from_percentile(100.0), ScoreBand::Exceptional);
        assert_eq!(ScoreBand::from_percentile(85.0), ScoreBand::Exceptional);
        assert_eq!(ScoreBand::from_percentile(84.999), ScoreBand::Strong);
        assert_eq!(ScoreBand::from_percentile(70.0), ScoreBand::Strong);
        assert_eq!(ScoreBand::from_percentile(69.999), ScoreBand::AboveAverage);
        assert_eq!(ScoreBand::from_percentile(60.0), ScoreBand::AboveAverage);
        assert_eq!(ScoreBand::from_percentile(59.999), ScoreBand::Average);
        assert_eq!(ScoreBand::from_percentile(40.0), ScoreBand::Average);
        assert_eq!(ScoreBand::from_percentile(39.999), ScoreBand::BelowAverage);
        assert_eq!(ScoreBand::from_percentile(25.0), ScoreBand::BelowAverage);
        assert_eq!(ScoreBand::from_percentile(24.999), ScoreBand::Weak);
        assert_eq!(ScoreBand::from_percentile(10.0), ScoreBand::Weak);
        assert_eq!(ScoreBand::from_percentile(9.999), ScoreBand::Poor);
        assert_eq!(ScoreBand::from_percentile(0.0), ScoreBand::Poor);
    }

    #[test]
    fn formatting_by_metric_class() {
        let cap = rank_metric(
            FundamentalMetric::MarketCap,
            Some(2_950_000_000_000.0),
            "Technology",
        );
        assert_eq!(cap.formatted_value, "$3.0T");

        let cash = rank_metric(FundamentalMetric::Cash, Some(61_630_000_000.0), "Technology");
        assert_eq!(cash.formatted_value, "$61.6B");

        let growth = rank_metric(FundamentalMetric::RevenueGrowth, Some(7.8), "Technology");
        assert_eq!(growth.formatted_value, "7.8%");

        let eps = rank_metric(FundamentalMetric::Eps, Some(5.81), "Technology");
        assert_eq!(eps.formatted_value, "5.81");
    }

    #[test]
    fn rank_overview_scores_all_eight_metrics() {
        let ranked = rank_overview(&tech_overview());
        assert_eq!(ranked.len(), 8);
        assert!(ranked.iter().all(|r| r.band != ScoreBand::Unknown));
    }

    #[test]
    fn unknown_sector_falls_back_to_default_ranges() {
        let mut overview = tech_overview();
        overview.sector = None;
        let ranked = rank_overview(&overview);
        assert_eq!(ranked.len(), 8);
        // Default P/E band is 10–40 with lower better: 32.6 lands low.
        let pe = ranked
            .iter()
            .find(|r| r.metric == FundamentalMetric::PeRatio)
            .unwrap();
        assert!((pe.percentile - (100.0 - (32.6 - 10.0) / 30.0 * 100.0)).abs() < 1e-9);
    }
}
