//! Static reference ranges used to locate a metric inside its sector.
//! These are configured bands, not live statistics; the DEFAULT table
//! closes every gap a sector-specific table leaves open.

use serde::{Deserialize, Serialize};

/// The fixed set of fundamentals the scoring engine ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundamentalMetric {
    PeRatio,
    Eps,
    RevenueTtm,
    RevenueGrowth,
    PriceToBook,
    MarketCap,
    Cash,
    DebtToEquity,
}

impl FundamentalMetric {
    pub const ALL: [FundamentalMetric; 8] = [
        FundamentalMetric::PeRatio,
        FundamentalMetric::Eps,
        FundamentalMetric::RevenueTtm,
        FundamentalMetric::RevenueGrowth,
        FundamentalMetric::PriceToBook,
        FundamentalMetric::MarketCap,
        FundamentalMetric::Cash,
        FundamentalMetric::DebtToEquity,
    ];

    /// Display label for UI callers.
    pub fn label(&self) -> &'static str {
        match self {
            FundamentalMetric::PeRatio => "P/E Ratio",
            FundamentalMetric::Eps => "EPS",
            FundamentalMetric::RevenueTtm => "Revenue (TTM)",
            FundamentalMetric::RevenueGrowth => "Revenue Growth",
            FundamentalMetric::PriceToBook => "P/B Ratio",
            FundamentalMetric::MarketCap => "Market Cap",
            FundamentalMetric::Cash => "Cash",
            FundamentalMetric::DebtToEquity => "Debt/Equity",
        }
    }
}

/// A reference band: values are clamped into [min, max] before
/// interpolation. `lower_is_better` inverts the scale for valuation and
/// leverage ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
    pub lower_is_better: bool,
}

const fn band(min: f64, max: f64, lower_is_better: bool) -> MetricRange {
    MetricRange {
        min,
        max,
        lower_is_better,
    }
}

/// Sector-agnostic defaults.
fn default_range(metric: FundamentalMetric) -> MetricRange {
    match metric {
        FundamentalMetric::PeRatio => band(10.0, 40.0, true),
        FundamentalMetric::Eps => band(0.0, 15.0, false),
        FundamentalMetric::RevenueTtm => band(1.0e9, 400.0e9, false),
        FundamentalMetric::RevenueGrowth => band(-10.0, 40.0, false),
        FundamentalMetric::PriceToBook => band(1.0, 40.0, true),
        FundamentalMetric::MarketCap => band(1.0e9, 3.0e12, false),
        FundamentalMetric::Cash => band(1.0e8, 120.0e9, false),
        FundamentalMetric::DebtToEquity => band(0.0, 250.0, true),
    }
}

/// The sector-specific range when configured, else the DEFAULT band.
pub fn range_for(sector: &str, metric: FundamentalMetric) -> MetricRange {
    use FundamentalMetric::*;

    match sector {
        "Technology" | "Information Technology" => match metric {
            PeRatio => band(15.0, 60.0, true),
            RevenueGrowth => band(0.0, 50.0, false),
            PriceToBook => band(2.0, 50.0, true),
            Eps => band(0.0, 12.0, false),
            _ => default_range(metric),
        },
        "Healthcare" => match metric {
            PeRatio => band(12.0, 45.0, true),
            RevenueGrowth => band(-5.0, 30.0, false),
            PriceToBook => band(1.5, 20.0, true),
            _ => default_range(metric),
        },
        "Financial Services" => match metric {
            PeRatio => band(5.0, 20.0, true),
            PriceToBook => band(0.5, 3.0, true),
            DebtToEquity => band(50.0, 400.0, true),
            _ => default_range(metric),
        },
        "Consumer Cyclical" => match metric {
            PeRatio => band(10.0, 35.0, true),
            RevenueGrowth => band(-5.0, 25.0, false),
            _ => default_range(metric),
        },
        "Consumer Defensive" => match metric {
            PeRatio => band(12.0, 30.0, true),
            RevenueGrowth => band(-5.0, 15.0, false),
            _ => default_range(metric),
        },
        "Energy" => match metric {
            PeRatio => band(5.0, 25.0, true),
            PriceToBook => band(0.8, 5.0, true),
            RevenueGrowth => band(-20.0, 30.0, false),
            _ => default_range(metric),
        },
        _ => default_range(metric),
    }
}
