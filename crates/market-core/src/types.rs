use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which upstream produced a canonical record. Every record carries exactly
/// one of these; callers use it to render provenance and to detect synthetic
/// substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    AlphaVantage,
    YahooFinance,
    Polygon,
    MockData,
}

impl DataSource {
    pub fn display_name(&self) -> &'static str {
        match self {
            DataSource::AlphaVantage => "Alpha Vantage",
            DataSource::YahooFinance => "Yahoo Finance",
            DataSource::Polygon => "Polygon.io",
            DataSource::MockData => "Mock Data",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Provider-agnostic company fundamentals. Numeric fields are parsed by the
/// adapters; a value the provider omits, or that fails to parse to a finite
/// number, is `None`. Callers never see an un-parsed string and never
/// branch on key presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub exchange: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub operating_margin: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub revenue_ttm: Option<f64>,
    pub gross_profit_ttm: Option<f64>,
    pub profit_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub cash: Option<f64>,
    pub source: DataSource,
}

/// What an adapter returns for a quote request. Carries no change or
/// percent-change fields: those are derived exactly once, by the
/// aggregator, via [`CanonicalQuote::derive`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub previous_close: Option<f64>,
    pub trading_day: Option<NaiveDate>,
}

/// A quote snapshot with the derived day-over-day change fields and the
/// provenance tag attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalQuote {
    pub symbol: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub trading_day: Option<NaiveDate>,
    pub source: DataSource,
}

impl CanonicalQuote {
    /// Single point of truth for change derivation:
    /// `change = price − previous_close`,
    /// `change_percent = change / previous_close × 100`.
    /// Both are `None` when either input is missing or the previous close
    /// is zero.
    pub fn derive(snapshot: QuoteSnapshot, source: DataSource) -> Self {
        let (change, change_percent) = match (snapshot.price, snapshot.previous_close) {
            (Some(price), Some(prev)) if prev != 0.0 => {
                let change = price - prev;
                (Some(change), Some(change / prev * 100.0))
            }
            _ => (None, None),
        };

        Self {
            symbol: snapshot.symbol,
            open: snapshot.open,
            high: snapshot.high,
            low: snapshot.low,
            price: snapshot.price,
            volume: snapshot.volume,
            previous_close: snapshot.previous_close,
            change,
            change_percent,
            trading_day: snapshot.trading_day,
            source,
        }
    }
}

/// Sentiment attribution of a news item to a single ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSentiment {
    pub ticker: String,
    /// 0.0–1.0, how strongly the article concerns this ticker.
    pub relevance: f64,
    /// −1.0 (bearish) to 1.0 (bullish).
    pub sentiment_score: f64,
    /// Provider-native label, e.g. "Bullish", "Positive", "Neutral".
    pub sentiment_label: String,
}

/// A news article normalized across providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub summary: Option<String>,
    pub url: String,
    pub source_name: Option<String>,
    pub published_at: DateTime<Utc>,
    pub tickers: Vec<TickerSentiment>,
}

/// One row of a symbol search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    pub symbol: String,
    pub name: Option<String>,
    pub instrument_type: Option<String>,
    pub region: Option<String>,
    pub currency: Option<String>,
    pub match_score: Option<f64>,
}

/// One day of OHLCV history. Series are returned oldest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}
