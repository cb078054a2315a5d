//! Deterministic, symbol-keyed synthetic data source. Serves offline/demo
//! sessions and backs the aggregator when every real provider is exhausted.
//! Every operation always produces a result; nothing here can fail.

use chrono::{Duration, Utc};
use market_core::{CompanyOverview, DailyBar, DataSource, NewsItem, QuoteSnapshot, SearchMatch};

pub mod fixtures;

/// What to return when a search query matches no canned key. The original
/// dashboard returned the first canned set; `Empty` is the opt-in
/// alternative for callers that prefer honest misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMissPolicy {
    #[default]
    FirstCanned,
    Empty,
}

#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    search_miss: SearchMissPolicy,
}

impl MockProvider {
    pub fn new(search_miss: SearchMissPolicy) -> Self {
        Self { search_miss }
    }

    /// Curated fixture when one exists (merged with the matching quote
    /// fixture), otherwise a fully populated generic profile. Never fails.
    pub fn company_overview(&self, symbol: &str) -> CompanyOverview {
        match fixtures::company_fixture(symbol) {
            Some(fixture) => merge_stock_profile(fixture),
            None => generic_overview(symbol),
        }
    }

    /// Index table first, then the stock table, then the fallback symbol's
    /// fixture. The returned snapshot keeps the fixture's own symbol, so a
    /// caller can detect that the fallback was substituted.
    pub fn quote_snapshot(&self, symbol: &str, fallback: &str) -> QuoteSnapshot {
        fixtures::index_quote(symbol)
            .or_else(|| fixtures::stock_quote(symbol))
            .or_else(|| fixtures::index_quote(fallback))
            .or_else(|| fixtures::stock_quote(fallback))
            .unwrap_or_else(fixtures::benchmark_quote)
    }

    /// The subset of the fixture set mentioning any requested symbol; the
    /// full set when no symbols are given.
    pub fn news(&self, symbols: &[String]) -> Vec<NewsItem> {
        let all = fixtures::news_fixtures();
        if symbols.is_empty() {
            return all;
        }
        all.into_iter()
            .filter(|item| {
                item.tickers
                    .iter()
                    .any(|t| symbols.iter().any(|s| s == &t.ticker))
            })
            .collect()
    }

    /// Thirty days of synthetic history with a gentle upward drift. Seeded
    /// by the symbol text: the same symbol always yields the same series.
    pub fn daily_bars(&self, symbol: &str) -> Vec<DailyBar> {
        let seed = symbol
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut rng = Lcg::new(seed);
        let base_price = 80.0 + (seed % 200) as f64;
        let end = Utc::now().date_naive();

        (0..30)
            .map(|i| {
                let date = end - Duration::days(30 - i);
                let close = base_price + (rng.next_unit() * 10.0 - 5.0) + i as f64 * 0.3;
                let open = close - rng.next_unit() * 2.0;
                let high = close + rng.next_unit() * 2.0;
                let low = close - rng.next_unit() * 3.0;
                let volume = 30_000_000.0 + rng.next_unit() * 50_000_000.0;

                DailyBar {
                    date,
                    open: Some(round_cents(open)),
                    high: Some(round_cents(high)),
                    low: Some(round_cents(low)),
                    close: Some(round_cents(close)),
                    volume: Some(volume.floor()),
                }
            })
            .collect()
    }

    /// Case-insensitive substring containment against the canned query
    /// keys. Misses follow the configured policy.
    pub fn search(&self, query: &str) -> Vec<SearchMatch> {
        let needle = query.trim().to_lowercase();
        let sets = fixtures::search_fixtures();

        for (key, matches) in &sets {
            if !needle.is_empty() && (key.contains(&needle) || needle.contains(key)) {
                return matches.clone();
            }
        }

        match self.search_miss {
            SearchMissPolicy::FirstCanned => sets
                .into_iter()
                .next()
                .map(|(_, matches)| matches)
                .unwrap_or_default(),
            SearchMissPolicy::Empty => Vec::new(),
        }
    }
}

/// Generic profile for symbols outside the curated set: every canonical
/// field populated, placeholder numerics, provenance Mock Data.
fn generic_overview(symbol: &str) -> CompanyOverview {
    CompanyOverview {
        symbol: symbol.to_string(),
        name: Some(format!("{} Inc.", symbol)),
        description: Some(format!(
            "{} Inc. is a placeholder profile generated for demo sessions.",
            symbol
        )),
        exchange: Some("NASDAQ".to_string()),
        industry: Some("Technology".to_string()),
        sector: Some("Information Technology".to_string()),
        market_cap: Some(10_000_000_000.0),
        pe_ratio: Some(20.0),
        peg_ratio: Some(2.0),
        price_to_book: Some(3.0),
        price_to_sales: Some(4.0),
        return_on_equity: Some(15.0),
        return_on_assets: Some(8.0),
        operating_margin: Some(20.0),
        quick_ratio: Some(1.5),
        eps: Some(2.50),
        revenue_ttm: Some(5_000_000_000.0),
        gross_profit_ttm: Some(2_000_000_000.0),
        profit_margin: Some(12.0),
        revenue_growth: Some(5.0),
        debt_to_equity: Some(80.0),
        cash: Some(1_000_000_000.0),
        source: DataSource::MockData,
    }
}

/// Fill market-data fields from the matching stock quote fixture when the
/// curated overview lacks them.
fn merge_stock_profile(mut overview: CompanyOverview) -> CompanyOverview {
    if overview.market_cap.is_some() && overview.pe_ratio.is_some() {
        return overview;
    }
    if let Some(profile) = stock_profile(&overview.symbol) {
        overview.market_cap = overview.market_cap.or(Some(profile.0));
        overview.pe_ratio = overview.pe_ratio.or(Some(profile.1));
    }
    overview
}

/// (market cap, P/E) pairs kept alongside the stock quote fixtures.
fn stock_profile(symbol: &str) -> Option<(f64, f64)> {
    match symbol {
        "AAPL" => Some((2_950_000_000_000.0, 32.6)),
        "MSFT" => Some((3_089_000_000_000.0, 37.2)),
        "GOOGL" => Some((1_870_000_000_000.0, 28.5)),
        _ => None,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Minimal deterministic generator; quality does not matter, stability does.
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E3779B97F4A7C15,
        }
    }

    fn next_unit(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 11) as f64 / (1u64 << 53) as f64
    }
}
