//! Fallback orchestrator. Walks a fixed per-operation provider priority
//! chain, applying one uniform success/failure policy: each provider is
//! attempted exactly once, any failure advances the chain, and exhaustion
//! either falls through to the synthetic provider or surfaces every
//! provider's failure reason.
//!
//! The orchestrator holds no mutable state; independent requests run
//! concurrently against `&self` with nothing shared to guard.

use alpha_vantage_client::AlphaVantageClient;
use market_core::{
    AggregatorError, CanonicalQuote, CompanyOverview, DailyBar, DailyBarsProvider, DataSource,
    NewsItem, NewsProvider, OverviewProvider, ProviderAttempt, ProviderInfo, QuoteProvider,
    SearchMatch, SearchProvider,
};
use mock_provider::MockProvider;
use polygon_client::PolygonClient;
use std::sync::Arc;
use yahoo_finance_client::YahooFinanceClient;

pub mod config;

pub use config::{AggregatorConfig, MockToggles};
pub use mock_provider::SearchMissPolicy;

/// The per-operation priority chains. Built by [`MarketAggregator::new`]
/// from the default provider stack; injectable for tests and custom wiring.
pub struct ProviderChains {
    pub overview: Vec<Arc<dyn OverviewProvider>>,
    pub quote: Vec<Arc<dyn QuoteProvider>>,
    pub news: Vec<Arc<dyn NewsProvider>>,
    pub daily_bars: Vec<Arc<dyn DailyBarsProvider>>,
    pub search: Vec<Arc<dyn SearchProvider>>,
}

pub struct MarketAggregator {
    chains: ProviderChains,
    mock: MockProvider,
    config: AggregatorConfig,
}

impl MarketAggregator {
    /// Wire the default stack: Alpha Vantage first everywhere, Yahoo
    /// Finance second for overviews, Polygon last. Credentials come from
    /// the environment, with non-secret development fallbacks.
    pub fn new(config: AggregatorConfig) -> Self {
        let alpha = Arc::new(AlphaVantageClient::from_env());
        let yahoo = Arc::new(YahooFinanceClient::new());
        let polygon = Arc::new(PolygonClient::from_env());

        let chains = ProviderChains {
            overview: vec![alpha.clone(), yahoo, polygon.clone()],
            quote: vec![alpha.clone(), polygon.clone()],
            news: vec![alpha.clone(), polygon.clone()],
            daily_bars: vec![alpha.clone(), polygon.clone()],
            search: vec![alpha, polygon],
        };

        Self::with_chains(config, chains)
    }

    pub fn with_chains(config: AggregatorConfig, chains: ProviderChains) -> Self {
        let mock = MockProvider::new(config.search_miss);
        Self {
            chains,
            mock,
            config,
        }
    }

    fn synthetic_enabled(&self, toggle: bool) -> bool {
        self.config.use_mock_data && toggle
    }

    /// In offline/demo mode the chain for a synthetically covered
    /// operation is empty: the request goes straight to exhaustion and is
    /// served by the mock provider without touching the network.
    fn active<'a, T: ?Sized>(&self, chain: &'a [Arc<T>], toggle: bool) -> &'a [Arc<T>] {
        if self.synthetic_enabled(toggle) {
            &[]
        } else {
            chain
        }
    }

    pub async fn company_overview(
        &self,
        symbol: &str,
    ) -> Result<CompanyOverview, AggregatorError> {
        let symbol = normalize_symbol(symbol);
        let mut attempts = Vec::new();

        for provider in self.active(&self.chains.overview, self.config.mock_toggles.overview) {
            let name = provider.source().display_name();
            match provider.company_overview(&symbol).await {
                Ok(overview) => {
                    tracing::info!("{} served overview for {}", name, symbol);
                    return Ok(overview);
                }
                Err(error) => {
                    tracing::warn!(
                        "{} failed overview for {}: {}. Trying next provider.",
                        name,
                        symbol,
                        error
                    );
                    attempts.push(ProviderAttempt {
                        provider: name,
                        error,
                    });
                }
            }
        }

        if self.synthetic_enabled(self.config.mock_toggles.overview) {
            return Ok(self.mock.company_overview(&symbol));
        }

        Err(AggregatorError::AllProvidersExhausted {
            operation: "company_overview",
            attempts,
        })
    }

    /// Latest quote for `symbol`, or for the configured benchmark when no
    /// symbol is given. The change fields are derived here, once,
    /// regardless of which adapter supplied the snapshot.
    pub async fn global_market_status(
        &self,
        symbol: Option<&str>,
    ) -> Result<CanonicalQuote, AggregatorError> {
        let symbol = normalize_symbol(symbol.unwrap_or(&self.config.benchmark_symbol));
        let mut attempts = Vec::new();

        for provider in self.active(&self.chains.quote, self.config.mock_toggles.quote) {
            let name = provider.source().display_name();
            match provider.quote_snapshot(&symbol).await {
                Ok(snapshot) => {
                    tracing::info!("{} served quote for {}", name, symbol);
                    return Ok(CanonicalQuote::derive(snapshot, provider.source()));
                }
                Err(error) => {
                    tracing::warn!(
                        "{} failed quote for {}: {}. Trying next provider.",
                        name,
                        symbol,
                        error
                    );
                    attempts.push(ProviderAttempt {
                        provider: name,
                        error,
                    });
                }
            }
        }

        if self.synthetic_enabled(self.config.mock_toggles.quote) {
            let snapshot = self
                .mock
                .quote_snapshot(&symbol, &self.config.benchmark_symbol);
            return Ok(CanonicalQuote::derive(snapshot, DataSource::MockData));
        }

        Err(AggregatorError::AllProvidersExhausted {
            operation: "global_market_status",
            attempts,
        })
    }

    pub async fn news(&self, symbols: &[String]) -> Result<Vec<NewsItem>, AggregatorError> {
        let symbols: Vec<String> = symbols.iter().map(|s| normalize_symbol(s)).collect();
        let mut attempts = Vec::new();

        for provider in self.active(&self.chains.news, self.config.mock_toggles.news) {
            let name = provider.source().display_name();
            match provider.news(&symbols).await {
                Ok(items) => {
                    tracing::info!("{} served {} news items", name, items.len());
                    return Ok(self.filter_relevance(items));
                }
                Err(error) => {
                    tracing::warn!("{} failed news: {}. Trying next provider.", name, error);
                    attempts.push(ProviderAttempt {
                        provider: name,
                        error,
                    });
                }
            }
        }

        if self.synthetic_enabled(self.config.mock_toggles.news) {
            return Ok(self.filter_relevance(self.mock.news(&symbols)));
        }

        Err(AggregatorError::AllProvidersExhausted {
            operation: "news",
            attempts,
        })
    }

    pub async fn daily_bars(&self, symbol: &str) -> Result<Vec<DailyBar>, AggregatorError> {
        let symbol = normalize_symbol(symbol);
        let mut attempts = Vec::new();

        for provider in self.active(&self.chains.daily_bars, self.config.mock_toggles.daily_bars)
        {
            let name = provider.source().display_name();
            match provider.daily_bars(&symbol).await {
                Ok(bars) => {
                    tracing::info!("{} served {} daily bars for {}", name, bars.len(), symbol);
                    return Ok(bars);
                }
                Err(error) => {
                    tracing::warn!(
                        "{} failed daily bars for {}: {}. Trying next provider.",
                        name,
                        symbol,
                        error
                    );
                    attempts.push(ProviderAttempt {
                        provider: name,
                        error,
                    });
                }
            }
        }

        if self.synthetic_enabled(self.config.mock_toggles.daily_bars) {
            return Ok(self.mock.daily_bars(&symbol));
        }

        Err(AggregatorError::AllProvidersExhausted {
            operation: "daily_bars",
            attempts,
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, AggregatorError> {
        let query = query.trim();
        let mut attempts = Vec::new();

        for provider in self.active(&self.chains.search, self.config.mock_toggles.search) {
            let name = provider.source().display_name();
            match provider.search(query).await {
                Ok(matches) => {
                    tracing::info!("{} served {} search matches", name, matches.len());
                    return Ok(matches);
                }
                Err(error) => {
                    tracing::warn!(
                        "{} failed search '{}': {}. Trying next provider.",
                        name,
                        query,
                        error
                    );
                    attempts.push(ProviderAttempt {
                        provider: name,
                        error,
                    });
                }
            }
        }

        if self.synthetic_enabled(self.config.mock_toggles.search) {
            return Ok(self.mock.search(query));
        }

        Err(AggregatorError::AllProvidersExhausted {
            operation: "search",
            attempts,
        })
    }

    /// Drop sentiment tuples below the configured relevance floor. Applied
    /// uniformly, whichever source produced the items.
    fn filter_relevance(&self, items: Vec<NewsItem>) -> Vec<NewsItem> {
        let floor = self.config.min_news_relevance;
        items
            .into_iter()
            .map(|mut item| {
                item.tickers.retain(|t| t.relevance >= floor);
                item
            })
            .collect()
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use market_core::{
        ProviderError, ProviderInfo, QuoteSnapshot, TickerSentiment,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn empty_chains() -> ProviderChains {
        ProviderChains {
            overview: vec![],
            quote: vec![],
            news: vec![],
            daily_bars: vec![],
            search: vec![],
        }
    }

    fn offline_config() -> AggregatorConfig {
        AggregatorConfig::default()
    }

    fn live_config() -> AggregatorConfig {
        AggregatorConfig {
            use_mock_data: false,
            ..AggregatorConfig::default()
        }
    }

    fn overview_for(symbol: &str, source: DataSource) -> CompanyOverview {
        CompanyOverview {
            symbol: symbol.to_string(),
            name: Some(format!("{} Test Co", symbol)),
            description: None,
            exchange: None,
            industry: None,
            sector: Some("Technology".to_string()),
            market_cap: Some(1.0e9),
            pe_ratio: Some(20.0),
            peg_ratio: None,
            price_to_book: None,
            price_to_sales: None,
            return_on_equity: None,
            return_on_assets: None,
            operating_margin: None,
            quick_ratio: None,
            eps: None,
            revenue_ttm: None,
            gross_profit_ttm: None,
            profit_margin: None,
            revenue_growth: None,
            debt_to_equity: None,
            cash: None,
            source,
        }
    }

    /// Fails every call with a fixed error, counting invocations.
    struct FailingProvider {
        source: DataSource,
        error: ProviderError,
        calls: AtomicUsize,
    }

    impl FailingProvider {
        fn new(source: DataSource, error: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                source,
                error,
                calls: AtomicUsize::new(0),
            })
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ProviderInfo for FailingProvider {
        fn source(&self) -> DataSource {
            self.source
        }
    }

    #[async_trait]
    impl OverviewProvider for FailingProvider {
        async fn company_overview(
            &self,
            _symbol: &str,
        ) -> Result<CompanyOverview, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    #[async_trait]
    impl QuoteProvider for FailingProvider {
        async fn quote_snapshot(&self, _symbol: &str) -> Result<QuoteSnapshot, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    #[async_trait]
    impl NewsProvider for FailingProvider {
        async fn news(&self, _symbols: &[String]) -> Result<Vec<NewsItem>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    /// Succeeds with a canned overview, recording the symbol it was asked
    /// for.
    struct StaticOverviewProvider {
        source: DataSource,
        requested: Mutex<Option<String>>,
    }

    impl StaticOverviewProvider {
        fn new(source: DataSource) -> Arc<Self> {
            Arc::new(Self {
                source,
                requested: Mutex::new(None),
            })
        }

        fn requested(&self) -> Option<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl ProviderInfo for StaticOverviewProvider {
        fn source(&self) -> DataSource {
            self.source
        }
    }

    #[async_trait]
    impl OverviewProvider for StaticOverviewProvider {
        async fn company_overview(
            &self,
            symbol: &str,
        ) -> Result<CompanyOverview, ProviderError> {
            *self.requested.lock().unwrap() = Some(symbol.to_string());
            Ok(overview_for(symbol, self.source))
        }
    }

    struct StaticQuoteProvider {
        source: DataSource,
    }

    impl ProviderInfo for StaticQuoteProvider {
        fn source(&self) -> DataSource {
            self.source
        }
    }

    #[async_trait]
    impl QuoteProvider for StaticQuoteProvider {
        async fn quote_snapshot(&self, symbol: &str) -> Result<QuoteSnapshot, ProviderError> {
            Ok(QuoteSnapshot {
                symbol: symbol.to_string(),
                open: Some(518.20),
                high: Some(521.30),
                low: Some(516.90),
                price: Some(520.45),
                volume: Some(45_789_230.0),
                previous_close: Some(517.70),
                trading_day: NaiveDate::from_ymd_opt(2024, 3, 15),
            })
        }
    }

    struct StaticNewsProvider;

    impl ProviderInfo for StaticNewsProvider {
        fn source(&self) -> DataSource {
            DataSource::Polygon
        }
    }

    #[async_trait]
    impl NewsProvider for StaticNewsProvider {
        async fn news(&self, _symbols: &[String]) -> Result<Vec<NewsItem>, ProviderError> {
            Ok(vec![NewsItem {
                title: "Test".to_string(),
                summary: None,
                url: "https://example.com".to_string(),
                source_name: None,
                published_at: chrono::Utc::now(),
                tickers: vec![
                    TickerSentiment {
                        ticker: "AAPL".to_string(),
                        relevance: 0.9,
                        sentiment_score: 0.5,
                        sentiment_label: "Positive".to_string(),
                    },
                    TickerSentiment {
                        ticker: "MSFT".to_string(),
                        relevance: 0.05,
                        sentiment_score: 0.0,
                        sentiment_label: "Neutral".to_string(),
                    },
                ],
            }])
        }
    }

    #[tokio::test]
    async fn fallback_order_and_provenance() {
        let failing = FailingProvider::new(
            DataSource::AlphaVantage,
            ProviderError::RateLimited("call frequency".to_string()),
        );
        let succeeding = StaticOverviewProvider::new(DataSource::Polygon);

        let mut chains = empty_chains();
        chains.overview = vec![failing.clone(), succeeding.clone()];
        let aggregator = MarketAggregator::with_chains(live_config(), chains);

        let overview = aggregator.company_overview("AAPL").await.unwrap();
        assert_eq!(overview.source, DataSource::Polygon);
        assert_eq!(failing.count(), 1);
    }

    #[tokio::test]
    async fn exhaustion_reports_every_attempt() {
        let first = FailingProvider::new(
            DataSource::AlphaVantage,
            ProviderError::RateLimited("daily cap".to_string()),
        );
        let second = FailingProvider::new(
            DataSource::Polygon,
            ProviderError::TransportError("connection refused".to_string()),
        );

        let mut chains = empty_chains();
        chains.overview = vec![first.clone(), second.clone()];
        let aggregator = MarketAggregator::with_chains(live_config(), chains);

        let err = aggregator.company_overview("AAPL").await.unwrap_err();
        match &err {
            AggregatorError::AllProvidersExhausted {
                operation,
                attempts,
            } => {
                assert_eq!(*operation, "company_overview");
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].provider, "Alpha Vantage");
                assert_eq!(attempts[1].provider, "Polygon.io");
            }
        }
        assert!(err.rate_limited());
        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 1);
    }

    #[tokio::test]
    async fn offline_mode_never_touches_providers() {
        let failing = FailingProvider::new(
            DataSource::AlphaVantage,
            ProviderError::TransportError("should not run".to_string()),
        );

        let mut chains = empty_chains();
        chains.overview = vec![failing.clone()];
        let aggregator = MarketAggregator::with_chains(offline_config(), chains);

        let overview = aggregator.company_overview("ZZZZ").await.unwrap();
        assert_eq!(overview.source, DataSource::MockData);
        assert_eq!(overview.name.as_deref(), Some("ZZZZ Inc."));
        assert_eq!(failing.count(), 0);
    }

    #[tokio::test]
    async fn overview_never_fails_with_synthetic_enabled() {
        let aggregator = MarketAggregator::with_chains(offline_config(), empty_chains());

        for symbol in ["AAPL", "MSFT", "GOOGL", "ZZZZ", "XQJW"] {
            let overview = aggregator.company_overview(symbol).await.unwrap();
            assert_eq!(overview.source, DataSource::MockData);
        }
    }

    #[tokio::test]
    async fn symbols_are_normalized_to_uppercase() {
        let provider = StaticOverviewProvider::new(DataSource::YahooFinance);
        let mut chains = empty_chains();
        chains.overview = vec![provider.clone()];
        let aggregator = MarketAggregator::with_chains(live_config(), chains);

        aggregator.company_overview("  aapl ").await.unwrap();
        assert_eq!(provider.requested().as_deref(), Some("AAPL"));
    }

    #[tokio::test]
    async fn quote_change_fields_are_derived_once() {
        let mut chains = empty_chains();
        chains.quote = vec![Arc::new(StaticQuoteProvider {
            source: DataSource::AlphaVantage,
        })];
        let aggregator = MarketAggregator::with_chains(live_config(), chains);

        let quote = aggregator.global_market_status(Some("SPY")).await.unwrap();
        assert_eq!(quote.source, DataSource::AlphaVantage);
        assert!((quote.change.unwrap() - 2.75).abs() < 1e-9);
        assert!((quote.change_percent.unwrap() - (2.75 / 517.70 * 100.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn quote_defaults_to_the_benchmark_symbol() {
        let aggregator = MarketAggregator::with_chains(offline_config(), empty_chains());

        let quote = aggregator.global_market_status(None).await.unwrap();
        assert_eq!(quote.symbol, "SPY");
        assert_eq!(quote.source, DataSource::MockData);
        // Derivation also runs on the synthetic path.
        assert!(quote.change_percent.is_some());
    }

    #[tokio::test]
    async fn unknown_quote_symbol_substitutes_benchmark_fixture() {
        let aggregator = MarketAggregator::with_chains(offline_config(), empty_chains());

        let quote = aggregator.global_market_status(Some("UNKNOWN")).await.unwrap();
        // Substitution is detectable: the fixture keeps its own symbol.
        assert_eq!(quote.symbol, "SPY");
    }

    #[tokio::test]
    async fn news_filters_low_relevance_tuples() {
        let mut chains = empty_chains();
        chains.news = vec![Arc::new(StaticNewsProvider)];
        let aggregator = MarketAggregator::with_chains(live_config(), chains);

        let items = aggregator
            .news(&["AAPL".to_string(), "MSFT".to_string()])
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].tickers.len(), 1);
        assert_eq!(items[0].tickers[0].ticker, "AAPL");
    }

    #[tokio::test]
    async fn news_exhaustion_surfaces_without_synthetic() {
        let failing = FailingProvider::new(
            DataSource::AlphaVantage,
            ProviderError::RateLimited("daily cap".to_string()),
        );
        let mut chains = empty_chains();
        chains.news = vec![failing];

        let mut config = live_config();
        config.mock_toggles.news = false;
        let aggregator = MarketAggregator::with_chains(config, chains);

        let err = aggregator.news(&["AAPL".to_string()]).await.unwrap_err();
        assert!(err.rate_limited());
    }

    #[tokio::test]
    async fn search_miss_returns_first_canned_set_by_default() {
        let aggregator = MarketAggregator::with_chains(offline_config(), empty_chains());

        let matches = aggregator.search("zzz-no-match").await.unwrap();
        assert!(!matches.is_empty());
        assert_eq!(matches[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn search_miss_policy_empty_is_honored() {
        let config = AggregatorConfig {
            search_miss: SearchMissPolicy::Empty,
            ..AggregatorConfig::default()
        };
        let aggregator = MarketAggregator::with_chains(config, empty_chains());

        let matches = aggregator.search("zzz-no-match").await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn daily_bars_fall_back_to_synthetic_series() {
        let aggregator = MarketAggregator::with_chains(offline_config(), empty_chains());

        let bars = aggregator.daily_bars("AAPL").await.unwrap();
        assert_eq!(bars.len(), 30);
    }
}
