use crate::{
    CompanyOverview, DailyBar, DataSource, NewsItem, ProviderError, QuoteSnapshot, SearchMatch,
};
use async_trait::async_trait;

/// Identity shared by every provider adapter.
pub trait ProviderInfo {
    fn source(&self) -> DataSource;
}

/// Company fundamentals lookup.
#[async_trait]
pub trait OverviewProvider: ProviderInfo + Send + Sync {
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, ProviderError>;
}

/// Latest quote snapshot. Adapters return raw open/close/volume; the
/// aggregator derives the change fields.
#[async_trait]
pub trait QuoteProvider: ProviderInfo + Send + Sync {
    async fn quote_snapshot(&self, symbol: &str) -> Result<QuoteSnapshot, ProviderError>;
}

/// News for one or more tickers. An empty symbol list means "latest market
/// news" where the provider supports it.
#[async_trait]
pub trait NewsProvider: ProviderInfo + Send + Sync {
    async fn news(&self, symbols: &[String]) -> Result<Vec<NewsItem>, ProviderError>;
}

/// Daily OHLCV history, oldest-first.
#[async_trait]
pub trait DailyBarsProvider: ProviderInfo + Send + Sync {
    async fn daily_bars(&self, symbol: &str) -> Result<Vec<DailyBar>, ProviderError>;
}

/// Free-text symbol search.
#[async_trait]
pub trait SearchProvider: ProviderInfo + Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, ProviderError>;
}
