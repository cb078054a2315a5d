use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use market_core::{
    CompanyOverview, DailyBar, DailyBarsProvider, DataSource, NewsItem, NewsProvider,
    OverviewProvider, ProviderError, ProviderInfo, QuoteProvider, QuoteSnapshot, SearchMatch,
    SearchProvider, TickerSentiment,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const BASE_URL: &str = "https://api.polygon.io";

/// Placeholder for local development; real deployments set POLYGON_API_KEY.
const FALLBACK_API_KEY: &str = "demo";

/// How far back the daily-bars operation reaches. 150 calendar days covers
/// roughly 100 trading sessions.
const DAILY_BARS_LOOKBACK_DAYS: i64 = 150;

/// Polygon provides no sentiment on its news feed; a keyword scan over the
/// headline and description stands in for it.
const POSITIVE_WORDS: &[&str] = &["up", "rise", "gain", "bull", "growth", "positive", "beat"];
const NEGATIVE_WORDS: &[&str] = &["down", "fall", "drop", "bear", "decline", "negative", "miss"];

#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
}

impl PolygonClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { api_key, client }
    }

    pub fn from_env() -> Self {
        let api_key =
            std::env::var("POLYGON_API_KEY").unwrap_or_else(|_| FALLBACK_API_KEY.to_string());
        Self::new(api_key)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        symbol: &str,
    ) -> Result<T, ProviderError> {
        tracing::debug!("Polygon request: {} ({})", url, symbol);
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::TransportError(e.to_string()))?;

        classify_status(response.status(), symbol)?;

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}

impl ProviderInfo for PolygonClient {
    fn source(&self) -> DataSource {
        DataSource::Polygon
    }
}

/// Polygon signals failures through HTTP status codes.
fn classify_status(status: StatusCode, symbol: &str) -> Result<(), ProviderError> {
    match status.as_u16() {
        429 => Err(ProviderError::RateLimited("HTTP 429".to_string())),
        404 => Err(ProviderError::InvalidSymbol(symbol.to_string())),
        s if !status.is_success() => Err(ProviderError::TransportError(format!("HTTP {}", s))),
        _ => Ok(()),
    }
}

fn estimate_sentiment(text: &str) -> (f64, &'static str) {
    let content = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().any(|w| content.contains(w));
    let negative = NEGATIVE_WORDS.iter().any(|w| content.contains(w));

    if positive && !negative {
        (0.5, "Positive")
    } else if negative && !positive {
        (-0.3, "Negative")
    } else {
        (0.0, "Neutral")
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: TickerDetails,
}

#[derive(Debug, Default, Deserialize)]
struct TickerDetails {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    primary_exchange: Option<String>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    pe_ratio: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct CompanyMeta {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    sector: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinancialsResponse {
    #[serde(default)]
    results: Vec<FinancialEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct FinancialEntry {
    #[serde(default)]
    ratios: HashMap<String, serde_json::Value>,
    #[serde(default)]
    financials: Option<Statements>,
}

#[derive(Debug, Default, Deserialize)]
struct Statements {
    #[serde(default)]
    income_statement: HashMap<String, StatementValue>,
}

#[derive(Debug, Default, Deserialize)]
struct StatementValue {
    #[serde(default)]
    value: Option<f64>,
}

impl FinancialEntry {
    fn ratio(&self, key: &str) -> Option<f64> {
        self.ratios
            .get(key)
            .and_then(serde_json::Value::as_f64)
            .filter(|v| v.is_finite())
    }

    fn income(&self, key: &str) -> Option<f64> {
        self.financials
            .as_ref()?
            .income_statement
            .get(key)?
            .value
            .filter(|v| v.is_finite())
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    ticker: SnapshotTicker,
}

#[derive(Debug, Default, Deserialize)]
struct SnapshotTicker {
    #[serde(default)]
    day: Option<SnapshotDay>,
    #[serde(rename = "lastTrade", default)]
    last_trade: Option<SnapshotLastTrade>,
}

#[derive(Debug, Default, Deserialize)]
struct SnapshotDay {
    #[serde(default)]
    o: Option<f64>,
    #[serde(default)]
    h: Option<f64>,
    #[serde(default)]
    l: Option<f64>,
    #[serde(default)]
    v: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SnapshotLastTrade {
    #[serde(default)]
    p: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PrevCloseResponse {
    #[serde(default)]
    results: Vec<PrevBar>,
}

#[derive(Debug, Default, Deserialize)]
struct PrevBar {
    #[serde(default)]
    c: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<NewsResult>,
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    title: String,
    #[serde(default)]
    article_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    published_utc: Option<String>,
    #[serde(default)]
    publisher: Option<Publisher>,
    #[serde(default)]
    tickers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Publisher {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64,
    #[serde(default)]
    o: Option<f64>,
    #[serde(default)]
    h: Option<f64>,
    #[serde(default)]
    l: Option<f64>,
    #[serde(default)]
    c: Option<f64>,
    #[serde(default)]
    v: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TickerSearchResponse {
    #[serde(default)]
    results: Vec<TickerSearchEntry>,
}

#[derive(Debug, Deserialize)]
struct TickerSearchEntry {
    ticker: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    market: Option<String>,
    #[serde(default)]
    locale: Option<String>,
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

fn compose_overview(
    symbol: &str,
    ticker: TickerDetails,
    company: CompanyMeta,
    financial: FinancialEntry,
) -> CompanyOverview {
    // P/E precedence: the financials ratio first, the ticker-reference
    // figure as the fallback.
    let pe_ratio = financial.ratio("priceToEarningsRatio").or(ticker.pe_ratio);

    CompanyOverview {
        symbol: symbol.to_string(),
        name: ticker.name,
        description: company.description,
        exchange: ticker.primary_exchange,
        industry: company.industry,
        sector: company.sector,
        market_cap: ticker.market_cap,
        pe_ratio,
        peg_ratio: financial.ratio("pegRatio"),
        price_to_book: financial.ratio("priceToBookRatio"),
        price_to_sales: financial.ratio("priceToSalesRatio"),
        return_on_equity: financial.ratio("roe").map(|v| v * 100.0),
        return_on_assets: financial.ratio("roa").map(|v| v * 100.0),
        operating_margin: financial.ratio("operatingMargin").map(|v| v * 100.0),
        quick_ratio: financial.ratio("quickRatio"),
        eps: financial.income("basic_earnings_per_share"),
        revenue_ttm: financial.income("revenues"),
        gross_profit_ttm: financial.income("gross_profit"),
        profit_margin: financial.ratio("netProfitMargin").map(|v| v * 100.0),
        revenue_growth: None,
        debt_to_equity: financial.ratio("debtToEquityRatio"),
        cash: None,
        source: DataSource::Polygon,
    }
}

fn compose_snapshot(
    symbol: &str,
    snapshot: SnapshotTicker,
    prev: Option<PrevBar>,
) -> Result<QuoteSnapshot, ProviderError> {
    let last_trade = snapshot.last_trade.and_then(|t| t.p);
    let day = snapshot.day.unwrap_or_default();

    let price = last_trade.ok_or_else(|| {
        ProviderError::MalformedResponse("no current market data available".to_string())
    })?;

    Ok(QuoteSnapshot {
        symbol: symbol.to_string(),
        open: day.o,
        high: day.h,
        low: day.l,
        price: Some(price),
        volume: day.v,
        previous_close: prev.and_then(|b| b.c),
        trading_day: Some(Utc::now().date_naive()),
    })
}

fn news_item_from(article: NewsResult, requested: &[String]) -> NewsItem {
    let text = format!(
        "{} {}",
        article.title,
        article.description.as_deref().unwrap_or("")
    );
    let (score, label) = estimate_sentiment(&text);

    // Attribute the article to the requested tickers when the caller named
    // any, otherwise to the tickers Polygon associated with it.
    let attributed: Vec<&String> = if requested.is_empty() {
        article.tickers.iter().collect()
    } else {
        requested.iter().collect()
    };

    let tickers = attributed
        .into_iter()
        .map(|sym| TickerSentiment {
            ticker: sym.clone(),
            relevance: if article.tickers.contains(sym) { 0.9 } else { 0.5 },
            sentiment_score: score,
            sentiment_label: label.to_string(),
        })
        .collect();

    let published_at = article
        .published_utc
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    NewsItem {
        title: article.title,
        summary: article.description,
        url: article.article_url.unwrap_or_default(),
        source_name: article.publisher.and_then(|p| p.name),
        published_at,
        tickers,
    }
}

// ---------------------------------------------------------------------------
// Trait implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl OverviewProvider for PolygonClient {
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, ProviderError> {
        let details_url = format!("{}/v3/reference/tickers/{}", BASE_URL, symbol);
        let company_url = format!("{}/v1/meta/symbols/{}/company", BASE_URL, symbol);
        let financials_url = format!("{}/v2/reference/financials/{}", BASE_URL, symbol);

        // All three must land before composing; a failed leg fails the whole
        // invocation rather than producing a partial record.
        let (details, company, financials) = tokio::try_join!(
            self.get_json::<TickerDetailsResponse>(&details_url, &[], symbol),
            self.get_json::<CompanyMeta>(&company_url, &[], symbol),
            self.get_json::<FinancialsResponse>(
                &financials_url,
                &[("limit", "1"), ("sort", "filing_date")],
                symbol,
            ),
        )?;

        let financial = financials.results.into_iter().next().unwrap_or_default();
        Ok(compose_overview(symbol, details.results, company, financial))
    }
}

#[async_trait]
impl QuoteProvider for PolygonClient {
    async fn quote_snapshot(&self, symbol: &str) -> Result<QuoteSnapshot, ProviderError> {
        let snapshot_url = format!(
            "{}/v2/snapshot/locale/us/markets/stocks/tickers/{}",
            BASE_URL, symbol
        );
        let prev_url = format!("{}/v2/aggs/ticker/{}/prev", BASE_URL, symbol);

        let (snapshot, prev) = tokio::try_join!(
            self.get_json::<SnapshotResponse>(&snapshot_url, &[], symbol),
            self.get_json::<PrevCloseResponse>(&prev_url, &[], symbol),
        )?;

        compose_snapshot(symbol, snapshot.ticker, prev.results.into_iter().next())
    }
}

#[async_trait]
impl NewsProvider for PolygonClient {
    async fn news(&self, symbols: &[String]) -> Result<Vec<NewsItem>, ProviderError> {
        let url = format!("{}/v2/reference/news", BASE_URL);
        let tickers = symbols.join(",");

        let mut query: Vec<(&str, &str)> = vec![
            ("limit", "50"),
            ("order", "desc"),
            ("sort", "published_utc"),
        ];
        if !tickers.is_empty() {
            query.push(("ticker", &tickers));
        }

        let scope = symbols.first().map(String::as_str).unwrap_or("*");
        let response: NewsResponse = self.get_json(&url, &query, scope).await?;

        Ok(response
            .results
            .into_iter()
            .map(|article| news_item_from(article, symbols))
            .collect())
    }
}

#[async_trait]
impl DailyBarsProvider for PolygonClient {
    async fn daily_bars(&self, symbol: &str) -> Result<Vec<DailyBar>, ProviderError> {
        let to = Utc::now().date_naive();
        let from = to - ChronoDuration::days(DAILY_BARS_LOOKBACK_DAYS);
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            BASE_URL, symbol, from, to
        );

        let response: AggregateResponse = self
            .get_json(
                &url,
                &[("adjusted", "true"), ("sort", "asc"), ("limit", "100")],
                symbol,
            )
            .await?;

        Ok(response
            .results
            .into_iter()
            .filter_map(|bar| {
                let date = DateTime::from_timestamp_millis(bar.t)?.date_naive();
                Some(DailyBar {
                    date,
                    open: bar.o,
                    high: bar.h,
                    low: bar.l,
                    close: bar.c,
                    volume: bar.v,
                })
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for PolygonClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, ProviderError> {
        let url = format!("{}/v3/reference/tickers", BASE_URL);

        let response: TickerSearchResponse = self
            .get_json(
                &url,
                &[
                    ("search", query),
                    ("active", "true"),
                    ("sort", "ticker"),
                    ("order", "asc"),
                    ("limit", "20"),
                ],
                query,
            )
            .await?;

        Ok(response
            .results
            .into_iter()
            .map(|entry| SearchMatch {
                symbol: entry.ticker,
                name: entry.name,
                instrument_type: entry.market,
                region: entry.locale,
                // The reference endpoint carries neither; US-listed scope
                // makes these constants.
                currency: Some("USD".to_string()),
                match_score: Some(1.0),
            })
            .collect())
    }
}
