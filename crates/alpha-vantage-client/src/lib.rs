use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use market_core::{
    CompanyOverview, DailyBar, DailyBarsProvider, DataSource, NewsItem, NewsProvider,
    OverviewProvider, ProviderError, ProviderInfo, QuoteProvider, QuoteSnapshot, SearchMatch,
    SearchProvider, TickerSentiment,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage's published demo key. Real deployments set
/// ALPHA_VANTAGE_API_KEY; the demo key only answers a handful of symbols.
const FALLBACK_API_KEY: &str = "demo";

const NEWS_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    client: Client,
}

impl AlphaVantageClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { api_key, client }
    }

    pub fn from_env() -> Self {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY")
            .unwrap_or_else(|_| FALLBACK_API_KEY.to_string());
        Self::new(api_key)
    }

    /// Issue one query-function request and classify the envelope before
    /// handing the body to a typed decoder.
    async fn get_json(&self, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
        tracing::debug!("Alpha Vantage request: {:?}", params.first());
        let response = self
            .client
            .get(BASE_URL)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::TransportError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::TransportError(format!("HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        classify_envelope(&body)?;
        Ok(body)
    }
}

impl ProviderInfo for AlphaVantageClient {
    fn source(&self) -> DataSource {
        DataSource::AlphaVantage
    }
}

/// Alpha Vantage reports failures inside a 200 JSON envelope rather than
/// through HTTP status codes: a `Note` when the per-minute call frequency
/// is exceeded, an `Information` blurb when the daily cap is hit, and an
/// `Error Message` for unknown symbols or malformed calls.
fn classify_envelope(body: &Value) -> Result<(), ProviderError> {
    if let Some(note) = body.get("Note").and_then(Value::as_str) {
        if note.contains("call frequency") || note.to_lowercase().contains("rate limit") {
            return Err(ProviderError::RateLimited(note.to_string()));
        }
        return Err(ProviderError::MalformedResponse(note.to_string()));
    }

    if let Some(info) = body.get("Information").and_then(Value::as_str) {
        // The free tier reports daily-cap exhaustion and API-key problems here.
        return Err(ProviderError::RateLimited(info.to_string()));
    }

    if let Some(message) = body.get("Error Message").and_then(Value::as_str) {
        return Err(ProviderError::InvalidSymbol(message.to_string()));
    }

    if body.as_object().map_or(true, |map| map.is_empty()) {
        return Err(ProviderError::MalformedResponse(
            "empty response body".to_string(),
        ));
    }

    Ok(())
}

/// Every numeric field in an Alpha Vantage payload arrives as a string;
/// absent metrics arrive as "None" or "-". Anything that does not parse to
/// a finite number becomes the unavailable marker.
fn parse_metric(value: &Option<String>) -> Option<f64> {
    let raw = value.as_deref()?.trim();
    if raw.is_empty() || raw == "None" || raw == "-" || raw == "N/A" {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_day(value: &Option<String>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.as_deref()?.trim(), "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct OverviewPayload {
    #[serde(rename = "Symbol", default)]
    symbol: Option<String>,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
    #[serde(rename = "Exchange", default)]
    exchange: Option<String>,
    #[serde(rename = "Industry", default)]
    industry: Option<String>,
    #[serde(rename = "Sector", default)]
    sector: Option<String>,
    #[serde(rename = "MarketCapitalization", default)]
    market_capitalization: Option<String>,
    #[serde(rename = "PERatio", default)]
    pe_ratio: Option<String>,
    #[serde(rename = "PEGRatio", default)]
    peg_ratio: Option<String>,
    #[serde(rename = "PriceToBookRatio", default)]
    price_to_book_ratio: Option<String>,
    #[serde(rename = "PriceToSalesRatioTTM", default)]
    price_to_sales_ratio: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM", default)]
    return_on_equity: Option<String>,
    #[serde(rename = "ReturnOnAssetsTTM", default)]
    return_on_assets: Option<String>,
    #[serde(rename = "OperatingMarginTTM", default)]
    operating_margin: Option<String>,
    #[serde(rename = "QuickRatio", default)]
    quick_ratio: Option<String>,
    #[serde(rename = "EPS", default)]
    eps: Option<String>,
    #[serde(rename = "RevenueTTM", default)]
    revenue_ttm: Option<String>,
    #[serde(rename = "GrossProfitTTM", default)]
    gross_profit_ttm: Option<String>,
    #[serde(rename = "ProfitMargin", default)]
    profit_margin: Option<String>,
    #[serde(rename = "RevenueGrowth", default)]
    revenue_growth: Option<String>,
    #[serde(rename = "QuarterlyRevenueGrowthYOY", default)]
    quarterly_revenue_growth: Option<String>,
    #[serde(rename = "DebtToEquity", default)]
    debt_to_equity: Option<String>,
    #[serde(rename = "Cash", default)]
    cash: Option<String>,
}

impl OverviewPayload {
    fn into_overview(self, requested: &str) -> CompanyOverview {
        // Growth precedence: the flat RevenueGrowth field when present,
        // else the quarterly YoY figure (already a percentage as a
        // fraction string, e.g. "0.078").
        let revenue_growth = parse_metric(&self.revenue_growth).or_else(|| {
            parse_metric(&self.quarterly_revenue_growth).map(|fraction| fraction * 100.0)
        });

        CompanyOverview {
            symbol: self.symbol.unwrap_or_else(|| requested.to_string()),
            name: self.name,
            description: self.description,
            exchange: self.exchange,
            industry: self.industry,
            sector: self.sector,
            market_cap: parse_metric(&self.market_capitalization),
            pe_ratio: parse_metric(&self.pe_ratio),
            peg_ratio: parse_metric(&self.peg_ratio),
            price_to_book: parse_metric(&self.price_to_book_ratio),
            price_to_sales: parse_metric(&self.price_to_sales_ratio),
            return_on_equity: parse_metric(&self.return_on_equity),
            return_on_assets: parse_metric(&self.return_on_assets),
            operating_margin: parse_metric(&self.operating_margin),
            quick_ratio: parse_metric(&self.quick_ratio),
            eps: parse_metric(&self.eps),
            revenue_ttm: parse_metric(&self.revenue_ttm),
            gross_profit_ttm: parse_metric(&self.gross_profit_ttm),
            profit_margin: parse_metric(&self.profit_margin),
            revenue_growth,
            debt_to_equity: parse_metric(&self.debt_to_equity),
            cash: parse_metric(&self.cash),
            source: DataSource::AlphaVantage,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteEnvelope {
    #[serde(rename = "Global Quote", default)]
    quote: Option<GlobalQuotePayload>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuotePayload {
    #[serde(rename = "01. symbol", default)]
    symbol: Option<String>,
    #[serde(rename = "02. open", default)]
    open: Option<String>,
    #[serde(rename = "03. high", default)]
    high: Option<String>,
    #[serde(rename = "04. low", default)]
    low: Option<String>,
    #[serde(rename = "05. price", default)]
    price: Option<String>,
    #[serde(rename = "06. volume", default)]
    volume: Option<String>,
    #[serde(rename = "07. latest trading day", default)]
    latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close", default)]
    previous_close: Option<String>,
}

impl GlobalQuotePayload {
    fn into_snapshot(self, requested: &str) -> QuoteSnapshot {
        QuoteSnapshot {
            symbol: self.symbol.unwrap_or_else(|| requested.to_string()),
            open: parse_metric(&self.open),
            high: parse_metric(&self.high),
            low: parse_metric(&self.low),
            price: parse_metric(&self.price),
            volume: parse_metric(&self.volume),
            previous_close: parse_metric(&self.previous_close),
            trading_day: parse_day(&self.latest_trading_day),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsEnvelope {
    #[serde(default)]
    feed: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    title: String,
    url: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    time_published: Option<String>,
    #[serde(default)]
    ticker_sentiment: Vec<TickerSentimentEntry>,
}

#[derive(Debug, Deserialize)]
struct TickerSentimentEntry {
    ticker: String,
    #[serde(default)]
    relevance_score: Option<String>,
    #[serde(default)]
    ticker_sentiment_score: Option<String>,
    #[serde(default)]
    ticker_sentiment_label: Option<String>,
}

/// Feed timestamps look like `20240315T143000`.
fn parse_feed_timestamp(value: &Option<String>) -> DateTime<Utc> {
    value
        .as_deref()
        .and_then(|raw| NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S").ok())
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

impl FeedEntry {
    fn into_item(self) -> NewsItem {
        let published_at = parse_feed_timestamp(&self.time_published);
        let tickers = self
            .ticker_sentiment
            .into_iter()
            .map(|entry| TickerSentiment {
                ticker: entry.ticker,
                relevance: parse_metric(&entry.relevance_score).unwrap_or(0.0),
                sentiment_score: parse_metric(&entry.ticker_sentiment_score)
                    .unwrap_or(0.0)
                    .clamp(-1.0, 1.0),
                sentiment_label: entry
                    .ticker_sentiment_label
                    .unwrap_or_else(|| "Neutral".to_string()),
            })
            .collect();

        NewsItem {
            title: self.title,
            summary: self.summary,
            url: self.url,
            source_name: self.source,
            published_at,
            tickers,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    #[serde(rename = "1. symbol", default)]
    symbol: Option<String>,
    #[serde(rename = "2. name", default)]
    name: Option<String>,
    #[serde(rename = "3. type", default)]
    instrument_type: Option<String>,
    #[serde(rename = "4. region", default)]
    region: Option<String>,
    #[serde(rename = "8. currency", default)]
    currency: Option<String>,
    #[serde(rename = "9. matchScore", default)]
    match_score: Option<String>,
}

impl SearchEntry {
    fn into_match(self) -> Option<SearchMatch> {
        Some(SearchMatch {
            symbol: self.symbol?,
            name: self.name,
            instrument_type: self.instrument_type,
            region: self.region,
            currency: self.currency,
            match_score: parse_metric(&self.match_score),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DailySeriesEnvelope {
    // BTreeMap keeps the YYYY-MM-DD keys sorted, so iteration is oldest-first.
    #[serde(rename = "Time Series (Daily)", default)]
    series: BTreeMap<String, DailyEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct DailyEntry {
    #[serde(rename = "1. open", default)]
    open: Option<String>,
    #[serde(rename = "2. high", default)]
    high: Option<String>,
    #[serde(rename = "3. low", default)]
    low: Option<String>,
    #[serde(rename = "4. close", default)]
    close: Option<String>,
    #[serde(rename = "5. volume", default)]
    volume: Option<String>,
}

// ---------------------------------------------------------------------------
// Trait implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl OverviewProvider for AlphaVantageClient {
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, ProviderError> {
        let body = self
            .get_json(&[("function", "OVERVIEW"), ("symbol", symbol)])
            .await?;

        let payload: OverviewPayload = serde_json::from_value(body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        if payload.symbol.is_none() && payload.name.is_none() {
            // OVERVIEW answers unknown symbols with an empty object.
            return Err(ProviderError::InvalidSymbol(symbol.to_string()));
        }

        Ok(payload.into_overview(symbol))
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    async fn quote_snapshot(&self, symbol: &str) -> Result<QuoteSnapshot, ProviderError> {
        let body = self
            .get_json(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;

        let envelope: GlobalQuoteEnvelope = serde_json::from_value(body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let payload = envelope
            .quote
            .filter(|q| q.symbol.is_some() || q.price.is_some())
            .ok_or_else(|| ProviderError::InvalidSymbol(symbol.to_string()))?;

        Ok(payload.into_snapshot(symbol))
    }
}

#[async_trait]
impl NewsProvider for AlphaVantageClient {
    async fn news(&self, symbols: &[String]) -> Result<Vec<NewsItem>, ProviderError> {
        let tickers = symbols.join(",");
        let limit = NEWS_LIMIT.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("function", "NEWS_SENTIMENT"),
            ("limit", &limit),
            ("sort", "LATEST"),
        ];
        if !tickers.is_empty() {
            params.push(("tickers", &tickers));
        }

        let body = self.get_json(&params).await?;
        let envelope: NewsEnvelope = serde_json::from_value(body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(envelope
            .feed
            .into_iter()
            .map(FeedEntry::into_item)
            .collect())
    }
}

#[async_trait]
impl DailyBarsProvider for AlphaVantageClient {
    async fn daily_bars(&self, symbol: &str) -> Result<Vec<DailyBar>, ProviderError> {
        let body = self
            .get_json(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "compact"),
            ])
            .await?;

        let envelope: DailySeriesEnvelope = serde_json::from_value(body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        if envelope.series.is_empty() {
            return Err(ProviderError::InvalidSymbol(symbol.to_string()));
        }

        let bars = envelope
            .series
            .into_iter()
            .filter_map(|(day, entry)| {
                let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d").ok()?;
                Some(DailyBar {
                    date,
                    open: parse_metric(&entry.open),
                    high: parse_metric(&entry.high),
                    low: parse_metric(&entry.low),
                    close: parse_metric(&entry.close),
                    volume: parse_metric(&entry.volume),
                })
            })
            .collect();

        Ok(bars)
    }
}

#[async_trait]
impl SearchProvider for AlphaVantageClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, ProviderError> {
        let body = self
            .get_json(&[("function", "SYMBOL_SEARCH"), ("keywords", query)])
            .await?;

        let envelope: SearchEnvelope = serde_json::from_value(body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(envelope
            .best_matches
            .into_iter()
            .filter_map(SearchEntry::into_match)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_rate_limit_note() {
        let body = json!({
            "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 25 requests per day."
        });
        assert!(matches!(
            classify_envelope(&body),
            Err(ProviderError::RateLimited(_))
        ));
    }

    #[test]
    fn classify_information_as_rate_limit() {
        let body = json!({
            "Information": "Please consider a premium API key for a higher rate limit."
        });
        assert!(matches!(
            classify_envelope(&body),
            Err(ProviderError::RateLimited(_))
        ));
    }

    #[test]
    fn classify_error_message_as_invalid_symbol() {
        let body = json!({
            "Error Message": "Invalid API call. Please retry or visit the documentation."
        });
        assert!(matches!(
            classify_envelope(&body),
            Err(ProviderError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn classify_empty_body_as_malformed() {
        assert!(matches!(
            classify_envelope(&json!({})),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn classify_ordinary_payload_passes() {
        let body = json!({ "Symbol": "AAPL", "Name": "Apple Inc." });
        assert!(classify_envelope(&body).is_ok());
    }

    #[test]
    fn parse_metric_handles_provider_placeholders() {
        assert_eq!(parse_metric(&Some("32.6".to_string())), Some(32.6));
        assert_eq!(parse_metric(&Some("None".to_string())), None);
        assert_eq!(parse_metric(&Some("-".to_string())), None);
        assert_eq!(parse_metric(&Some("".to_string())), None);
        assert_eq!(parse_metric(&Some("NaN".to_string())), None);
        assert_eq!(parse_metric(&None), None);
    }

    #[test]
    fn overview_payload_maps_every_field() {
        let payload: OverviewPayload = serde_json::from_value(json!({
            "Symbol": "AAPL",
            "Name": "Apple Inc.",
            "Sector": "Technology",
            "Industry": "Consumer Electronics",
            "Exchange": "NASDAQ",
            "MarketCapitalization": "2950000000000",
            "PERatio": "32.6",
            "PEGRatio": "2.5",
            "PriceToBookRatio": "36.8",
            "EPS": "5.81",
            "RevenueTTM": "394328000000",
            "QuarterlyRevenueGrowthYOY": "0.078",
            "QuickRatio": "None"
        }))
        .unwrap();

        let overview = payload.into_overview("AAPL");
        assert_eq!(overview.symbol, "AAPL");
        assert_eq!(overview.sector.as_deref(), Some("Technology"));
        assert_eq!(overview.market_cap, Some(2_950_000_000_000.0));
        assert_eq!(overview.pe_ratio, Some(32.6));
        // Quarterly YoY fraction is promoted to a percentage.
        assert!((overview.revenue_growth.unwrap() - 7.8).abs() < 1e-9);
        assert_eq!(overview.quick_ratio, None);
        assert_eq!(overview.debt_to_equity, None);
        assert_eq!(overview.source, DataSource::AlphaVantage);
    }

    #[test]
    fn global_quote_maps_positional_keys() {
        let envelope: GlobalQuoteEnvelope = serde_json::from_value(json!({
            "Global Quote": {
                "01. symbol": "SPY",
                "02. open": "518.20",
                "03. high": "521.30",
                "04. low": "516.90",
                "05. price": "520.45",
                "06. volume": "45789230",
                "07. latest trading day": "2024-03-15",
                "08. previous close": "517.70",
                "09. change": "2.75",
                "10. change percent": "0.53%"
            }
        }))
        .unwrap();

        let snapshot = envelope.quote.unwrap().into_snapshot("SPY");
        assert_eq!(snapshot.symbol, "SPY");
        assert_eq!(snapshot.price, Some(520.45));
        assert_eq!(snapshot.previous_close, Some(517.70));
        assert_eq!(snapshot.volume, Some(45_789_230.0));
        assert_eq!(
            snapshot.trading_day,
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn news_feed_parses_sentiment_tuples() {
        let envelope: NewsEnvelope = serde_json::from_value(json!({
            "feed": [{
                "title": "Apple Announces New Product Line",
                "url": "https://example.com/apple-news",
                "summary": "Apple Inc. announced its latest product line today.",
                "source": "Tech News",
                "time_published": "20240315T143000",
                "ticker_sentiment": [{
                    "ticker": "AAPL",
                    "relevance_score": "0.9",
                    "ticker_sentiment_score": "0.35",
                    "ticker_sentiment_label": "Bullish"
                }]
            }]
        }))
        .unwrap();

        let items: Vec<NewsItem> = envelope.feed.into_iter().map(FeedEntry::into_item).collect();
        assert_eq!(items.len(), 1);
        let tuple = &items[0].tickers[0];
        assert_eq!(tuple.ticker, "AAPL");
        assert_eq!(tuple.relevance, 0.9);
        assert_eq!(tuple.sentiment_score, 0.35);
        assert_eq!(tuple.sentiment_label, "Bullish");
        assert_eq!(
            items[0].published_at.date_naive(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn search_matches_map_positional_keys() {
        let envelope: SearchEnvelope = serde_json::from_value(json!({
            "bestMatches": [{
                "1. symbol": "AAPL",
                "2. name": "Apple Inc.",
                "3. type": "Equity",
                "4. region": "United States",
                "8. currency": "USD",
                "9. matchScore": "1.0000"
            }]
        }))
        .unwrap();

        let matches: Vec<SearchMatch> = envelope
            .best_matches
            .into_iter()
            .filter_map(SearchEntry::into_match)
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].symbol, "AAPL");
        assert_eq!(matches[0].match_score, Some(1.0));
    }

    #[test]
    fn daily_series_is_oldest_first() {
        let envelope: DailySeriesEnvelope = serde_json::from_value(json!({
            "Time Series (Daily)": {
                "2024-03-15": { "1. open": "188.32", "4. close": "189.50", "5. volume": "57892450" },
                "2024-03-14": { "1. open": "186.10", "4. close": "187.16", "5. volume": "51234000" }
            }
        }))
        .unwrap();

        let dates: Vec<String> = envelope.series.keys().cloned().collect();
        assert_eq!(dates, vec!["2024-03-14", "2024-03-15"]);
    }
}
