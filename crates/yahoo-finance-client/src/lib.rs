use async_trait::async_trait;
use market_core::{CompanyOverview, DataSource, OverviewProvider, ProviderError, ProviderInfo};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v10/finance";

/// Modules fetched for the company profile half of an overview.
const PROFILE_MODULES: &str = "assetProfile,price,summaryDetail,defaultKeyStatistics";
/// Modules fetched for the financial-statement half.
const FINANCIAL_MODULES: &str = "financialData";

/// Yahoo Finance adapter. Only implements the company-overview operation;
/// the quoteSummary API is the one surface that needs no API key.
#[derive(Clone, Default)]
pub struct YahooFinanceClient {
    client: Client,
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    async fn fetch_modules(
        &self,
        symbol: &str,
        modules: &str,
    ) -> Result<QuoteSummaryResult, ProviderError> {
        let url = format!("{}/quoteSummary/{}", BASE_URL, symbol);
        tracing::debug!("Yahoo Finance quoteSummary for {} ({})", symbol, modules);
        let response = self
            .client
            .get(&url)
            .query(&[("modules", modules)])
            .send()
            .await
            .map_err(|e| ProviderError::TransportError(e.to_string()))?;

        match response.status().as_u16() {
            429 => {
                return Err(ProviderError::RateLimited(format!(
                    "quoteSummary {} throttled",
                    modules
                )))
            }
            404 => return Err(ProviderError::InvalidSymbol(symbol.to_string())),
            status if !response.status().is_success() => {
                return Err(ProviderError::TransportError(format!("HTTP {}", status)))
            }
            _ => {}
        }

        let envelope: QuoteSummaryEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        envelope
            .quote_summary
            .result
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidSymbol(symbol.to_string()))
    }
}

impl ProviderInfo for YahooFinanceClient {
    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }
}

// ---------------------------------------------------------------------------
// Wire shapes: quoteSummary wraps every numeric in a {raw, fmt} object and
// omits whole modules freely, so everything below is optional.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Vec<QuoteSummaryResult>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSummaryResult {
    #[serde(rename = "assetProfile", default)]
    asset_profile: Option<AssetProfile>,
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(rename = "summaryDetail", default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(rename = "defaultKeyStatistics", default)]
    key_statistics: Option<KeyStatistics>,
    #[serde(rename = "financialData", default)]
    financial_data: Option<FinancialData>,
}

#[derive(Debug, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref()?.raw.filter(|v| v.is_finite())
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    #[serde(rename = "longBusinessSummary", default)]
    long_business_summary: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    sector: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceModule {
    #[serde(rename = "shortName", default)]
    short_name: Option<String>,
    #[serde(rename = "exchangeName", default)]
    exchange_name: Option<String>,
    #[serde(rename = "marketCap", default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetail {
    #[serde(rename = "forwardPE", default)]
    forward_pe: Option<RawValue>,
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "priceToSalesTrailing12Months", default)]
    price_to_sales: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyStatistics {
    #[serde(rename = "pegRatio", default)]
    peg_ratio: Option<RawValue>,
    #[serde(rename = "priceToBook", default)]
    price_to_book: Option<RawValue>,
    #[serde(rename = "returnOnAssets", default)]
    return_on_assets: Option<RawValue>,
    #[serde(rename = "trailingEps", default)]
    trailing_eps: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct FinancialData {
    #[serde(rename = "returnOnEquity", default)]
    return_on_equity: Option<RawValue>,
    #[serde(rename = "operatingMargins", default)]
    operating_margins: Option<RawValue>,
    #[serde(rename = "profitMargins", default)]
    profit_margins: Option<RawValue>,
    #[serde(rename = "quickRatio", default)]
    quick_ratio: Option<RawValue>,
    #[serde(rename = "totalRevenue", default)]
    total_revenue: Option<RawValue>,
    #[serde(rename = "grossProfits", default)]
    gross_profits: Option<RawValue>,
    #[serde(rename = "revenueGrowth", default)]
    revenue_growth: Option<RawValue>,
    #[serde(rename = "debtToEquity", default)]
    debt_to_equity: Option<RawValue>,
    #[serde(rename = "totalCash", default)]
    total_cash: Option<RawValue>,
}

fn compose_overview(
    symbol: &str,
    profile: QuoteSummaryResult,
    statements: QuoteSummaryResult,
) -> CompanyOverview {
    let asset_profile = profile.asset_profile.unwrap_or_default();
    let price = profile.price.unwrap_or_default();
    let summary = profile.summary_detail.unwrap_or_default();
    let statistics = profile.key_statistics.unwrap_or_default();
    let financial = statements.financial_data.unwrap_or_default();

    // P/E precedence: forward estimate first, trailing as the fallback.
    let pe_ratio = raw(&summary.forward_pe).or_else(|| raw(&summary.trailing_pe));

    CompanyOverview {
        symbol: symbol.to_string(),
        name: price.short_name,
        description: asset_profile.long_business_summary,
        exchange: price.exchange_name,
        industry: asset_profile.industry,
        sector: asset_profile.sector,
        market_cap: raw(&price.market_cap),
        pe_ratio,
        peg_ratio: raw(&statistics.peg_ratio),
        price_to_book: raw(&statistics.price_to_book),
        price_to_sales: raw(&summary.price_to_sales),
        // Yahoo reports margins and returns as fractions; canonical records
        // carry percentages.
        return_on_equity: raw(&financial.return_on_equity).map(|v| v * 100.0),
        return_on_assets: raw(&statistics.return_on_assets).map(|v| v * 100.0),
        operating_margin: raw(&financial.operating_margins).map(|v| v * 100.0),
        quick_ratio: raw(&financial.quick_ratio),
        eps: raw(&statistics.trailing_eps),
        revenue_ttm: raw(&financial.total_revenue),
        gross_profit_ttm: raw(&financial.gross_profits),
        profit_margin: raw(&financial.profit_margins).map(|v| v * 100.0),
        revenue_growth: raw(&financial.revenue_growth).map(|v| v * 100.0),
        debt_to_equity: raw(&financial.debt_to_equity),
        cash: raw(&financial.total_cash),
        source: DataSource::YahooFinance,
    }
}

#[async_trait]
impl OverviewProvider for YahooFinanceClient {
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, ProviderError> {
        // Both halves must land before composing; a failure in either fails
        // the whole invocation rather than producing a partial record.
        let (profile, statements) = tokio::try_join!(
            self.fetch_modules(symbol, PROFILE_MODULES),
            self.fetch_modules(symbol, FINANCIAL_MODULES),
        )?;

        Ok(compose_overview(symbol, profile, statements))
    }
}
