//! Curated fixture tables. Values mirror a frozen snapshot of real market
//! data so demo sessions look plausible; they are not kept current.

use chrono::{DateTime, TimeZone, Utc};
use market_core::{
    CompanyOverview, DataSource, NewsItem, QuoteSnapshot, SearchMatch, TickerSentiment,
};

fn overview(symbol: &str) -> CompanyOverview {
    CompanyOverview {
        symbol: symbol.to_string(),
        name: None,
        description: None,
        exchange: Some("NASDAQ".to_string()),
        industry: None,
        sector: None,
        market_cap: None,
        pe_ratio: None,
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
        source: DataSource::MockData,
    }
}

/// Full fundamentals for the curated large caps.
pub fn company_fixture(symbol: &str) -> Option<CompanyOverview> {
    match symbol {
        "AAPL" => Some(CompanyOverview {
            name: Some("Apple Inc.".to_string()),
            description: Some(
                "Apple Inc. designs, manufactures, and markets smartphones, personal \
                 computers, tablets, wearables, and accessories worldwide."
                    .to_string(),
            ),
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
            ..overview("AAPL")
        }),
        "MSFT" => Some(CompanyOverview {
            name: Some("Microsoft Corporation".to_string()),
            description: Some(
                "Microsoft Corporation develops, licenses, and supports software, \
                 services, devices, and solutions worldwide."
                    .to_string(),
            ),
            industry: Some("Software—Infrastructure".to_string()),
            sector: Some("Technology".to_string()),
            market_cap: Some(3_089_000_000_000.0),
            pe_ratio: Some(37.2),
            peg_ratio: Some(2.1),
            price_to_book: Some(15.6),
            price_to_sales: Some(12.8),
            return_on_equity: Some(42.5),
            return_on_assets: Some(21.6),
            operating_margin: Some(41.8),
            quick_ratio: Some(1.8),
            eps: Some(11.18),
            revenue_ttm: Some(236_103_000_000.0),
            gross_profit_ttm: Some(143_582_000_000.0),
            profit_margin: Some(35.3),
            revenue_growth: Some(15.6),
            debt_to_equity: Some(38.6),
            cash: Some(93_546_000_000.0),
            ..overview("MSFT")
        }),
        "GOOGL" => Some(CompanyOverview {
            name: Some("Alphabet Inc.".to_string()),
            description: Some(
                "Alphabet Inc. offers various products and platforms worldwide and \
                 operates through Google Services, Google Cloud, and Other Bets."
                    .to_string(),
            ),
            industry: Some("Internet Content & Information".to_string()),
            sector: Some("Technology".to_string()),
            market_cap: Some(1_870_000_000_000.0),
            pe_ratio: Some(28.5),
            peg_ratio: Some(1.7),
            price_to_book: Some(6.2),
            price_to_sales: Some(5.9),
            return_on_equity: Some(25.3),
            return_on_assets: Some(17.8),
            operating_margin: Some(28.9),
            quick_ratio: Some(2.4),
            eps: Some(5.24),
            revenue_ttm: Some(307_394_000_000.0),
            gross_profit_ttm: Some(156_562_000_000.0),
            profit_margin: Some(23.5),
            revenue_growth: Some(13.9),
            debt_to_equity: Some(11.8),
            cash: Some(117_884_000_000.0),
            ..overview("GOOGL")
        }),
        _ => None,
    }
}

fn quote(
    symbol: &str,
    open: f64,
    high: f64,
    low: f64,
    price: f64,
    volume: f64,
    previous_close: f64,
) -> QuoteSnapshot {
    QuoteSnapshot {
        symbol: symbol.to_string(),
        open: Some(open),
        high: Some(high),
        low: Some(low),
        price: Some(price),
        volume: Some(volume),
        previous_close: Some(previous_close),
        trading_day: Some(Utc::now().date_naive()),
    }
}

/// Major index ETFs.
pub fn index_quote(symbol: &str) -> Option<QuoteSnapshot> {
    match symbol {
        "SPY" => Some(quote("SPY", 518.20, 521.30, 516.90, 520.45, 45_789_230.0, 517.70)),
        "QQQ" => Some(quote("QQQ", 436.20, 440.12, 435.10, 438.78, 32_567_890.0, 435.57)),
        "DIA" => Some(quote("DIA", 391.75, 393.05, 389.50, 390.25, 18_934_520.0, 392.10)),
        "IWM" => Some(quote("IWM", 214.60, 216.40, 213.85, 215.30, 26_745_300.0, 214.25)),
        _ => None,
    }
}

/// Popular single names.
pub fn stock_quote(symbol: &str) -> Option<QuoteSnapshot> {
    match symbol {
        "AAPL" => Some(quote("AAPL", 188.32, 190.21, 187.95, 189.50, 57_892_450.0, 187.16)),
        "MSFT" => Some(quote("MSFT", 413.20, 417.30, 412.45, 415.75, 39_287_640.0, 411.95)),
        "GOOGL" => Some(quote("GOOGL", 148.50, 150.20, 147.85, 149.32, 27_358_920.0, 148.09)),
        _ => None,
    }
}

/// The quote every fallback bottoms out on.
pub fn benchmark_quote() -> QuoteSnapshot {
    quote("SPY", 518.20, 521.30, 516.90, 520.45, 45_789_230.0, 517.70)
}

fn published(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, hour, 0, 0).unwrap()
}

fn sentiment(ticker: &str, score: f64, label: &str) -> TickerSentiment {
    TickerSentiment {
        ticker: ticker.to_string(),
        relevance: 0.9,
        sentiment_score: score,
        sentiment_label: label.to_string(),
    }
}

fn positive(ticker: &str) -> TickerSentiment {
    sentiment(ticker, 0.5, "Positive")
}

pub fn news_fixtures() -> Vec<NewsItem> {
    vec![
        NewsItem {
            title: "Apple Announces New Product Line".to_string(),
            summary: Some(
                "Apple Inc. announced its latest product line today, including \
                 next-generation iPhones and updates to its MacBook series."
                    .to_string(),
            ),
            url: "https://example.com/apple-news".to_string(),
            source_name: Some("Tech News".to_string()),
            published_at: published(13),
            tickers: vec![positive("AAPL")],
        },
        NewsItem {
            title: "Microsoft Reports Record Quarterly Earnings".to_string(),
            summary: Some(
                "Microsoft Corporation reported record quarterly earnings, exceeding \
                 analyst expectations by 15%, driven by cloud services growth."
                    .to_string(),
            ),
            url: "https://example.com/microsoft-earnings".to_string(),
            source_name: Some("Financial Times".to_string()),
            published_at: published(12),
            tickers: vec![positive("MSFT")],
        },
        NewsItem {
            title: "Market Indices Reach All-Time Highs".to_string(),
            summary: Some(
                "Major market indices including the S&P 500 and NASDAQ reached \
                 all-time highs today, with technology stocks leading the gains."
                    .to_string(),
            ),
            url: "https://example.com/market-highs".to_string(),
            source_name: Some("Market Watch".to_string()),
            published_at: published(11),
            tickers: vec![
                positive("SPY"),
                positive("QQQ"),
                positive("AAPL"),
                positive("MSFT"),
                positive("GOOGL"),
            ],
        },
        NewsItem {
            title: "Federal Reserve Signals Potential Rate Cut".to_string(),
            summary: Some(
                "The Federal Reserve signaled a potential interest rate cut in the \
                 coming months, citing improving inflation data."
                    .to_string(),
            ),
            url: "https://example.com/fed-rate-cut".to_string(),
            source_name: Some("Economic News".to_string()),
            published_at: published(10),
            tickers: vec![positive("SPY"), positive("QQQ"), positive("DIA")],
        },
        NewsItem {
            title: "Google's AI Advancements Raise Competitive Concerns".to_string(),
            summary: Some(
                "Alphabet Inc.'s latest AI developments have raised competitive \
                 concerns among industry experts."
                    .to_string(),
            ),
            url: "https://example.com/google-ai".to_string(),
            source_name: Some("Tech Insights".to_string()),
            published_at: published(9),
            tickers: vec![sentiment("GOOGL", 0.0, "Neutral")],
        },
    ]
}

fn search_match(symbol: &str, name: &str) -> SearchMatch {
    SearchMatch {
        symbol: symbol.to_string(),
        name: Some(name.to_string()),
        instrument_type: Some("Common Stock".to_string()),
        region: Some("United States".to_string()),
        currency: Some("USD".to_string()),
        match_score: None,
    }
}

/// Canned search sets, keyed by the query fragments they answer. Order
/// matters: the first set doubles as the documented miss fallback.
pub fn search_fixtures() -> Vec<(&'static str, Vec<SearchMatch>)> {
    vec![
        (
            "app",
            vec![
                search_match("AAPL", "Apple Inc."),
                search_match("APP", "AppLovin Corporation"),
                search_match("APPS", "Digital Turbine, Inc."),
            ],
        ),
        (
            "micro",
            vec![
                search_match("MSFT", "Microsoft Corporation"),
                search_match("MCHP", "Microchip Technology Inc."),
                search_match("MU", "Micron Technology, Inc."),
            ],
        ),
        (
            "goog",
            vec![
                search_match("GOOGL", "Alphabet Inc. Class A"),
                search_match("GOOG", "Alphabet Inc. Class C"),
            ],
        ),
    ]
}
