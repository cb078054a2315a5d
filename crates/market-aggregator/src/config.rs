use mock_provider::SearchMissPolicy;

/// Per-operation switches for synthetic substitution, so real and mock data
/// can be mixed while developing against capped API keys.
#[derive(Debug, Clone, Copy)]
pub struct MockToggles {
    pub overview: bool,
    pub quote: bool,
    pub news: bool,
    pub daily_bars: bool,
    pub search: bool,
}

impl Default for MockToggles {
    fn default() -> Self {
        Self {
            overview: true,
            quote: true,
            news: true,
            daily_bars: true,
            search: true,
        }
    }
}

/// Aggregator configuration. Passed explicitly at construction; the
/// orchestrator never reads ambient process state, which keeps fallback
/// behavior testable without environment mutation.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Global offline/demo switch. When on (and the operation's toggle is
    /// on) requests are served synthetically without touching the network.
    pub use_mock_data: bool,
    pub mock_toggles: MockToggles,
    /// Symbol used when a market-status request names none, and the
    /// documented fallback fixture for unknown symbols in mock mode.
    pub benchmark_symbol: String,
    /// News sentiment tuples below this relevance are dropped before an
    /// item is considered to be about a ticker.
    pub min_news_relevance: f64,
    pub search_miss: SearchMissPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            use_mock_data: true,
            mock_toggles: MockToggles::default(),
            benchmark_symbol: "SPY".to_string(),
            min_news_relevance: 0.1,
            search_miss: SearchMissPolicy::FirstCanned,
        }
    }
}

impl AggregatorConfig {
    /// Read configuration once from the environment (and `.env` in
    /// development). Convenience for binary callers; tests build the
    /// struct directly.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            use_mock_data: env_flag("USE_MOCK_DATA", defaults.use_mock_data),
            mock_toggles: MockToggles {
                overview: env_flag("MOCK_OVERVIEW", true),
                quote: env_flag("MOCK_QUOTE", true),
                news: env_flag("MOCK_NEWS", true),
                daily_bars: env_flag("MOCK_DAILY_BARS", true),
                search: env_flag("MOCK_SEARCH", true),
            },
            benchmark_symbol: std::env::var("BENCHMARK_SYMBOL")
                .unwrap_or(defaults.benchmark_symbol),
            min_news_relevance: std::env::var("MIN_NEWS_RELEVANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_news_relevance),
            search_miss: match std::env::var("SEARCH_MISS_POLICY").as_deref() {
                Ok("empty") | Ok("Empty") => SearchMissPolicy::Empty,
                _ => SearchMissPolicy::FirstCanned,
            },
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}
