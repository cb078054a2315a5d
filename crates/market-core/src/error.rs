use thiserror::Error;

/// Failure taxonomy shared by every provider adapter. Each adapter owns the
/// mapping from its provider's native failure signals (textual note fields,
/// HTTP statuses, error payload shapes) into these variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    TransportError(String),
}

/// One failed provider invocation, recorded by the aggregator for
/// diagnostics.
#[derive(Debug, Clone)]
pub struct ProviderAttempt {
    pub provider: &'static str,
    pub error: ProviderError,
}

/// The only failure that crosses the core boundary. Raised when every
/// provider in an operation's chain failed and synthetic fallback is
/// disabled for that operation.
#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("all providers exhausted for {operation}: {}", render_attempts(.attempts))]
    AllProvidersExhausted {
        operation: &'static str,
        attempts: Vec<ProviderAttempt>,
    },
}

impl AggregatorError {
    /// True when any attempted provider reported a rate limit. UI callers
    /// special-case this to show a "try later" affordance.
    pub fn rate_limited(&self) -> bool {
        match self {
            AggregatorError::AllProvidersExhausted { attempts, .. } => attempts
                .iter()
                .any(|a| matches!(a.error, ProviderError::RateLimited(_))),
        }
    }
}

fn render_attempts(attempts: &[ProviderAttempt]) -> String {
    if attempts.is_empty() {
        return "no providers configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.provider, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}
