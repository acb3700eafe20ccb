//! Twelve Data time-series provider.
//!
//! Fetches the most recent `outputsize` bars from the `/time_series`
//! endpoint. Handles API-level errors (reported in the JSON body with
//! `status: "error"`), retries with exponential backoff, and the circuit
//! breaker. Every attempt, retries included, takes a slot from the shared
//! [`RequestPacer`]; a rate-limit reply defers that pacer by `retry_after`.

use super::circuit_breaker::CircuitBreaker;
use super::pacer::RequestPacer;
use super::provider::{BarRequest, MarketDataProvider, ProviderError, RawBar};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";

/// `/time_series` response body. Success and error share one shape.
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    values: Option<Vec<RawBar>>,
}

/// Connection settings for [`TwelveDataProvider`].
#[derive(Debug, Clone)]
pub struct TwelveDataSettings {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl TwelveDataSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

pub struct TwelveDataProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    pacer: Arc<RequestPacer>,
    settings: TwelveDataSettings,
}

impl TwelveDataProvider {
    pub fn new(
        settings: TwelveDataSettings,
        circuit_breaker: Arc<CircuitBreaker>,
        pacer: Arc<RequestPacer>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("signallab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            pacer,
            settings,
        })
    }

    pub fn pacer(&self) -> &RequestPacer {
        &self.pacer
    }

    fn query(&self, request: &BarRequest) -> [(&'static str, String); 5] {
        [
            ("symbol", request.symbol.clone()),
            ("interval", request.interval.clone()),
            ("outputsize", request.count.to_string()),
            ("apikey", self.settings.api_key.clone()),
            ("format", "JSON".to_string()),
        ]
    }

    fn fetch_with_retry(&self, request: &BarRequest) -> Result<Vec<RawBar>, ProviderError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(ProviderError::CircuitOpen);
        }

        let url = format!(
            "{}/time_series",
            self.settings.base_url.trim_end_matches('/')
        );
        let query = self.query(request);
        let mut last_error = None;

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                let delay = retry_delay(self.settings.base_delay, attempt, last_error.as_ref());
                debug!(symbol = %request.symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(ProviderError::CircuitOpen);
            }
            self.pacer.acquire();

            let resp = match self.client.get(&url).query(&query).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!(symbol = %request.symbol, error = %e, "transport failure");
                    self.circuit_breaker.record_failure();
                    last_error = Some(ProviderError::Transport(e.to_string()));
                    continue;
                }
                Err(e) => return Err(ProviderError::Transport(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(ProviderError::CircuitOpen);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!(symbol = %request.symbol, retry_after, "rate limited");
                self.pacer.defer(Duration::from_secs(retry_after));
                last_error = Some(ProviderError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(ProviderError::Rejected {
                    code: status.as_u16(),
                    message: format!("HTTP {status} for {}", request.symbol),
                });
                continue;
            }

            let body = resp
                .text()
                .map_err(|e| ProviderError::Transport(e.to_string()))?;

            match parse_body(&request.symbol, &body) {
                Ok(bars) => {
                    self.circuit_breaker.record_success();
                    return Ok(bars);
                }
                // Twelve Data reports its per-minute credit limit in the body.
                Err(ProviderError::RateLimited { retry_after_secs }) => {
                    self.circuit_breaker.record_failure();
                    warn!(symbol = %request.symbol, retry_after = retry_after_secs, "rate limited (credit quota)");
                    self.pacer.defer(Duration::from_secs(retry_after_secs));
                    last_error = Some(ProviderError::RateLimited { retry_after_secs });
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Transport("max retries exceeded".into())))
    }
}

/// Wait before retry `attempt` (1-based): exponential backoff, and never
/// less than the provider's `retry_after` after a rate limit.
pub(crate) fn retry_delay(
    base: Duration,
    attempt: u32,
    last_error: Option<&ProviderError>,
) -> Duration {
    let backoff = base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
    match last_error {
        Some(ProviderError::RateLimited { retry_after_secs }) => {
            backoff.max(Duration::from_secs(*retry_after_secs))
        }
        _ => backoff,
    }
}

/// Parse a `/time_series` body into raw rows.
pub(crate) fn parse_body(symbol: &str, body: &str) -> Result<Vec<RawBar>, ProviderError> {
    let parsed: TimeSeriesResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::MalformedPayload(format!("failed to parse response for {symbol}: {e}"))
    })?;

    if parsed.status.as_deref() == Some("error") {
        let code = parsed.code.unwrap_or(400);
        let message = parsed.message.unwrap_or_default();
        return Err(match code {
            429 => ProviderError::RateLimited {
                retry_after_secs: 60,
            },
            404 => ProviderError::NotFound {
                symbol: symbol.to_string(),
            },
            _ => ProviderError::Rejected { code, message },
        });
    }

    match parsed.values {
        Some(values) if !values.is_empty() => Ok(values),
        _ => Err(ProviderError::EmptyPayload),
    }
}

impl MarketDataProvider for TwelveDataProvider {
    fn name(&self) -> &str {
        "twelve_data"
    }

    fn fetch(&self, request: &BarRequest) -> Result<Vec<RawBar>, ProviderError> {
        let bars = self.fetch_with_retry(request)?;
        debug!(symbol = %request.symbol, rows = bars.len(), "fetched from twelve data");
        Ok(bars)
    }
}
