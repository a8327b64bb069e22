//! HTTP client for the Scryfall card API.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::debug;

use crate::config::ApiConfig;
use crate::scryfall::limiter::RateLimiter;
use crate::scryfall::types::{ApiFailure, Card, SearchResponse};

/// A rate-limited client for the Scryfall REST API.
///
/// Every outbound request passes through the owned [`RateLimiter`], sends
/// an identifying `User-Agent`, and accepts only JSON. Failures of any
/// kind come back as [`ApiFailure`]; nothing is retried.
pub struct ScryfallClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    limiter: RateLimiter,
}

impl ScryfallClient {
    /// Creates a client from API configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built or
    /// the configured user agent is not a valid header value.
    pub fn new(cfg: &ApiConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // Reject control characters etc. up front rather than on first use
        HeaderValue::from_str(&cfg.user_agent)?;

        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            user_agent: cfg.user_agent.clone(),
            limiter: RateLimiter::new(cfg.min_delay()),
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Searches for cards using Scryfall full-text query syntax.
    ///
    /// Only the first page is fetched; `has_more` on the response tells
    /// the caller whether upstream had further pages.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiFailure`] carrying the HTTP status and raw body on
    /// a non-2xx response, or `status: 0` on a transport failure.
    pub async fn search(&self, query: &str) -> Result<SearchResponse, ApiFailure> {
        self.limiter.acquire().await;

        let url = format!("{}/cards/search", self.base_url);
        debug!(query, "searching Scryfall");

        let response = self
            .http
            .get(&url)
            .query(&[("q", query)])
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| ApiFailure::transport(&e))?;

        Self::decode(response).await
    }

    /// Fetches a single card by its Scryfall UUID.
    ///
    /// # Errors
    ///
    /// Same failure shape as [`Self::search`].
    pub async fn fetch_by_id(&self, id: &str) -> Result<Card, ApiFailure> {
        self.limiter.acquire().await;

        let url = format!("{}/cards/{}", self.base_url, urlencoding::encode(id));
        debug!(id, "fetching card");

        let response = self
            .http
            .get(&url)
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| ApiFailure::transport(&e))?;

        Self::decode(response).await
    }

    /// Decodes a response body, mapping non-2xx statuses to [`ApiFailure`].
    ///
    /// Error bodies are kept as raw text: Scryfall error payloads need not
    /// match the success schema.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiFailure> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ApiFailure::transport(&e))?;
            return Err(ApiFailure {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| ApiFailure::transport(&e))
    }
}
