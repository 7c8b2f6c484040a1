//! HTTP clients for the remote CRUD and Bedrock services
//!
//! Both services speak JSON over HTTPS with an optional bearer token. Each
//! request has a fixed timeout; transient failures (timeouts, refused
//! connections, and statuses on the retry allow-list) are retried with a
//! linearly growing delay before the last error is returned.

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::{Client, Response};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{FlockError, Result};
use crate::merge::RemoteFeedCalculation;
use crate::models::FlockParameters;

/// Retry behavior for remote calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 500,
            retryable_statuses: vec![429, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after failed attempt number `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(attempt as u64))
    }

    pub fn retries_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    fn can_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts.max(1)
    }
}

/// JSON client bound to one service's base URL
#[derive(Debug, Clone)]
pub struct HttpClient {
    service: &'static str,
    client: Client,
    base_url: Url,
    token: Option<String>,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(
        service: &'static str,
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|_| FlockError::InvalidUrl {
            service,
            url: base_url.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FlockError::InvalidUrl {
                service,
                url: base_url.to_string(),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FlockError::Http {
                service,
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            service,
            client,
            base_url,
            token: token.filter(|t| !t.trim().is_empty()),
            retry,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request, retrying transient failures; non-success statuses are errors
    pub fn execute(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let url = self.url(segments);
        info!("{} {} {}", self.service, method, url);

        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send() {
                Ok(response) => {
                    let status = response.status().as_u16();
                    debug!("{} responded {} on attempt {}", self.service, status, attempt);

                    if response.status().is_success() {
                        return Ok(response);
                    }
                    if self.retry.retries_status(status) && self.retry.can_retry(attempt) {
                        let delay = self.retry.delay_for_attempt(attempt);
                        warn!(
                            "{} returned {} - retry {}/{} after {}ms",
                            self.service,
                            status,
                            attempt,
                            self.retry.max_attempts - 1,
                            delay.as_millis()
                        );
                        thread::sleep(delay);
                        continue;
                    }

                    let body = response.text().unwrap_or_default();
                    return Err(FlockError::Status {
                        service: self.service,
                        status,
                        attempts: attempt,
                        body,
                    });
                }
                Err(err) => {
                    if (err.is_timeout() || err.is_connect()) && self.retry.can_retry(attempt) {
                        let delay = self.retry.delay_for_attempt(attempt);
                        warn!(
                            "{} request failed ({}) - retry {}/{} after {}ms",
                            self.service,
                            err,
                            attempt,
                            self.retry.max_attempts - 1,
                            delay.as_millis()
                        );
                        thread::sleep(delay);
                        continue;
                    }
                    return Err(FlockError::Http {
                        service: self.service,
                        url: url.to_string(),
                        source: err,
                    });
                }
            }
        }
    }

    /// Send a request and decode the JSON response
    pub fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let url = self.url(segments);
        self.execute(method, segments, body)?
            .json()
            .map_err(|source| FlockError::Http {
                service: self.service,
                url: url.to_string(),
                source,
            })
    }
}

/// Flock description in the shape the Bedrock endpoints expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedrockRequest {
    pub breed: String,
    pub age: u32,
    pub weight: f64,
    pub count: u32,
    pub environment: String,
    pub purpose: String,
    pub season: String,
}

impl From<&FlockParameters> for BedrockRequest {
    fn from(params: &FlockParameters) -> Self {
        Self {
            breed: params.breed.to_string(),
            age: params.age_weeks,
            weight: params.weight_kg,
            count: params.quantity,
            environment: params.environment.to_string(),
            purpose: params.purpose.to_string(),
            season: params.season.to_string(),
        }
    }
}

/// Client for the AI generation service
#[derive(Debug, Clone)]
pub struct BedrockClient {
    http: HttpClient,
}

impl BedrockClient {
    pub const SERVICE: &'static str = "bedrock";

    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn post<T: DeserializeOwned>(&self, endpoint: &str, params: &FlockParameters) -> Result<T> {
        let body = serde_json::to_value(BedrockRequest::from(params))?;
        self.http.fetch(Method::POST, &[endpoint], Some(&body))
    }

    /// Remote feed figures; zero or missing values are left to the local engine
    pub fn calculate_feed(&self, params: &FlockParameters) -> Result<RemoteFeedCalculation> {
        self.post("calculate-feed", params)
    }

    /// Free-form nutritional recommendation
    pub fn recommend_feed(&self, params: &FlockParameters) -> Result<serde_json::Value> {
        self.post("recommend-feed", params)
    }

    /// Free-form weekly recipe plan
    pub fn weekly_recipes(&self, params: &FlockParameters) -> Result<serde_json::Value> {
        self.post("weekly-recipes", params)
    }
}
