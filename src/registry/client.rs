//! HTTP client for Maven repositories
//!
//! GETs are retried with exponential backoff (3 retries from 100 ms). A 429
//! honours `Retry-After` when the server sends one. 404 and 410 are final
//! and map to `RegistryError::NotFound` so a source chain can move on.

use crate::error::RegistryError;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, trace};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("buildplan/", env!("CARGO_PKG_VERSION"));

const MAX_RETRIES: u32 = 3;

const BASE_DELAY: Duration = Duration::from_millis(100);

/// Longest `Retry-After` we are willing to sleep for
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// What to do with a response status
#[derive(Debug, PartialEq, Eq)]
enum StatusClass {
    Ok,
    Missing,
    RateLimited,
    /// 5xx, worth another attempt
    Transient,
    Fatal,
}

impl StatusClass {
    fn of(status: StatusCode) -> Self {
        if status.is_success() {
            StatusClass::Ok
        } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            StatusClass::Missing
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            StatusClass::RateLimited
        } else if status.is_server_error() {
            StatusClass::Transient
        } else {
            StatusClass::Fatal
        }
    }
}

/// Shared client, cheap to clone
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpClient {
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                RegistryError::network_error("", "HTTP client", format!("failed to build client: {}", e))
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
            base_delay: BASE_DELAY,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `attempt + 1`
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// GET `url`, retrying transient failures
    ///
    /// `resource` and `repository` only label errors.
    pub async fn get(
        &self,
        url: &str,
        resource: &str,
        repository: &str,
    ) -> Result<Response, RegistryError> {
        let mut attempt = 0;

        loop {
            trace!(url, attempt, "GET");
            let (error, delay) = match self.client.get(url).send().await {
                Ok(response) => match StatusClass::of(response.status()) {
                    StatusClass::Ok => return Ok(response),
                    StatusClass::Missing => {
                        return Err(RegistryError::not_found(resource, repository))
                    }
                    StatusClass::RateLimited => {
                        let delay = retry_after(&response).unwrap_or_else(|| self.backoff(attempt));
                        (RegistryError::rate_limit_exceeded(repository), delay)
                    }
                    StatusClass::Transient => (
                        RegistryError::network_error(
                            resource,
                            repository,
                            format!("HTTP {}", response.status()),
                        ),
                        self.backoff(attempt),
                    ),
                    StatusClass::Fatal => {
                        return Err(RegistryError::network_error(
                            resource,
                            repository,
                            format!("HTTP {}", response.status()),
                        ))
                    }
                },
                Err(e) if e.is_timeout() => {
                    (RegistryError::timeout(resource, repository), self.backoff(attempt))
                }
                Err(e) => (
                    RegistryError::network_error(resource, repository, e.to_string()),
                    self.backoff(attempt),
                ),
            };

            if attempt >= self.max_retries {
                return Err(error);
            }
            debug!(url, delay_ms = delay.as_millis() as u64, %error, "retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// GET `url` as text; a body that fails to arrive is retried as a whole
    pub async fn get_text(
        &self,
        url: &str,
        resource: &str,
        repository: &str,
    ) -> Result<String, RegistryError> {
        let mut attempt = 0;

        loop {
            let response = self.get(url, resource, repository).await?;
            match response.text().await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.max_retries => {
                    debug!(url, error = %e, "body read failed, retrying");
                    tokio::time::sleep(self.backoff(attempt)).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(RegistryError::invalid_response(
                        resource,
                        repository,
                        format!("failed to read response body: {}", e),
                    ))
                }
            }
        }
    }
}

/// `Retry-After` in seconds, capped
fn retry_after(response: &Response) -> Option<Duration> {
    let seconds: u64 = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}
