//! HTTP fetching with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`Fetch`]: core trait, one URL in, raw body bytes out
//! - [`HttpFetcher`]: a single GET attempt through `reqwest`
//! - [`RetryPolicy`]: pure schedule deciding whether and how long to wait
//! - [`RetryFetch`]: decorator adding the policy to any [`Fetch`] implementation
//!
//! # Retry Strategy
//!
//! - 3 attempts in total by default
//! - Backoff starts at 2 seconds and doubles per retry
//! - Any single delay is capped at 10 seconds

use crate::config::HttpConfig;
use crate::error::FetchError;
use reqwest::Client;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Trait for fetching the body behind a URL.
///
/// Implementors return the raw response bytes or a [`FetchError`]; they never
/// panic on network problems.
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Single-attempt GET requests with a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(network)?;
        debug!(%url, bytes = body.len(), "Received response body");
        Ok(body.to_vec())
    }
}

/// Exponential backoff schedule.
///
/// ```text
/// delay(attempt) = min(initial_backoff * 2^(attempt-1), max_backoff)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// How long to wait after failed attempt number `attempt` (1-based), or
    /// `None` when the call should give up.
    pub fn next_delay(&self, attempt: u32, error: &FetchError) -> Option<Duration> {
        if attempt >= self.max_attempts || !error.is_retryable() {
            return None;
        }
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.initial_backoff.saturating_mul(1u32 << exponent);
        Some(delay.min(self.max_backoff))
    }
}

/// Wrapper that retries any [`Fetch`] implementation according to a [`RetryPolicy`].
pub struct RetryFetch<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryFetch<T>
where
    T: Fetch,
{
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_attempts", &self.policy.max_attempts)
            .field("initial_backoff", &self.policy.initial_backoff)
            .field("max_backoff", &self.policy.max_backoff)
            .finish()
    }
}

impl<T> Fetch for RetryFetch<T>
where
    T: Fetch,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            info!(
                %url,
                attempt,
                max = self.policy.max_attempts,
                "Fetching"
            );

            let attempt_t0 = Instant::now();
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    let elapsed_ms_attempt = attempt_t0.elapsed().as_millis();
                    let elapsed_ms_total = total_t0.elapsed().as_millis();

                    let Some(delay) = self.policy.next_delay(attempt, &e) else {
                        error!(
                            %url,
                            attempt,
                            max = self.policy.max_attempts,
                            elapsed_ms_total,
                            error = %e,
                            "Fetch failed; giving up"
                        );
                        return Err(e);
                    };

                    warn!(
                        %url,
                        attempt,
                        max = self.policy.max_attempts,
                        elapsed_ms_attempt,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "Fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use mockito::Server;
    use reqwest::StatusCode;

    fn status_error(code: u16) -> FetchError {
        FetchError::Status {
            url: "https://example.com".to_string(),
            status: StatusCode::from_u16(code).unwrap(),
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(20),
        }
    }

    fn http_fetcher() -> HttpFetcher {
        HttpFetcher::new(&HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_default_schedule() {
        let policy = RetryConfig::default().policy();
        let err = status_error(500);

        assert_eq!(policy.next_delay(1, &err), Some(Duration::from_secs(2)));
        assert_eq!(policy.next_delay(2, &err), Some(Duration::from_secs(4)));
        assert_eq!(policy.next_delay(3, &err), None);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            ..RetryConfig::default().policy()
        };
        let err = status_error(503);

        assert_eq!(policy.next_delay(3, &err), Some(Duration::from_secs(8)));
        assert_eq!(policy.next_delay(4, &err), Some(Duration::from_secs(10)));
        assert_eq!(policy.next_delay(9, &err), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_huge_attempt_count_does_not_overflow() {
        let policy = RetryPolicy {
            max_attempts: u32::MAX,
            ..RetryConfig::default().policy()
        };
        assert_eq!(
            policy.next_delay(200, &status_error(500)),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_single_attempt_never_retries() {
        let policy = fast_policy(1);
        assert_eq!(policy.next_delay(1, &status_error(500)), None);
    }

    #[tokio::test]
    async fn test_builder_errors_are_not_retried() {
        let err = http_fetcher().fetch("not a url").await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(RetryConfig::default().policy().next_delay(1, &err), None);
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/sitemaps/all.xml")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body("<sitemapindex/>")
            .expect(1)
            .create_async()
            .await;

        let fetcher = RetryFetch::new(http_fetcher(), fast_policy(3));
        let body = fetcher
            .fetch(&format!("{}/sitemaps/all.xml", server.url()))
            .await
            .unwrap();
        assert_eq!(body, b"<sitemapindex/>");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_retries_until_exhausted() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/broken")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let fetcher = RetryFetch::new(http_fetcher(), fast_policy(3));
        let err = fetcher
            .fetch(&format!("{}/broken", server.url()))
            .await
            .unwrap_err();

        match err {
            FetchError::Status { status, .. } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("unexpected error: {other}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_a_status_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let err = http_fetcher()
            .fetch(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { .. }));
        assert!(err.is_retryable());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection open without ever replying.
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            sleep(Duration::from_secs(30)).await;
            drop(stream);
        });

        let fetcher = HttpFetcher::new(&HttpConfig {
            timeout_secs: 1,
            ..HttpConfig::default()
        })
        .unwrap();
        let started = Instant::now();
        let err = fetcher.fetch(&format!("http://{addr}/slow")).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(
            matches!(&err, FetchError::Network { source, .. } if source.is_timeout()),
            "unexpected error: {err:?}"
        );
        assert!(err.is_retryable());
        assert!(elapsed >= Duration::from_millis(900), "returned early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "timeout not applied: {elapsed:?}");

        server.abort();
    }
}
