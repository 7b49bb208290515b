//! HTTP client abstraction for testability

use super::types::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default User-Agent string for HTTP requests.
/// Some image servers reject requests without one.
const DEFAULT_USER_AGENT: &str = concat!("tilestitch/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound on the buffer reserved up front from a Content-Length header.
const MAX_BODY_PREALLOC: usize = 16 * 1024 * 1024;

/// Status and fully buffered body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body. Empty for non-success responses.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a successful (200) response with the given body.
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    /// Creates a bodyless response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for asynchronous HTTP client operations.
///
/// Only transport faults are returned as `Err`. A response with a non-success
/// status is still `Ok`, so callers can treat throttling as data.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response status and, on success, the full body.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, ProviderError>> + Send;
}

/// Creates one HTTP client per fetch worker.
///
/// Each worker keeps the client it was given for its whole lifetime and drops
/// it (closing the connection) when it exits.
pub trait HttpClientFactory: Send + Sync {
    /// Client type produced by this factory.
    type Client: AsyncHttpClient + 'static;

    /// Creates the client for the given worker.
    fn create(&self, worker_id: usize) -> Result<Self::Client, ProviderError>;
}

/// Async HTTP client implementation using reqwest.
///
/// The connection pool keeps at most one idle connection per host, so a
/// client owned by a single worker reuses one connection across tiles.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new AsyncReqwestClient with default configuration.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new AsyncReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(1)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, ProviderError> {
        trace!(url = url, "HTTP GET request starting");

        let mut response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(map_reqwest_error(e));
            }
        };

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Ok(HttpResponse::status(status));
        }

        // Stream the body and buffer it
        let mut body = Vec::with_capacity(initial_body_capacity(response.content_length()));
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    warn!(url = url, error = %e, "Failed to read response body");
                    return Err(map_reqwest_error(e));
                }
            }
        }

        trace!(url = url, bytes = body.len(), "HTTP response body read");
        Ok(HttpResponse { status, body })
    }
}

/// Buffer size to reserve for a body of the advertised length.
///
/// The header is server-controlled, so the reservation is capped and the
/// buffer grows past it only as bytes actually arrive.
fn initial_body_capacity(content_length: Option<u64>) -> usize {
    content_length
        .map(|len| usize::try_from(len).unwrap_or(usize::MAX))
        .unwrap_or(0)
        .min(MAX_BODY_PREALLOC)
}

fn map_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::HttpError(e.to_string())
    }
}

/// Factory building an independent [`AsyncReqwestClient`] for every worker.
#[derive(Debug, Clone)]
pub struct ReqwestClientFactory {
    timeout_secs: u64,
}

impl ReqwestClientFactory {
    /// Creates a factory whose clients use the given timeout.
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    /// Timeout applied to every client, in seconds.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

impl Default for ReqwestClientFactory {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}

impl HttpClientFactory for ReqwestClientFactory {
    type Client = AsyncReqwestClient;

    fn create(&self, worker_id: usize) -> Result<Self::Client, ProviderError> {
        debug!(worker = worker_id, "Creating HTTP client");
        AsyncReqwestClient::with_timeout(self.timeout_secs)
    }
}
