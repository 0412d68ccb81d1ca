use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::dns::Resolve;
use reqwest::{Client, ClientBuilder};
use thiserror::Error;
use tokio::time::{Instant, timeout_at};
use trust_dns_resolver::error::ResolveError;

use crate::error::Result;

/// Low-level failure of a single request, classified from structured error values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect timed out")]
    ConnectTimeout,
    #[error("read timed out")]
    ReadTimeout,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("connection reset")]
    ConnectionReset,
    #[error("name resolution failed: {0}")]
    NameResolution(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Classify a reqwest error by walking its source chain for typed causes.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return if err.is_connect() {
                TransportError::ConnectTimeout
            } else {
                TransportError::ReadTimeout
            };
        }

        let mut source: Option<&(dyn StdError + 'static)> = err.source();
        while let Some(cause) = source {
            if let Some(resolve) = cause.downcast_ref::<ResolveError>() {
                return TransportError::NameResolution(resolve.to_string());
            }
            if let Some(io_err) = cause.downcast_ref::<io::Error>() {
                return Self::from_io(io_err);
            }
            source = cause.source();
        }

        if err.is_connect() {
            TransportError::Network(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }

    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => TransportError::ReadTimeout,
            io::ErrorKind::ConnectionRefused => TransportError::ConnectionRefused,
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                TransportError::ConnectionReset
            }
            _ => TransportError::Network(err.to_string()),
        }
    }
}

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<u16, TransportError>> + Send + 'a>>;

/// Performs one GET and reports the status code, or why there is none.
pub trait Transport: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> TransportFuture<'a>;
}

/// Settings for the production transport.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

/// How much of a response body is read. The rest is never fetched.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// [`Transport`] over a shared `reqwest::Client`.
///
/// The timeout bounds the TCP handshake on its own, so a silent drop shows up as a
/// connect timeout. Everything after that, up to the last body byte read, must finish
/// within one more timeout, and each wait for body data is bounded by the timeout too.
/// Proxies are never used: the probe has to meet the filter directly.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Transport resolving names through the operating system.
    pub fn new(settings: &ProbeSettings) -> Result<Self> {
        Ok(Self {
            client: Self::builder(settings).build()?,
            timeout: settings.timeout,
        })
    }

    /// Transport resolving names through `resolver`.
    pub fn with_resolver<R: Resolve + 'static>(settings: &ProbeSettings, resolver: R) -> Result<Self> {
        Ok(Self {
            client: Self::builder(settings).dns_resolver(Arc::new(resolver)).build()?,
            timeout: settings.timeout,
        })
    }

    fn builder(settings: &ProbeSettings) -> ClientBuilder {
        // No read or total timeout on the client: either would race the connect timer.
        Client::builder()
            .connect_timeout(settings.timeout)
            .danger_accept_invalid_certs(true)
            .no_proxy()
            .user_agent(settings.user_agent.as_str())
    }

    async fn fetch(&self, url: &str) -> std::result::Result<u16, TransportError> {
        // The connect timer always fires before this deadline.
        let deadline = Instant::now() + self.timeout * 2;

        let mut response = match timeout_at(deadline, self.client.get(url).send()).await {
            Ok(sent) => sent.map_err(|e| failed(url, &e))?,
            Err(_) => return Err(TransportError::ReadTimeout),
        };
        let status = response.status().as_u16();

        // The body is read and dropped: a stalled or dripping transfer is a read timeout too.
        let mut read = 0;
        while read < MAX_BODY_BYTES {
            let wait_until = deadline.min(Instant::now() + self.timeout);
            match timeout_at(wait_until, response.chunk()).await {
                Ok(Ok(Some(chunk))) => read += chunk.len(),
                Ok(Ok(None)) => break,
                Ok(Err(e)) => return Err(failed(url, &e)),
                Err(_) => return Err(TransportError::ReadTimeout),
            }
        }
        Ok(status)
    }
}

fn failed(url: &str, err: &reqwest::Error) -> TransportError {
    log::debug!("Request to {url} failed: {}", super::error_chain(err));
    TransportError::classify(err)
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, url: &'a str) -> TransportFuture<'a> {
        Box::pin(self.fetch(url))
    }
}
